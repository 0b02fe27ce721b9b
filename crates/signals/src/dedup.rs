//! Suppresses re-emission of a signal for a candle that already produced one.
//!
//! The key is the producing candle's time alone: a second BUY on a later
//! candle is admitted, a second evaluation of the same candle is not.

use signal_engine_core::{EngineState, Signal};

/// Result of checking a candidate against the engine state.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Admit(Signal),
    /// The last emitted signal came from the same candle.
    Duplicate(Signal),
}

pub struct DedupGate;

impl DedupGate {
    /// Checks without mutating. Pair with [`DedupGate::commit`] once the
    /// signal has been persisted.
    #[must_use]
    pub fn check(candidate: Signal, state: &EngineState) -> Admission {
        match state.last_emitted() {
            Some(last) if last.is_same_candle(&candidate) => Admission::Duplicate(candidate),
            _ => Admission::Admit(candidate),
        }
    }

    pub fn commit(signal: &Signal, state: &mut EngineState) {
        state.record(signal.clone());
    }

    /// Check and commit in one step: returns the candidate if admitted.
    pub fn admit(candidate: Signal, state: &mut EngineState) -> Option<Signal> {
        match Self::check(candidate, state) {
            Admission::Admit(signal) => {
                Self::commit(&signal, state);
                Some(signal)
            }
            Admission::Duplicate(_) => None,
        }
    }
}
