use crate::signal::Signal;

/// State carried across pipeline ticks for one symbol/session.
///
/// Only the dedup gate writes to it, and only after the persistence
/// collaborator has accepted the signal. Callers sharing one instance across
/// tasks must hold it behind a lock for the whole admit-and-persist step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    last_emitted: Option<Signal>,
    committed_ticket: u64,
}

impl EngineState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the state from the most recent persisted signal.
    #[must_use]
    pub const fn rehydrated(last_emitted: Option<Signal>) -> Self {
        Self {
            last_emitted,
            committed_ticket: 0,
        }
    }

    #[must_use]
    pub const fn last_emitted(&self) -> Option<&Signal> {
        self.last_emitted.as_ref()
    }

    /// Records an emitted signal.
    pub fn record(&mut self, signal: Signal) {
        self.last_emitted = Some(signal);
    }

    /// Ticket of the newest tick that finished against this state.
    #[must_use]
    pub const fn committed_ticket(&self) -> u64 {
        self.committed_ticket
    }

    /// Marks `ticket` as finished. Tickets never move backwards.
    pub fn commit_ticket(&mut self, ticket: u64) {
        self.committed_ticket = self.committed_ticket.max(ticket);
    }

    /// True when a newer tick has already finished.
    #[must_use]
    pub const fn is_superseded(&self, ticket: u64) -> bool {
        ticket < self.committed_ticket
    }

    /// Clears everything, as on process restart without rehydration.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{SignalLevel, SignalType};

    #[test]
    fn new_state_is_empty() {
        let state = EngineState::new();
        assert!(state.last_emitted().is_none());
        assert_eq!(state.committed_ticket(), 0);
    }

    #[test]
    fn record_replaces_last_emitted() {
        let mut state = EngineState::new();
        state.record(Signal::new(SignalType::Buy, SignalLevel::Low, 1.0, 1));
        state.record(Signal::new(SignalType::Sell, SignalLevel::High, 2.0, 2));
        assert_eq!(state.last_emitted().map(|s| s.time), Some(2));
    }

    #[test]
    fn tickets_are_monotonic() {
        let mut state = EngineState::new();
        state.commit_ticket(5);
        state.commit_ticket(3);
        assert_eq!(state.committed_ticket(), 5);
        assert!(state.is_superseded(4));
        assert!(!state.is_superseded(5));
        assert!(!state.is_superseded(6));
    }

    #[test]
    fn rehydrated_and_reset() {
        let signal = Signal::new(SignalType::Buy, SignalLevel::Medium, 1.0, 10);
        let mut state = EngineState::rehydrated(Some(signal.clone()));
        assert_eq!(state.last_emitted(), Some(&signal));
        state.reset();
        assert!(state.last_emitted().is_none());
    }
}
