//! One evaluation pass: fetch, evaluate the last candle, dedup, persist.
//!
//! `tick` may be called from several tasks at once. Each call takes a ticket
//! before fetching; the state lock is held from the superseded check through
//! the store append, so two ticks can never both admit the same candle, and a
//! tick that finishes after a newer one is dropped without touching state.

use crate::dedup::{Admission, DedupGate};
use signal_engine_core::{
    CandleSource, EngineError, EngineState, SeriesError, Signal, SignalEvaluator, SignalStore,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Why a completed tick produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSignalReason {
    /// Fewer candles than the evaluator's lookback.
    InsufficientData { have: usize, need: usize },
    /// Enough data, but no rule fired on the last candle.
    NoTrigger,
}

impl fmt::Display for NoSignalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientData { have, need } => {
                write!(f, "insufficient data ({have}/{need} candles)")
            }
            Self::NoTrigger => write!(f, "no trigger"),
        }
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// A new signal was persisted and recorded.
    Emitted(Signal),
    NoSignal(NoSignalReason),
    /// The candidate's candle already produced the last emitted signal.
    Duplicate(Signal),
    /// A newer tick finished first; this one was abandoned.
    Superseded { ticket: u64 },
}

impl TickOutcome {
    /// The newly emitted signal, if any.
    #[must_use]
    pub const fn emitted(&self) -> Option<&Signal> {
        match self {
            Self::Emitted(signal) => Some(signal),
            _ => None,
        }
    }
}

pub struct SignalPipeline<S, P> {
    source: S,
    store: P,
    evaluator: Box<dyn SignalEvaluator>,
    state: Mutex<EngineState>,
    next_ticket: AtomicU64,
}

impl<S, P> SignalPipeline<S, P>
where
    S: CandleSource,
    P: SignalStore,
{
    #[must_use]
    pub fn new(source: S, store: P, evaluator: Box<dyn SignalEvaluator>) -> Self {
        Self::with_state(source, store, evaluator, EngineState::new())
    }

    #[must_use]
    pub fn with_state(
        source: S,
        store: P,
        evaluator: Box<dyn SignalEvaluator>,
        state: EngineState,
    ) -> Self {
        Self {
            source,
            store,
            evaluator,
            state: Mutex::new(state),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn symbol(&self) -> &str {
        self.source.symbol()
    }

    pub fn evaluator(&self) -> &dyn SignalEvaluator {
        self.evaluator.as_ref()
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    pub const fn store(&self) -> &P {
        &self.store
    }

    /// Snapshot of the current engine state.
    pub async fn state(&self) -> EngineState {
        self.state.lock().await.clone()
    }

    /// Seeds the dedup state from the store's most recent signal.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Persist`] if the store cannot be read.
    pub async fn rehydrate(&self) -> Result<Option<Signal>, EngineError> {
        let last = self
            .store
            .latest(1)
            .await
            .map_err(|e| EngineError::persist(self.symbol(), e))?
            .pop();

        let mut state = self.state.lock().await;
        // tickets never move backwards, even across a rehydrate
        let committed = state.committed_ticket();
        *state = EngineState::rehydrated(last.clone());
        state.commit_ticket(committed);

        match &last {
            Some(signal) => info!(symbol = %self.symbol(), %signal, "rehydrated last signal"),
            None => debug!(symbol = %self.symbol(), "no persisted signal to rehydrate"),
        }
        Ok(last)
    }

    /// Runs one fetch → evaluate → dedup → persist pass.
    ///
    /// # Errors
    ///
    /// Fetch and persist failures are returned with the symbol attached and
    /// leave the engine state untouched; the next tick retries.
    pub async fn tick(&self) -> Result<TickOutcome, EngineError> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let symbol = self.symbol();

        let series = self.source.fetch_candles().await.map_err(|e| {
            let err = match e.downcast::<SeriesError>() {
                Ok(series_err) => EngineError::InvalidSeries(series_err),
                Err(e) => EngineError::fetch(symbol, e),
            };
            warn!(symbol = %symbol, ticket, stage = err.stage(), error = %err, "tick failed");
            err
        })?;

        let need = self.evaluator.required_lookback();
        let candidate = if series.len() < need {
            Err(NoSignalReason::InsufficientData {
                have: series.len(),
                need,
            })
        } else {
            self.evaluator
                .evaluate(&series)
                .ok_or(NoSignalReason::NoTrigger)
        };

        let mut state = self.state.lock().await;
        if state.is_superseded(ticket) {
            warn!(
                symbol = %symbol,
                ticket,
                committed = state.committed_ticket(),
                "tick superseded by a newer one, discarding"
            );
            return Ok(TickOutcome::Superseded { ticket });
        }

        let candidate = match candidate {
            Ok(candidate) => candidate,
            Err(reason) => {
                state.commit_ticket(ticket);
                debug!(symbol = %symbol, ticket, %reason, "no signal");
                return Ok(TickOutcome::NoSignal(reason));
            }
        };

        let signal = match DedupGate::check(candidate, &state) {
            Admission::Admit(signal) => signal,
            Admission::Duplicate(signal) => {
                state.commit_ticket(ticket);
                debug!(symbol = %symbol, time = signal.time, "duplicate signal suppressed");
                return Ok(TickOutcome::Duplicate(signal));
            }
        };

        if let Err(e) = self.store.append(&signal).await {
            let err = EngineError::persist(symbol, e);
            warn!(symbol = %symbol, ticket, stage = err.stage(), error = %err, "tick failed");
            return Err(err);
        }

        DedupGate::commit(&signal, &mut state);
        state.commit_ticket(ticket);
        drop(state);

        info!(
            symbol = %symbol,
            signal_type = %signal.signal_type,
            level = %signal.level,
            price = signal.price,
            time = signal.time,
            "signal emitted"
        );
        Ok(TickOutcome::Emitted(signal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use signal_engine_core::{Candle, CandleSeries, SignalLevel, SignalType};
    use signal_engine_data::InMemorySignalStore;
    use std::sync::Arc;

    struct FixedSource {
        series: CandleSeries,
    }

    impl FixedSource {
        fn with_len(n: usize) -> Self {
            let candles = (0..n)
                .map(|i| Candle::new(i as i64 * 60_000, 1.0, 1.0, 1.0, 1.0, 1.0))
                .collect();
            Self {
                series: CandleSeries::new(candles).unwrap(),
            }
        }
    }

    #[async_trait]
    impl CandleSource for FixedSource {
        async fn fetch_candles(&self) -> Result<CandleSeries> {
            Ok(self.series.clone())
        }

        fn symbol(&self) -> &str {
            "TESTUSDT"
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CandleSource for FailingSource {
        async fn fetch_candles(&self) -> Result<CandleSeries> {
            Err(anyhow!("connection reset"))
        }

        fn symbol(&self) -> &str {
            "TESTUSDT"
        }
    }

    /// Signals BUY on the last candle of every series it sees.
    struct AlwaysBuy;

    impl SignalEvaluator for AlwaysBuy {
        fn evaluate(&self, series: &CandleSeries) -> Option<Signal> {
            let last = series.last()?;
            Some(Signal::new(SignalType::Buy, SignalLevel::Medium, last.close, last.time))
        }

        fn required_lookback(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "always-buy"
        }
    }

    struct Never;

    impl SignalEvaluator for Never {
        fn evaluate(&self, _series: &CandleSeries) -> Option<Signal> {
            None
        }

        fn required_lookback(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "never"
        }
    }

    // ============================================
    // Tick Outcome Tests
    // ============================================

    #[tokio::test]
    async fn emits_then_suppresses_same_candle() {
        let store = Arc::new(InMemorySignalStore::new());
        let pipeline = SignalPipeline::new(FixedSource::with_len(5), store.clone(), Box::new(AlwaysBuy));

        let first = pipeline.tick().await.unwrap();
        assert_eq!(first.emitted().map(|s| s.time), Some(4 * 60_000));

        let second = pipeline.tick().await.unwrap();
        assert!(matches!(second, TickOutcome::Duplicate(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn short_series_is_insufficient_data() {
        let pipeline = SignalPipeline::new(
            FixedSource::with_len(2),
            InMemorySignalStore::new(),
            Box::new(AlwaysBuy),
        );
        assert_eq!(
            pipeline.tick().await.unwrap(),
            TickOutcome::NoSignal(NoSignalReason::InsufficientData { have: 2, need: 3 })
        );
    }

    #[tokio::test]
    async fn no_trigger_is_reported() {
        let pipeline =
            SignalPipeline::new(FixedSource::with_len(10), InMemorySignalStore::new(), Box::new(Never));
        assert_eq!(
            pipeline.tick().await.unwrap(),
            TickOutcome::NoSignal(NoSignalReason::NoTrigger)
        );
        assert_eq!(pipeline.state().await.last_emitted(), None);
    }

    #[tokio::test]
    async fn fetch_failure_is_error_without_state_change() {
        let pipeline = SignalPipeline::new(FailingSource, InMemorySignalStore::new(), Box::new(AlwaysBuy));
        let err = pipeline.tick().await.unwrap_err();
        assert_eq!(err.stage(), "fetch");
        assert!(err.to_string().contains("TESTUSDT"));
        assert_eq!(pipeline.state().await, EngineState::new());
    }

    #[tokio::test]
    async fn rehydrate_blocks_already_persisted_candle() {
        let store = InMemorySignalStore::new();
        store
            .append(&Signal::new(SignalType::Buy, SignalLevel::High, 1.0, 4 * 60_000))
            .await
            .unwrap();

        let pipeline = SignalPipeline::new(FixedSource::with_len(5), store, Box::new(AlwaysBuy));
        let last = pipeline.rehydrate().await.unwrap();
        assert_eq!(last.map(|s| s.time), Some(4 * 60_000));
        assert!(matches!(pipeline.tick().await.unwrap(), TickOutcome::Duplicate(_)));
    }

    #[tokio::test]
    async fn rehydrate_keeps_committed_ticket() {
        let store = Arc::new(InMemorySignalStore::new());
        let pipeline = SignalPipeline::new(FixedSource::with_len(5), store.clone(), Box::new(AlwaysBuy));
        pipeline.tick().await.unwrap();
        pipeline.tick().await.unwrap();
        assert_eq!(pipeline.state().await.committed_ticket(), 2);

        let last = pipeline.rehydrate().await.unwrap();
        let state = pipeline.state().await;
        assert_eq!(state.committed_ticket(), 2);
        assert!(state.is_superseded(1));
        assert_eq!(state.last_emitted(), last.as_ref());
        assert_eq!(last.map(|s| s.time), Some(4 * 60_000));
    }

    #[tokio::test]
    async fn rehydrate_from_empty_store() {
        let pipeline =
            SignalPipeline::new(FixedSource::with_len(5), InMemorySignalStore::new(), Box::new(Never));
        assert_eq!(pipeline.rehydrate().await.unwrap(), None);
        assert_eq!(pipeline.evaluator().name(), "never");
        assert_eq!(pipeline.symbol(), "TESTUSDT");
    }
}
