use crate::candle::CandleSeries;
use crate::signal::Signal;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Supplies the most recent candles for one symbol/interval, ascending.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch_candles(&self) -> Result<CandleSeries>;
    fn symbol(&self) -> &str;
}

/// Append-only signal history.
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// At-least-once append. Duplicates are filtered upstream by the dedup gate.
    async fn append(&self, signal: &Signal) -> Result<()>;
    /// The `n` most recent signals, oldest first.
    async fn latest(&self, n: usize) -> Result<Vec<Signal>>;
}

/// Turns a candle series into at most one signal for its last candle.
///
/// Implementations are pure: the same series always yields the same answer,
/// and "not enough data" is `None`, never an error.
pub trait SignalEvaluator: Send + Sync {
    fn evaluate(&self, series: &CandleSeries) -> Option<Signal>;
    /// Minimum series length below which `evaluate` always returns `None`.
    fn required_lookback(&self) -> usize;
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: CandleSource + ?Sized> CandleSource for Arc<T> {
    async fn fetch_candles(&self) -> Result<CandleSeries> {
        (**self).fetch_candles().await
    }

    fn symbol(&self) -> &str {
        (**self).symbol()
    }
}

#[async_trait]
impl<T: SignalStore + ?Sized> SignalStore for Arc<T> {
    async fn append(&self, signal: &Signal) -> Result<()> {
        (**self).append(signal).await
    }

    async fn latest(&self, n: usize) -> Result<Vec<Signal>> {
        (**self).latest(n).await
    }
}

impl<T: SignalEvaluator + ?Sized> SignalEvaluator for Box<T> {
    fn evaluate(&self, series: &CandleSeries) -> Option<Signal> {
        (**self).evaluate(series)
    }

    fn required_lookback(&self) -> usize {
        (**self).required_lookback()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
