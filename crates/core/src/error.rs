//! Error taxonomy for the signal engine.
//!
//! Insufficient data and indicator divergence are not errors: the evaluator
//! answers `None` for both. Only collaborator failures and malformed input
//! surface here.

use thiserror::Error;

/// Reasons a candle vector cannot become a [`crate::CandleSeries`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SeriesError {
    /// Timestamps must be strictly increasing.
    #[error("candle {index}: time {current} does not follow {previous}")]
    NonIncreasingTime {
        /// Index of the offending candle.
        index: usize,
        /// Time of the preceding candle.
        previous: i64,
        /// Time of the offending candle.
        current: i64,
    },

    /// OHLC envelope violated or non-finite field.
    #[error("candle {index}: {reason}")]
    InvalidCandle {
        /// Index of the offending candle.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Failures reported upward by a pipeline tick.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The candle source was unreachable or returned something unusable.
    #[error("fetch failed for {symbol}: {source}")]
    Fetch {
        /// Symbol the tick was evaluating.
        symbol: String,
        /// Underlying collaborator error.
        #[source]
        source: anyhow::Error,
    },

    /// The persistence collaborator rejected an append.
    #[error("persist failed for {symbol}: {source}")]
    Persist {
        /// Symbol the signal belongs to.
        symbol: String,
        /// Underlying collaborator error.
        #[source]
        source: anyhow::Error,
    },

    /// The fetched candles did not form a valid series.
    #[error("invalid candle series: {0}")]
    InvalidSeries(#[from] SeriesError),
}

impl EngineError {
    /// Creates a fetch error.
    pub fn fetch(symbol: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Fetch {
            symbol: symbol.into(),
            source: source.into(),
        }
    }

    /// Creates a persist error.
    pub fn persist(symbol: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Persist {
            symbol: symbol.into(),
            source: source.into(),
        }
    }

    /// Name of the pipeline stage that failed, for structured logs.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::InvalidSeries(_) => "fetch",
            Self::Persist { .. } => "persist",
        }
    }
}
