//! Fixed-interval OHLCV candles and the validated series the engine consumes.
//!
//! A [`CandleSeries`] is built fresh on every fetch, checked once for ordering
//! and OHLC consistency, and then only read. Indicator arrays computed from it
//! are aligned 1:1 with its indices.

use crate::error::SeriesError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV sample for a fixed interval. `time` is the candle open in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    #[must_use]
    pub const fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// High minus low.
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// `(high + low + close) / 3`, the WaveTrend source price.
    #[must_use]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Candle open time as a UTC timestamp, if representable.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time).single()
    }

    /// Checks the OHLC envelope and that every field is finite.
    ///
    /// # Errors
    /// Returns a human readable reason when the candle is malformed.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err("non-finite price or volume".to_string());
        }
        if self.volume < 0.0 {
            return Err(format!("negative volume {}", self.volume));
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(format!(
                "high {} below open/close/low envelope",
                self.high
            ));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(format!("low {} above open/close/high envelope", self.low));
        }
        Ok(())
    }
}

/// Chronological, duplicate-free sequence of candles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validates an already ordered candle vector.
    ///
    /// # Errors
    /// Returns [`SeriesError`] if any candle is malformed or if `time` is not
    /// strictly increasing.
    pub fn new(candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (index, candle) in candles.iter().enumerate() {
            candle
                .validate()
                .map_err(|reason| SeriesError::InvalidCandle { index, reason })?;
            if index > 0 {
                let previous = candles[index - 1].time;
                if candle.time <= previous {
                    return Err(SeriesError::NonIncreasingTime {
                        index,
                        previous,
                        current: candle.time,
                    });
                }
            }
        }
        Ok(Self { candles })
    }

    /// Sorts by time and collapses repeated timestamps before validating.
    ///
    /// Exchanges return klines newest-first and may repeat the still-open
    /// candle across pages; for a repeated timestamp the later record wins.
    ///
    /// # Errors
    /// Returns [`SeriesError`] if any candle is malformed.
    pub fn from_unsorted(mut candles: Vec<Candle>) -> Result<Self, SeriesError> {
        candles.sort_by_key(|c| c.time);
        candles.dedup_by(|later, earlier| {
            if later.time == earlier.time {
                std::mem::swap(later, earlier);
                true
            } else {
                false
            }
        });
        Self::new(candles)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    #[must_use]
    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    #[must_use]
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    #[must_use]
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    #[must_use]
    pub fn typical_prices(&self) -> Vec<f64> {
        self.candles.iter().map(Candle::typical_price).collect()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Candle> {
        self.candles
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
