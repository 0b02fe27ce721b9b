//! Indicator values aligned one-to-one with a candle series.

use crate::indicators::{atr, ema, macd, rsi, sma, wavetrend};
use serde::Serialize;
use signal_engine_core::{CandleSeries, IndicatorConfig};

/// Every indicator the evaluators read, one entry per candle.
///
/// All vectors have the same length as the series they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub ema_fast: Vec<Option<f64>>,
    pub ema_trend: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub volume_sma: Vec<Option<f64>>,
    pub wt1: Vec<Option<f64>>,
    pub wt2: Vec<Option<f64>>,
    pub macd_line: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
}

impl IndicatorFrame {
    #[must_use]
    pub fn compute(series: &CandleSeries, config: &IndicatorConfig) -> Self {
        let candles = series.as_slice();
        let closes = series.closes();

        let wt = wavetrend(
            candles,
            config.wt_channel_len,
            config.wt_avg_len,
            config.wt_signal_len,
        );
        let m = macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal);

        Self {
            ema_fast: ema(&closes, config.fast_ema_period),
            ema_trend: ema(&closes, config.trend_ema_period),
            rsi: rsi(&closes, config.rsi_period),
            atr: atr(candles, config.atr_period),
            volume_sma: sma(&series.volumes(), config.volume_avg_period),
            wt1: wt.line,
            wt2: wt.signal,
            macd_line: m.line,
            macd_signal: m.signal,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ema_fast.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ema_fast.is_empty()
    }

    /// All indicator readings at `idx`, with undefined or non-finite values as `None`.
    #[must_use]
    pub fn snapshot(&self, idx: usize) -> FrameSnapshot {
        FrameSnapshot {
            index: idx,
            ema_fast: defined(&self.ema_fast, idx),
            ema_trend: defined(&self.ema_trend, idx),
            rsi: defined(&self.rsi, idx),
            atr: defined(&self.atr, idx),
            volume_sma: defined(&self.volume_sma, idx),
            wt1: defined(&self.wt1, idx),
            wt2: defined(&self.wt2, idx),
            macd_line: defined(&self.macd_line, idx),
            macd_signal: defined(&self.macd_signal, idx),
        }
    }
}

/// One row of an [`IndicatorFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub index: usize,
    pub ema_fast: Option<f64>,
    pub ema_trend: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub volume_sma: Option<f64>,
    pub wt1: Option<f64>,
    pub wt2: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
}

/// Value at `idx` if it is present and finite.
///
/// NaN and infinities read as undefined so they never reach a comparison.
#[must_use]
pub fn defined(values: &[Option<f64>], idx: usize) -> Option<f64> {
    values
        .get(idx)
        .copied()
        .flatten()
        .filter(|v| v.is_finite())
}
