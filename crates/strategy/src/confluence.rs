//! WaveTrend cross + trend filter, confirmed by MACD and RSI.
//!
//! Only the last candle of a series is evaluated:
//!
//! - **Primary**: close on the right side of the trend EMA AND WaveTrend
//!   line 1 crossing line 2 in the same direction on this candle
//! - **Confirmations**: MACD line vs its signal, RSI vs 50 (one each)
//! - **Level**: High with the required confirmations plus a volume spike,
//!   Medium with at least one confirmation, Low otherwise
//!
//! BUY is checked before SELL; a candle can produce at most one of them.

use crate::bracket::AtrBracket;
use crate::crossover::Crossover;
use crate::frame::{defined, IndicatorFrame};
use signal_engine_core::{
    AppConfig, CandleSeries, IndicatorConfig, Signal, SignalEvaluator, SignalLevel, SignalType,
    StrategyConfig,
};
use tracing::debug;

const RSI_MIDLINE: f64 = 50.0;

/// Confirmation and volume thresholds for the confluence rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfluenceRules {
    /// Confirmations (out of 2) needed, with a volume spike, for High.
    pub required_confirmations: usize,
    pub volume_spike_factor: f64,
}

impl ConfluenceRules {
    pub const MAX_CONFIRMATIONS: usize = 2;

    #[must_use]
    pub fn new(required_confirmations: usize, volume_spike_factor: f64) -> Self {
        Self {
            required_confirmations: required_confirmations.clamp(1, Self::MAX_CONFIRMATIONS),
            volume_spike_factor,
        }
    }

    #[must_use]
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.required_confirmations, config.volume_spike_factor)
    }
}

impl Default for ConfluenceRules {
    fn default() -> Self {
        Self::new(2, 1.5)
    }
}

/// Every value the decision reads, taken from the last two rows of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfluenceInputs {
    pub close: f64,
    pub volume: f64,
    pub ema_trend: f64,
    pub prev_wt1: f64,
    pub wt1: f64,
    pub prev_wt2: f64,
    pub wt2: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub rsi: f64,
    pub volume_sma: f64,
}

impl ConfluenceInputs {
    /// Reads the inputs for candle `idx`. `None` if `idx == 0` or any value
    /// at `idx` / `idx - 1` is undefined or non-finite.
    #[must_use]
    pub fn at(series: &CandleSeries, frame: &IndicatorFrame, idx: usize) -> Option<Self> {
        let prev = idx.checked_sub(1)?;
        let candle = series.get(idx)?;
        if !candle.close.is_finite() || !candle.volume.is_finite() {
            return None;
        }

        Some(Self {
            close: candle.close,
            volume: candle.volume,
            ema_trend: defined(&frame.ema_trend, idx)?,
            prev_wt1: defined(&frame.wt1, prev)?,
            wt1: defined(&frame.wt1, idx)?,
            prev_wt2: defined(&frame.wt2, prev)?,
            wt2: defined(&frame.wt2, idx)?,
            macd_line: defined(&frame.macd_line, idx)?,
            macd_signal: defined(&frame.macd_signal, idx)?,
            rsi: defined(&frame.rsi, idx)?,
            volume_sma: defined(&frame.volume_sma, idx)?,
        })
    }

    fn confirmations(&self, direction: SignalType) -> usize {
        let (macd_agrees, rsi_agrees) = match direction {
            SignalType::Buy => (self.macd_line > self.macd_signal, self.rsi > RSI_MIDLINE),
            SignalType::Sell => (self.macd_line < self.macd_signal, self.rsi < RSI_MIDLINE),
        };
        usize::from(macd_agrees) + usize::from(rsi_agrees)
    }

    fn trend_agrees(&self, direction: SignalType) -> bool {
        match direction {
            SignalType::Buy => self.close > self.ema_trend,
            SignalType::Sell => self.close < self.ema_trend,
        }
    }

    fn is_volume_spike(&self, factor: f64) -> bool {
        self.volume > self.volume_sma * factor
    }
}

/// The confluence decision: direction and level, or `None` when the primary
/// condition does not hold.
#[must_use]
pub fn decide(inputs: &ConfluenceInputs, rules: &ConfluenceRules) -> Option<(SignalType, SignalLevel)> {
    // Crossover::detect checks the upward flip first
    let direction =
        Crossover::detect(inputs.prev_wt1, inputs.wt1, inputs.prev_wt2, inputs.wt2)?.signal_type();
    if !inputs.trend_agrees(direction) {
        return None;
    }

    let confirmations = inputs.confirmations(direction);
    let level = if confirmations >= rules.required_confirmations
        && inputs.is_volume_spike(rules.volume_spike_factor)
    {
        SignalLevel::High
    } else if confirmations >= 1 {
        SignalLevel::Medium
    } else {
        SignalLevel::Low
    };

    Some((direction, level))
}

/// Default evaluator: WaveTrend cross + trend filter + MACD/RSI confluence.
#[derive(Debug, Clone)]
pub struct WaveTrendConfluence {
    indicators: IndicatorConfig,
    rules: ConfluenceRules,
    bracket: AtrBracket,
}

impl WaveTrendConfluence {
    #[must_use]
    pub const fn new(indicators: IndicatorConfig, rules: ConfluenceRules, bracket: AtrBracket) -> Self {
        Self {
            indicators,
            rules,
            bracket,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.indicators.clone(),
            ConfluenceRules::from_config(&config.strategy),
            AtrBracket::new(
                config.strategy.atr_stop_multiplier,
                config.strategy.atr_profit_multiplier,
            ),
        )
    }

    #[must_use]
    pub const fn rules(&self) -> &ConfluenceRules {
        &self.rules
    }

    /// Evaluates the last candle against an already computed frame.
    #[must_use]
    pub fn evaluate_frame(&self, series: &CandleSeries, frame: &IndicatorFrame) -> Option<Signal> {
        let last = series.len().checked_sub(1)?;
        let inputs = ConfluenceInputs::at(series, frame, last)?;
        let (signal_type, level) = decide(&inputs, &self.rules)?;
        let candle = series.get(last)?;

        debug!(
            time = candle.time,
            signal_type = %signal_type,
            level = %level,
            rsi = inputs.rsi,
            "confluence candidate"
        );

        let signal = Signal::new(signal_type, level, candle.close, candle.time);
        Some(self.bracket.apply(signal, defined(&frame.atr, last)))
    }
}

impl Default for WaveTrendConfluence {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl SignalEvaluator for WaveTrendConfluence {
    fn evaluate(&self, series: &CandleSeries) -> Option<Signal> {
        if series.len() < self.required_lookback() {
            return None;
        }
        let frame = IndicatorFrame::compute(series, &self.indicators);
        self.evaluate_frame(series, &frame)
    }

    fn required_lookback(&self) -> usize {
        let c = &self.indicators;
        [
            c.wt_channel_len + c.wt_avg_len,
            c.macd_slow,
            c.rsi_period + 1,
            c.trend_ema_period,
            c.volume_avg_period,
            2,
        ]
        .into_iter()
        .max()
        .unwrap_or(2)
    }

    fn name(&self) -> &str {
        "wavetrend-confluence"
    }
}
