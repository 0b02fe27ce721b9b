//! Mean-reversion pullback inside the prevailing trend.
//!
//! BUY when price holds above the trend EMA, has dipped below the fast EMA,
//! and RSI climbs back through the pullback threshold on this candle. SELL
//! mirrors it. A candle whose wick reached a full ATR past the fast EMA on a
//! volume spike is rated High, anything else Medium.

use crate::bracket::AtrBracket;
use crate::frame::{defined, IndicatorFrame};
use signal_engine_core::{
    AppConfig, CandleSeries, IndicatorConfig, Signal, SignalEvaluator, SignalLevel, SignalType,
    StrategyConfig,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullbackRules {
    /// RSI must cross up through this level for a BUY.
    pub rsi_buy: f64,
    /// RSI must cross down through this level for a SELL.
    pub rsi_sell: f64,
    pub volume_spike_factor: f64,
}

impl PullbackRules {
    #[must_use]
    pub const fn from_config(config: &StrategyConfig) -> Self {
        Self {
            rsi_buy: config.rsi_pullback_buy,
            rsi_sell: config.rsi_pullback_sell,
            volume_spike_factor: config.volume_spike_factor,
        }
    }
}

impl Default for PullbackRules {
    fn default() -> Self {
        Self::from_config(&StrategyConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullbackInputs {
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub ema_fast: f64,
    pub ema_trend: f64,
    pub prev_rsi: f64,
    pub rsi: f64,
    pub atr: f64,
    pub volume_sma: f64,
}

impl PullbackInputs {
    #[must_use]
    pub fn at(series: &CandleSeries, frame: &IndicatorFrame, idx: usize) -> Option<Self> {
        let prev = idx.checked_sub(1)?;
        let candle = series.get(idx)?;

        Some(Self {
            close: candle.close,
            high: candle.high,
            low: candle.low,
            volume: candle.volume,
            ema_fast: defined(&frame.ema_fast, idx)?,
            ema_trend: defined(&frame.ema_trend, idx)?,
            prev_rsi: defined(&frame.rsi, prev)?,
            rsi: defined(&frame.rsi, idx)?,
            atr: defined(&frame.atr, idx)?,
            volume_sma: defined(&frame.volume_sma, idx)?,
        })
    }
}

#[must_use]
pub fn decide(inputs: &PullbackInputs, rules: &PullbackRules) -> Option<(SignalType, SignalLevel)> {
    let i = inputs;
    let volume_spike = i.volume > i.volume_sma * rules.volume_spike_factor;

    let is_buy = i.close > i.ema_trend
        && i.close < i.ema_fast
        && i.prev_rsi <= rules.rsi_buy
        && i.rsi > rules.rsi_buy;
    if is_buy {
        let deep = i.low < i.ema_fast - i.atr;
        return Some((SignalType::Buy, level(deep && volume_spike)));
    }

    let is_sell = i.close < i.ema_trend
        && i.close > i.ema_fast
        && i.prev_rsi >= rules.rsi_sell
        && i.rsi < rules.rsi_sell;
    if is_sell {
        let deep = i.high > i.ema_fast + i.atr;
        return Some((SignalType::Sell, level(deep && volume_spike)));
    }

    None
}

const fn level(strong: bool) -> SignalLevel {
    if strong {
        SignalLevel::High
    } else {
        SignalLevel::Medium
    }
}

/// Alternate evaluator: RSI pullback within the trend.
#[derive(Debug, Clone)]
pub struct RsiPullback {
    indicators: IndicatorConfig,
    rules: PullbackRules,
    bracket: AtrBracket,
}

impl RsiPullback {
    #[must_use]
    pub const fn new(indicators: IndicatorConfig, rules: PullbackRules, bracket: AtrBracket) -> Self {
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
            PullbackRules::from_config(&config.strategy),
            AtrBracket::new(
                config.strategy.atr_stop_multiplier,
                config.strategy.atr_profit_multiplier,
            ),
        )
    }

    #[must_use]
    pub fn evaluate_frame(&self, series: &CandleSeries, frame: &IndicatorFrame) -> Option<Signal> {
        let last = series.len().checked_sub(1)?;
        let inputs = PullbackInputs::at(series, frame, last)?;
        let (signal_type, level) = decide(&inputs, &self.rules)?;
        let candle = series.get(last)?;

        debug!(
            time = candle.time,
            signal_type = %signal_type,
            level = %level,
            rsi = inputs.rsi,
            "pullback candidate"
        );

        let signal = Signal::new(signal_type, level, candle.close, candle.time);
        Some(self.bracket.apply(signal, Some(inputs.atr)))
    }
}

impl Default for RsiPullback {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl SignalEvaluator for RsiPullback {
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
            c.trend_ema_period,
            c.rsi_period + 1,
            c.atr_period + 1,
            c.volume_avg_period,
            2,
        ]
        .into_iter()
        .max()
        .unwrap_or(2)
    }

    fn name(&self) -> &str {
        "rsi-pullback"
    }
}
