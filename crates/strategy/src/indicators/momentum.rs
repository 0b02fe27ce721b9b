//! Momentum oscillators: RSI, MACD and the WaveTrend line pair.

use super::moving_average::{ema, ema_defined, sma_defined, WilderAverage};
use signal_engine_core::Candle;

/// Scale applied to the mean deviation in the WaveTrend channel index.
pub const WAVETREND_SCALE: f64 = 0.015;

/// Mean deviation at or below this fraction of price counts as a flat channel.
const FLAT_CHANNEL: f64 = 1e-12;

/// Relative Strength Index with Wilder's smoothing.
///
/// `rsi[i]` is defined for `i >= period`; values always lie in `[0, 100]`,
/// and a window with no losses reads 100.
#[must_use]
pub fn rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if period == 0 {
        return out;
    }

    let mut avg_gain = WilderAverage::new(period);
    let mut avg_loss = WilderAverage::new(period);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        let gain = avg_gain.update(change.max(0.0));
        let loss = avg_loss.update((-change).max(0.0));
        if let (Some(gain), Some(loss)) = (gain, loss) {
            out[i] = Some(rsi_from_averages(gain, loss));
        }
    }
    out
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// MACD line and its signal line.
#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
}

impl Macd {
    /// `line - signal` where both are defined.
    #[must_use]
    pub fn histogram(&self) -> Vec<Option<f64>> {
        self.line
            .iter()
            .zip(&self.signal)
            .map(|(l, s)| Some((*l)? - (*s)?))
            .collect()
    }
}

/// `line = EMA(fast) - EMA(slow)`, `signal = EMA(line, signal_period)`.
#[must_use]
pub fn macd(data: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    let fast_ema = ema(data, fast);
    let slow_ema = ema(data, slow);
    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = ema_defined(&line, signal_period);
    Macd { line, signal }
}

/// WaveTrend oscillator pair.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTrend {
    /// Line 1 (`tci`): smoothed channel index.
    pub line: Vec<Option<f64>>,
    /// Line 2: SMA of line 1.
    pub signal: Vec<Option<f64>>,
}

/// WaveTrend over typical price `(h + l + c) / 3`.
///
/// `esa = EMA(ap, channel_len)`, `d = EMA(|ap - esa|, channel_len)`,
/// `ci = (ap - esa) / (0.015 * d)`, `line = EMA(ci, avg_len)`,
/// `signal = SMA(line, signal_len)`.
///
/// A flat channel gives `ci = 0` instead of dividing by zero. This is a
/// tolerance-based form of the `d == 0` rule: `d <= 1e-12 * |ap|` counts as
/// flat, since a constant series leaves rounding noise in `d` rather than an
/// exact zero. Any larger `d` goes through the formula.
#[must_use]
pub fn wavetrend(
    candles: &[Candle],
    channel_len: usize,
    avg_len: usize,
    signal_len: usize,
) -> WaveTrend {
    let ap: Vec<f64> = candles.iter().map(Candle::typical_price).collect();
    let esa = ema(&ap, channel_len);

    let deviation: Vec<Option<f64>> = ap
        .iter()
        .zip(&esa)
        .map(|(price, esa)| esa.map(|esa| (price - esa).abs()))
        .collect();
    let d = ema_defined(&deviation, channel_len);

    let ci: Vec<Option<f64>> = ap
        .iter()
        .zip(esa.iter().zip(&d))
        .map(|(price, (esa, d))| Some(channel_index(*price, (*esa)?, (*d)?)))
        .collect();

    let line = ema_defined(&ci, avg_len);
    let signal = sma_defined(&line, signal_len);
    WaveTrend { line, signal }
}

/// `(ap - esa) / (0.015 * d)`, or 0 for a flat channel.
fn channel_index(price: f64, esa: f64, d: f64) -> f64 {
    if d <= FLAT_CHANNEL * price.abs() {
        0.0
    } else {
        (price - esa) / (WAVETREND_SCALE * d)
    }
}
