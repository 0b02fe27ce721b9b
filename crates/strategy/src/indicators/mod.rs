//! Indicator library.
//!
//! Every function is pure and returns a series aligned index-for-index with
//! its input, `None` where the indicator is still warming up.

pub mod momentum;
pub mod moving_average;
pub mod volatility;

pub use momentum::{macd, rsi, wavetrend, Macd, WaveTrend};
pub use moving_average::{ema, ema_defined, sma, sma_defined, Ema, Sma, WilderAverage};
pub use volatility::{atr, true_range};
