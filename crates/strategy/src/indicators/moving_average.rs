//! Moving averages and the smoothing recurrences the other indicators build on.
//!
//! Every batch function returns a vector the same length as its input with
//! `None` in the warm-up region. The streaming types ([`Ema`], [`Sma`],
//! [`WilderAverage`]) carry only the scalar state needed for the next value,
//! so the batch functions are a fold over them.
//!
//! EMA seeding: the first defined value is the simple average of the first
//! `period` inputs, placed at index `period - 1`. Nested EMAs (inside MACD
//! and WaveTrend) apply the same rule starting from their first defined input.

use std::collections::VecDeque;

/// Streaming exponential moving average with SMA seed, `k = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: f64,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl Ema {
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    /// Feeds one value and returns the average once the seed window is full.
    pub fn update(&mut self, x: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        self.value = match self.value {
            Some(prev) => Some(prev + self.k * (x - prev)),
            None => {
                self.seed_sum += x;
                self.seen += 1;
                (self.seen == self.period).then(|| self.seed_sum / self.period as f64)
            }
        };
        self.value
    }

    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Streaming simple moving average over a running-sum window.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
}

impl Sma {
    #[must_use]
    pub fn new(period: usize) -> Self {
        Self {
            period,
            window: VecDeque::with_capacity(period),
            sum: 0.0,
        }
    }

    pub fn update(&mut self, x: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        self.window.push_back(x);
        self.sum += x;
        if self.window.len() > self.period {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }
        (self.window.len() == self.period).then(|| self.sum / self.period as f64)
    }
}

/// Wilder's smoothing: simple-average seed over `period` values, then
/// `avg = (avg * (period - 1) + x) / period`.
#[derive(Debug, Clone)]
pub struct WilderAverage {
    period: usize,
    seed_sum: f64,
    seen: usize,
    value: Option<f64>,
}

impl WilderAverage {
    #[must_use]
    pub const fn new(period: usize) -> Self {
        Self {
            period,
            seed_sum: 0.0,
            seen: 0,
            value: None,
        }
    }

    pub fn update(&mut self, x: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        let p = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some((prev * (p - 1.0) + x) / p),
            None => {
                self.seed_sum += x;
                self.seen += 1;
                (self.seen == self.period).then(|| self.seed_sum / p)
            }
        };
        self.value
    }

    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Exponential moving average of a dense series.
#[must_use]
pub fn ema(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut state = Ema::new(period);
    data.iter().map(|&x| state.update(x)).collect()
}

/// EMA over a series with a leading undefined region; `None` inputs are skipped.
#[must_use]
pub fn ema_defined(data: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut state = Ema::new(period);
    data.iter().map(|x| x.and_then(|x| state.update(x))).collect()
}

/// Simple moving average of a dense series; defined from index `period - 1`.
#[must_use]
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut state = Sma::new(period);
    data.iter().map(|&x| state.update(x)).collect()
}

/// SMA over a series with a leading undefined region; `None` inputs are skipped.
#[must_use]
pub fn sma_defined(data: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut state = Sma::new(period);
    data.iter().map(|x| x.and_then(|x| state.update(x))).collect()
}
