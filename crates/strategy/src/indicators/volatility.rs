use super::moving_average::WilderAverage;
use signal_engine_core::Candle;

/// True range of `current` against the previous close.
#[must_use]
pub fn true_range(current: &Candle, prev_close: f64) -> f64 {
    let high_low = current.high - current.low;
    let high_close = (current.high - prev_close).abs();
    let low_close = (current.low - prev_close).abs();
    high_low.max(high_close).max(low_close)
}

/// Average True Range with Wilder's smoothing.
///
/// True range starts at the second candle, so `atr[i]` is defined for `i >= period`.
#[must_use]
pub fn atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; candles.len()];
    if period == 0 {
        return out;
    }

    let mut avg = WilderAverage::new(period);
    for (i, pair) in candles.windows(2).enumerate() {
        out[i + 1] = avg.update(true_range(&pair[1], pair[0].close));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, high: f64, low: f64, close: f64) -> Candle {
        Candle::new(time, close, high, low, close, 1.0)
    }

    #[test]
    fn true_range_uses_gap_from_previous_close() {
        // gap up: prev close 10, bar 12..13
        let c = candle(1, 13.0, 12.0, 12.5);
        assert!((true_range(&c, 10.0) - 3.0).abs() < 1e-12);
        // inside bar
        assert!((true_range(&c, 12.5) - 1.0).abs() < 1e-12);
        // gap down
        assert!((true_range(&c, 15.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn atr_defined_from_period_index() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| candle(i, 11.0, 9.0, 10.0))
            .collect();
        let out = atr(&candles, 14);
        assert!(out[..14].iter().all(Option::is_none));
        assert!((out[14].unwrap() - 2.0).abs() < 1e-12);
        assert!((out[19].unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn atr_is_non_negative() {
        let candles: Vec<Candle> = (0..100)
            .map(|i| {
                let p = 50.0 + (i as f64 * 0.4).sin() * 5.0;
                candle(i, p + 0.7, p - 0.3, p)
            })
            .collect();
        assert!(atr(&candles, 14).iter().flatten().all(|v| *v >= 0.0));
    }

    #[test]
    fn atr_empty_and_single_candle() {
        assert!(atr(&[], 14).is_empty());
        assert_eq!(atr(&[candle(0, 1.0, 1.0, 1.0)], 1), vec![None]);
    }
}
