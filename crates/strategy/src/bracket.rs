use signal_engine_core::{Signal, SignalType};

/// Stop-loss / take-profit levels placed a multiple of ATR away from entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtrBracket {
    stop_multiplier: f64,
    profit_multiplier: f64,
}

impl AtrBracket {
    #[must_use]
    pub const fn new(stop_multiplier: f64, profit_multiplier: f64) -> Self {
        Self {
            stop_multiplier,
            profit_multiplier,
        }
    }

    /// Returns `(stop_loss, take_profit)` for an entry at `price`.
    #[must_use]
    pub fn levels(&self, signal_type: SignalType, price: f64, atr: f64) -> (f64, f64) {
        let stop = atr * self.stop_multiplier;
        let profit = atr * self.profit_multiplier;
        match signal_type {
            SignalType::Buy => (price - stop, price + profit),
            SignalType::Sell => (price + stop, price - profit),
        }
    }

    /// Attaches the bracket when ATR is known; otherwise returns the signal unchanged.
    #[must_use]
    pub fn apply(&self, signal: Signal, atr: Option<f64>) -> Signal {
        match atr {
            Some(atr) if atr.is_finite() => {
                let (stop, take) = self.levels(signal.signal_type, signal.price, atr);
                signal.with_bracket(stop, take)
            }
            _ => signal,
        }
    }
}

impl Default for AtrBracket {
    fn default() -> Self {
        Self::new(1.5, 2.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_engine_core::SignalLevel;

    #[test]
    fn buy_bracket_is_below_and_above_entry() {
        let (stop, take) = AtrBracket::default().levels(SignalType::Buy, 100.0, 2.0);
        assert!((stop - 97.0).abs() < 1e-12);
        assert!((take - 105.0).abs() < 1e-12);
    }

    #[test]
    fn sell_bracket_is_mirrored() {
        let (stop, take) = AtrBracket::default().levels(SignalType::Sell, 100.0, 2.0);
        assert!((stop - 103.0).abs() < 1e-12);
        assert!((take - 95.0).abs() < 1e-12);
    }

    #[test]
    fn missing_atr_leaves_signal_untouched() {
        let signal = Signal::new(SignalType::Buy, SignalLevel::Low, 1.0, 42);
        let out = AtrBracket::default().apply(signal.clone(), None);
        assert_eq!(out, signal);
        assert_eq!(out.stop_loss, None);
    }

    #[test]
    fn apply_sets_both_levels() {
        let signal = Signal::new(SignalType::Sell, SignalLevel::High, 0.2, 42);
        let out = AtrBracket::new(1.0, 2.0).apply(signal, Some(0.01));
        assert!((out.stop_loss.unwrap() - 0.21).abs() < 1e-12);
        assert!((out.take_profit.unwrap() - 0.18).abs() < 1e-12);
    }
}
