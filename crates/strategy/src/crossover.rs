use signal_engine_core::SignalType;

/// Direction in which line A crossed line B between two consecutive candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Above,
    Below,
}

impl Crossover {
    /// Detects a strict flip in the order of two lines.
    ///
    /// Fires only on the candle where the order changes; lines that stay
    /// crossed, or touch without flipping, report `None`.
    #[must_use]
    pub fn detect(prev_a: f64, curr_a: f64, prev_b: f64, curr_b: f64) -> Option<Self> {
        if prev_a < prev_b && curr_a > curr_b {
            Some(Self::Above)
        } else if prev_a > prev_b && curr_a < curr_b {
            Some(Self::Below)
        } else {
            None
        }
    }

    /// The signal direction a crossover of the fast line suggests.
    #[must_use]
    pub const fn signal_type(self) -> SignalType {
        match self {
            Self::Above => SignalType::Buy,
            Self::Below => SignalType::Sell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_bullish_flip() {
        assert_eq!(Crossover::detect(1.0, 3.0, 2.0, 2.0), Some(Crossover::Above));
        assert_eq!(Crossover::Above.signal_type(), SignalType::Buy);
    }

    #[test]
    fn detects_bearish_flip() {
        assert_eq!(Crossover::detect(3.0, 1.0, 2.0, 2.0), Some(Crossover::Below));
        assert_eq!(Crossover::Below.signal_type(), SignalType::Sell);
    }

    #[test]
    fn no_crossover_while_lines_stay_ordered() {
        assert_eq!(Crossover::detect(3.0, 4.0, 2.0, 2.5), None);
        assert_eq!(Crossover::detect(1.0, 1.5, 2.0, 2.5), None);
    }

    #[test]
    fn touching_is_not_a_cross() {
        assert_eq!(Crossover::detect(2.0, 3.0, 2.0, 2.0), None);
        assert_eq!(Crossover::detect(1.0, 2.0, 2.0, 2.0), None);
    }
}
