//! Indicators and signal evaluators.
//!
//! The evaluators are interchangeable implementations of
//! [`SignalEvaluator`]; [`build_evaluator`] picks one from configuration.

pub mod bracket;
pub mod confluence;
pub mod crossover;
pub mod frame;
pub mod indicators;
pub mod pullback;

pub use bracket::AtrBracket;
pub use confluence::{ConfluenceInputs, ConfluenceRules, WaveTrendConfluence};
pub use crossover::Crossover;
pub use frame::{FrameSnapshot, IndicatorFrame};
pub use pullback::{PullbackInputs, PullbackRules, RsiPullback};

use signal_engine_core::{AppConfig, SignalEvaluator, StrategyKind};

/// Builds the evaluator selected by `strategy.kind`.
#[must_use]
pub fn build_evaluator(config: &AppConfig) -> Box<dyn SignalEvaluator> {
    match config.strategy.kind {
        StrategyKind::Confluence => Box::new(WaveTrendConfluence::from_config(config)),
        StrategyKind::Pullback => Box::new(RsiPullback::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_evaluator_for_each_kind() {
        let mut config = AppConfig::default();
        assert_eq!(build_evaluator(&config).name(), "wavetrend-confluence");

        config.strategy.kind = StrategyKind::Pullback;
        assert_eq!(build_evaluator(&config).name(), "rsi-pullback");
    }
}
