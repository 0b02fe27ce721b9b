pub mod candle;
pub mod config;
pub mod config_loader;
pub mod engine;
pub mod error;
pub mod signal;
pub mod traits;

pub use candle::{Candle, CandleSeries};
pub use config::{
    AppConfig, DatabaseConfig, ExchangeConfig, IndicatorConfig, PipelineConfig, StrategyConfig,
    StrategyKind,
};
pub use config_loader::ConfigLoader;
pub use engine::EngineState;
pub use error::{EngineError, SeriesError};
pub use signal::{Signal, SignalLevel, SignalType};
pub use traits::{CandleSource, SignalEvaluator, SignalStore};
