use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub indicators: IndicatorConfig,
    pub strategy: StrategyConfig,
    pub pipeline: PipelineConfig,
    pub database: DatabaseConfig,
}

/// Where candles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub base_url: String,
    /// Bybit product category (`linear`, `spot`, `inverse`).
    pub category: String,
    pub symbol: String,
    /// Bybit interval code: minutes as a number, or `D`/`W`/`M`.
    pub interval: String,
    /// Candles per fetch (Bybit caps this at 1000).
    pub limit: u32,
    pub requests_per_second: u32,
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bybit.com".to_string(),
            category: "linear".to_string(),
            symbol: "DOGEUSDT".to_string(),
            interval: "1".to_string(),
            limit: 200,
            requests_per_second: 10,
            timeout_secs: 10,
        }
    }
}

/// Lookback periods for every indicator in the frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub fast_ema_period: usize,
    pub trend_ema_period: usize,
    pub rsi_period: usize,
    pub atr_period: usize,
    pub volume_avg_period: usize,
    pub wt_channel_len: usize,
    pub wt_avg_len: usize,
    pub wt_signal_len: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            fast_ema_period: 21,
            trend_ema_period: 50,
            rsi_period: 14,
            atr_period: 14,
            volume_avg_period: 20,
            wt_channel_len: 10,
            wt_avg_len: 21,
            wt_signal_len: 4,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// WaveTrend cross + trend filter, confirmed by MACD and RSI
    #[default]
    Confluence,
    /// Mean-reversion pullback inside the trend
    Pullback,
}

/// Decision-rule thresholds shared by the evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
    /// Confirmations needed (together with a volume spike) for a High signal.
    pub required_confirmations: usize,
    pub volume_spike_factor: f64,
    pub rsi_pullback_buy: f64,
    pub rsi_pullback_sell: f64,
    pub atr_stop_multiplier: f64,
    pub atr_profit_multiplier: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Confluence,
            required_confirmations: 2,
            volume_spike_factor: 1.5,
            rsi_pullback_buy: 40.0,
            rsi_pullback_sell: 60.0,
            atr_stop_multiplier: 1.5,
            atr_profit_multiplier: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub poll_interval_secs: u64,
    /// How many signals `history` shows.
    pub history_limit: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            history_limit: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/signals.db".to_string(),
            max_connections: 5,
        }
    }
}
