//! Bybit v5 market-data client with rate limiting.
//!
//! Only the public kline endpoint is used, so no request signing is needed.
//!
//! # Example
//!
//! ```ignore
//! use signal_engine_bybit::{BybitClient, BybitClientConfig, KlineRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BybitClient::new(BybitClientConfig::mainnet())?;
//!     let series = client.get_klines(&KlineRequest::linear("DOGEUSDT", "1")).await?;
//!     println!("{} candles, last close {:?}", series.len(), series.last().map(|c| c.close));
//!     Ok(())
//! }
//! ```

use crate::error::{KlineError, Result};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::Deserialize;
use signal_engine_core::{Candle, CandleSeries, ExchangeConfig};
use std::num::NonZeroU32;
use std::sync::Arc;

// =============================================================================
// Constants
// =============================================================================

/// Bybit mainnet REST base URL.
pub const BYBIT_MAINNET_URL: &str = "https://api.bybit.com";

/// Bybit testnet REST base URL.
pub const BYBIT_TESTNET_URL: &str = "https://api-testnet.bybit.com";

/// Bybit demo-trading REST base URL.
pub const BYBIT_DEMO_URL: &str = "https://api-demo.bybit.com";

/// Kline endpoint path.
pub const KLINE_PATH: &str = "/v5/market/kline";

/// Largest `limit` the kline endpoint accepts.
pub const MAX_KLINE_LIMIT: u32 = 1000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Bybit client.
#[derive(Debug, Clone)]
pub struct BybitClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Requests per second limit.
    pub requests_per_second: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BybitClientConfig {
    fn default() -> Self {
        Self {
            base_url: BYBIT_MAINNET_URL.to_string(),
            requests_per_second: nonzero!(10u32),
            timeout_secs: 10,
        }
    }
}

impl BybitClientConfig {
    #[must_use]
    pub fn mainnet() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn testnet() -> Self {
        Self::default().with_base_url(BYBIT_TESTNET_URL)
    }

    #[must_use]
    pub fn demo() -> Self {
        Self::default().with_base_url(BYBIT_DEMO_URL)
    }

    /// Builds a client configuration from the `exchange` config section.
    ///
    /// A zero rate limit falls back to the default.
    #[must_use]
    pub fn from_exchange(config: &ExchangeConfig) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config.base_url.clone(),
            requests_per_second: NonZeroU32::new(config.requests_per_second)
                .unwrap_or(defaults.requests_per_second),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: NonZeroU32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Parameters of one kline query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineRequest {
    /// Product category: `linear`, `inverse` or `spot`.
    pub category: String,
    pub symbol: String,
    /// Minutes (`1`, `5`, `60`, ...) or `D`, `W`, `M`.
    pub interval: String,
    /// Number of candles, clamped to `1..=1000`.
    pub limit: u32,
}

impl KlineRequest {
    /// USDT perpetual klines with the default 200-candle window.
    #[must_use]
    pub fn linear(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            category: "linear".to_string(),
            symbol: symbol.into(),
            interval: interval.into(),
            limit: 200,
        }
    }

    #[must_use]
    pub fn from_exchange(config: &ExchangeConfig) -> Self {
        Self {
            category: config.category.clone(),
            symbol: config.symbol.clone(),
            interval: config.interval.clone(),
            limit: config.limit,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn query(&self) -> [(&'static str, String); 4] {
        [
            ("category", self.category.clone()),
            ("symbol", self.symbol.clone()),
            ("interval", self.interval.clone()),
            ("limit", self.limit.clamp(1, MAX_KLINE_LIMIT).to_string()),
        ]
    }
}

// =============================================================================
// API Response Types
// =============================================================================

/// Raw kline response envelope.
#[derive(Debug, Deserialize)]
struct RawKlineResponse {
    #[serde(rename = "retCode")]
    ret_code: i64,
    #[serde(rename = "retMsg", default)]
    ret_msg: String,
    result: Option<RawKlineResult>,
}

#[derive(Debug, Deserialize)]
struct RawKlineResult {
    /// `[startTime, open, high, low, close, volume, turnover]`, newest first.
    #[serde(default)]
    list: Vec<Vec<String>>,
}

/// Converts Bybit kline rows into candles, in the order given.
///
/// Each row is `[startTime, open, high, low, close, volume, turnover]` with
/// every field a decimal string; the turnover column is ignored.
///
/// # Errors
/// Returns [`KlineError::MalformedRow`] for a short row or unparsable field.
pub fn parse_kline_rows(rows: &[Vec<String>]) -> Result<Vec<Candle>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() < 6 {
                return Err(KlineError::malformed(
                    i,
                    format!("expected at least 6 fields, got {}", row.len()),
                ));
            }

            let time = row[0]
                .parse::<i64>()
                .map_err(|e| KlineError::malformed(i, format!("startTime: {e}")))?;
            let num = |idx: usize, name: &str| {
                row[idx]
                    .parse::<f64>()
                    .map_err(|e| KlineError::malformed(i, format!("{name}: {e}")))
            };

            Ok(Candle::new(
                time,
                num(1, "open")?,
                num(2, "high")?,
                num(3, "low")?,
                num(4, "close")?,
                num(5, "volume")?,
            ))
        })
        .collect()
}

// =============================================================================
// Client
// =============================================================================

/// Rate-limited Bybit REST client.
pub struct BybitClient {
    /// Configuration.
    config: BybitClientConfig,

    /// HTTP client.
    http: Client,

    /// Rate limiter.
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for BybitClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BybitClient")
            .field("base_url", &self.config.base_url)
            .field("requests_per_second", &self.config.requests_per_second)
            .finish_non_exhaustive()
    }
}

impl BybitClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: BybitClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KlineError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_second(config.requests_per_second);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetches klines and returns them as an ascending, validated series.
    ///
    /// # Errors
    /// Returns error on transport failure, non-success status, non-zero
    /// `retCode`, an unparsable body or row, or rows that do not form a
    /// valid series.
    pub async fn get_klines(&self, request: &KlineRequest) -> Result<CandleSeries> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, KLINE_PATH);
        tracing::debug!(
            symbol = %request.symbol,
            interval = %request.interval,
            limit = request.limit,
            "GET {}",
            url
        );

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&request.query())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(KlineError::http(status.as_u16(), body));
        }

        // Bybit can answer 200 with an HTML error page
        let raw: RawKlineResponse = serde_json::from_str(&body)?;
        if raw.ret_code != 0 {
            return Err(KlineError::api(raw.ret_code, raw.ret_msg));
        }

        let rows = raw.result.map(|r| r.list).unwrap_or_default();
        let candles = parse_kline_rows(&rows)?;
        Ok(CandleSeries::from_unsorted(candles)?)
    }
}
