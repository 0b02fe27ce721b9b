use crate::client::{BybitClient, BybitClientConfig, KlineRequest};
use anyhow::Result;
use async_trait::async_trait;
use signal_engine_core::{CandleSeries, CandleSource, ExchangeConfig};

/// Live candle source backed by the Bybit kline endpoint.
#[derive(Debug)]
pub struct BybitCandleSource {
    client: BybitClient,
    request: KlineRequest,
}

impl BybitCandleSource {
    #[must_use]
    pub const fn new(client: BybitClient, request: KlineRequest) -> Self {
        Self { client, request }
    }

    /// Builds client and request from the `exchange` config section.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_config(config: &ExchangeConfig) -> Result<Self> {
        let client = BybitClient::new(BybitClientConfig::from_exchange(config))?;
        Ok(Self::new(client, KlineRequest::from_exchange(config)))
    }

    #[must_use]
    pub const fn request(&self) -> &KlineRequest {
        &self.request
    }
}

#[async_trait]
impl CandleSource for BybitCandleSource {
    async fn fetch_candles(&self) -> Result<CandleSeries> {
        let series = self.client.get_klines(&self.request).await?;
        tracing::debug!(
            symbol = %self.request.symbol,
            candles = series.len(),
            last_time = series.last().map(|c| c.time),
            "fetched klines"
        );
        Ok(series)
    }

    fn symbol(&self) -> &str {
        &self.request.symbol
    }
}
