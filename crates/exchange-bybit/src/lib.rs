//! Bybit v5 kline adapter.
//!
//! This crate provides:
//! - REST client with rate limiting for the public kline endpoint
//! - Decoding of `[time, open, high, low, close, volume, turnover]` string rows
//! - A [`signal_engine_core::CandleSource`] over the configured symbol/interval

pub mod candle_source;
pub mod client;
pub mod error;

pub use candle_source::BybitCandleSource;
pub use client::{
    parse_kline_rows, BybitClient, BybitClientConfig, KlineRequest, BYBIT_DEMO_URL,
    BYBIT_MAINNET_URL, BYBIT_TESTNET_URL,
};
pub use error::{KlineError, Result};
