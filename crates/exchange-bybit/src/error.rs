//! Error types for the Bybit kline adapter.

use signal_engine_core::SeriesError;
use thiserror::Error;

/// Errors that can occur while fetching klines.
#[derive(Debug, Error)]
pub enum KlineError {
    /// Non-success HTTP status.
    #[error("HTTP {status_code}: {body}")]
    Http {
        /// HTTP status code.
        status_code: u16,
        /// Response body, possibly an HTML error page.
        body: String,
    },

    /// Bybit answered with a non-zero `retCode`.
    #[error("Bybit API error {ret_code}: {ret_msg}")]
    Api {
        /// Bybit return code.
        ret_code: i64,
        /// Bybit return message.
        ret_msg: String,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Body was not the expected JSON shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A kline row could not be turned into a candle.
    #[error("malformed kline row {row}: {reason}")]
    MalformedRow {
        /// Index in the response list.
        row: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Rows parsed but do not form a valid series.
    #[error(transparent)]
    Series(#[from] SeriesError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl KlineError {
    /// Creates an HTTP error from status code and body.
    pub fn http(status_code: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status_code,
            body: body.into(),
        }
    }

    /// Creates a Bybit API error.
    pub fn api(ret_code: i64, ret_msg: impl Into<String>) -> Self {
        Self::Api {
            ret_code,
            ret_msg: ret_msg.into(),
        }
    }

    /// Creates a malformed row error.
    pub fn malformed(row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            row,
            reason: reason.into(),
        }
    }

    /// Returns true if the next poll may succeed without intervention.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Http { status_code, .. } => *status_code == 429 || *status_code >= 500,
            // 10006: too many visits
            Self::Api { ret_code, .. } => *ret_code == 10006,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for KlineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for KlineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for the Bybit adapter.
pub type Result<T> = std::result::Result<T, KlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(KlineError::http(503, "unavailable").is_transient());
        assert!(KlineError::http(429, "slow down").is_transient());
        assert!(!KlineError::http(404, "not found").is_transient());
        assert!(KlineError::api(10006, "Too many visits").is_transient());
        assert!(!KlineError::api(10001, "params error").is_transient());
        assert!(!KlineError::malformed(0, "bad").is_transient());
    }

    #[test]
    fn display_includes_details() {
        let err = KlineError::api(10001, "symbol invalid");
        assert_eq!(err.to_string(), "Bybit API error 10001: symbol invalid");
        assert!(KlineError::malformed(3, "open: invalid float")
            .to_string()
            .contains("row 3"));
    }
}
