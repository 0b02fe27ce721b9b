//! Directional trade signals emitted by the engine.
//!
//! A [`Signal`] is produced from the last candle of a series, so its `time`
//! is always that candle's open time. That timestamp is the only key the
//! dedup gate compares.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a trade signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    /// Expect price to go up
    Buy,
    /// Expect price to go down
    Sell,
}

impl SignalType {
    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => anyhow::bail!("unknown signal type: {other}"),
        }
    }
}

/// Confidence tier of a signal. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalLevel {
    Low,
    Medium,
    High,
}

impl SignalLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for SignalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => anyhow::bail!("unknown signal level: {other}"),
        }
    }
}

/// A BUY/SELL signal for one candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Trade direction
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    /// Confidence tier
    pub level: SignalLevel,
    /// Close of the producing candle
    pub price: f64,
    /// Open time (epoch ms) of the producing candle
    pub time: i64,
    /// ATR-derived protective stop, when ATR was defined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    /// ATR-derived profit target, when ATR was defined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<f64>,
}

impl Signal {
    #[must_use]
    pub const fn new(signal_type: SignalType, level: SignalLevel, price: f64, time: i64) -> Self {
        Self {
            signal_type,
            level,
            price,
            time,
            stop_loss: None,
            take_profit: None,
        }
    }

    /// Attaches a stop-loss / take-profit bracket.
    #[must_use]
    pub fn with_bracket(mut self, stop_loss: f64, take_profit: f64) -> Self {
        self.stop_loss = Some(stop_loss);
        self.take_profit = Some(take_profit);
        self
    }

    /// True when both signals were produced by the same candle.
    #[must_use]
    pub const fn is_same_candle(&self, other: &Self) -> bool {
        self.time == other.time
    }

    /// Candle time as a UTC timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time).single()
    }

    /// `HH:MM:SS` UTC rendering of the candle time, used by history listings.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.timestamp()
            .map_or_else(|| self.time.to_string(), |ts| ts.format("%H:%M:%S").to_string())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.5} [{}]",
            self.level,
            self.signal_type,
            self.price,
            self.display_time()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================
    // SignalType / SignalLevel Tests
    // ============================================

    #[test]
    fn signal_type_opposite() {
        assert_eq!(SignalType::Buy.opposite(), SignalType::Sell);
        assert_eq!(SignalType::Sell.opposite(), SignalType::Buy);
    }

    #[test]
    fn signal_type_parses_case_insensitively() {
        assert_eq!("buy".parse::<SignalType>().unwrap(), SignalType::Buy);
        assert_eq!("SELL".parse::<SignalType>().unwrap(), SignalType::Sell);
        assert!("hold".parse::<SignalType>().is_err());
    }

    #[test]
    fn signal_level_orders_by_confidence() {
        assert!(SignalLevel::High > SignalLevel::Medium);
        assert!(SignalLevel::Medium > SignalLevel::Low);
        assert_eq!("medium".parse::<SignalLevel>().unwrap(), SignalLevel::Medium);
    }

    // ============================================
    // Signal Tests
    // ============================================

    #[test]
    fn serializes_with_wire_names() {
        let signal = Signal::new(SignalType::Buy, SignalLevel::High, 0.1234, 1_700_000_000_000);
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "BUY");
        assert_eq!(json["level"], "High");
        assert_eq!(json["time"], 1_700_000_000_000_i64);
        assert!(json.get("stop_loss").is_none());
    }

    #[test]
    fn deserializes_without_bracket() {
        let json = r#"{"type":"SELL","level":"Low","price":1.5,"time":42}"#;
        let signal: Signal = serde_json::from_str(json).unwrap();
        assert_eq!(signal.signal_type, SignalType::Sell);
        assert_eq!(signal.level, SignalLevel::Low);
        assert!(signal.stop_loss.is_none());
    }

    #[test]
    fn same_candle_ignores_direction_and_level() {
        let a = Signal::new(SignalType::Buy, SignalLevel::High, 1.0, 60_000);
        let b = Signal::new(SignalType::Sell, SignalLevel::Low, 2.0, 60_000);
        let c = Signal::new(SignalType::Buy, SignalLevel::High, 1.0, 120_000);
        assert!(a.is_same_candle(&b));
        assert!(!a.is_same_candle(&c));
    }

    #[test]
    fn bracket_is_attached() {
        let signal = Signal::new(SignalType::Buy, SignalLevel::Medium, 10.0, 0).with_bracket(9.0, 12.0);
        assert_eq!(signal.stop_loss, Some(9.0));
        assert_eq!(signal.take_profit, Some(12.0));
    }

    #[test]
    fn display_time_is_utc_clock() {
        // 2023-11-14T22:13:20Z
        let signal = Signal::new(SignalType::Buy, SignalLevel::Low, 1.0, 1_700_000_000_000);
        assert_eq!(signal.display_time(), "22:13:20");
        assert!(signal.to_string().contains("Low BUY"));
    }
}
