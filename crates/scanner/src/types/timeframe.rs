//! Candle timeframes used for fetching and for the recommended trading
//! horizon of an analysis.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported trading timeframes, shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1-minute candles (force-change detection)
    #[serde(rename = "1m")]
    M1,
    /// 5-minute candles (whale detection, very volatile markets)
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    /// 1-hour candles (default analysis interval)
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
}

impl Timeframe {
    /// Binance kline interval string representation.
    #[must_use]
    pub fn as_binance_interval(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_binance_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binance_intervals() {
        assert_eq!(Timeframe::M1.as_binance_interval(), "1m");
        assert_eq!(Timeframe::H4.as_binance_interval(), "4h");
    }

    #[test]
    fn test_serde_uses_binance_labels() {
        assert_eq!(serde_json::to_string(&Timeframe::M15).unwrap(), "\"15m\"");
        let tf: Timeframe = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(tf, Timeframe::H4);
    }

    #[test]
    fn test_ordering_shortest_first() {
        assert!(Timeframe::M1 < Timeframe::H4);
        assert_eq!(Timeframe::M5.to_string(), "5m");
    }
}
