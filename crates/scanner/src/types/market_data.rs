use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLCV candle (Binance kline).
///
/// Series are always ordered oldest to newest by `open_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in milliseconds since the epoch.
    pub open_time: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub close: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    /// Close time in milliseconds since the epoch.
    pub close_time: i64,
}

impl Candle {
    /// Absolute size of the real body.
    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    /// Distance from the top of the body to the high.
    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    /// Distance from the bottom of the body to the low.
    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// 24-hour rolling ticker statistics for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub last_price: Decimal,
    /// Percent change over 24h, e.g. `2.5` for +2.5 %.
    #[serde(with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,
    /// Base-asset volume over 24h.
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    /// Quote-asset (USDT) volume over 24h.
    #[serde(with = "rust_decimal::serde::str")]
    pub quote_volume: Decimal,
}
