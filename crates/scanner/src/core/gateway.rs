//! Market data gateway seam.
//!
//! The analyzer and scanner only talk to [`MarketDataGateway`]; the Binance
//! REST adapter in [`super::data_service`] is the production implementation.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::types::{Candle, TickerSnapshot, Timeframe};

/// Source of prices, 24h tickers and candles for a symbol.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    async fn get_current_price(&self, symbol: &str) -> Result<Decimal>;

    /// `None` when the exchange does not know the symbol.
    async fn get_24h_ticker(&self, symbol: &str) -> Result<Option<TickerSnapshot>>;

    /// Candles ordered oldest to newest.
    async fn get_klines(&self, symbol: &str, interval: Timeframe, limit: u32)
        -> Result<Vec<Candle>>;

    /// Every actively traded spot symbol in the configured quote asset, sorted.
    async fn get_all_tradable_pairs(&self) -> Result<Vec<String>>;
}
