//! Binance REST market data adapter.
//!
//! Implements [`MarketDataGateway`] over the public Binance Spot API and
//! normalises its string-encoded numbers into `Decimal`.
//!
//! Endpoints:
//!   - `/api/v3/ticker/price`: current price
//!   - `/api/v3/ticker/24hr`: rolling 24h statistics
//!   - `/api/v3/klines`: OHLCV candles
//!   - `/api/v3/exchangeInfo`: symbol universe
//!
//! Caching (in-memory HashMap with per-data-type TTL):
//!   - Current price, 24h ticker: 5 s
//!   - Klines 1h: 60 s, other intervals: 30 s
//!   - Tradable pairs: 300 s
//!
//! Rate limiting (HTTP 429) and other non-2xx answers surface as
//! [`ScannerError::DataUnavailable`]; retries are left to the caller.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use super::gateway::MarketDataGateway;
use crate::config::DataSourceConfig;
use crate::constants::{
    BINANCE_TRADING_STATUS, KLINES_1H_CACHE_TTL_SECONDS, KLINES_CACHE_TTL_SECONDS,
    PAIRS_CACHE_TTL_SECONDS, PRICE_CACHE_TTL_SECONDS,
};
use crate::errors::ScannerError;
use crate::types::{Candle, TickerSnapshot, Timeframe};

// ═══════════════════════════════════════════════════════════════════════════
// Cache
// ═══════════════════════════════════════════════════════════════════════════

/// A single cache entry with expiration.
#[derive(Clone)]
struct CacheEntry<T: Clone> {
    data: T,
    expires_at: Instant,
}

impl<T: Clone> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Per-data-type in-memory cache.
#[derive(Default)]
struct DataCache {
    prices: HashMap<String, CacheEntry<Decimal>>,
    tickers: HashMap<String, CacheEntry<Option<TickerSnapshot>>>,
    klines: HashMap<String, CacheEntry<Vec<Candle>>>,
    pairs: Option<CacheEntry<Vec<String>>>,
}

fn klines_ttl(interval: Timeframe) -> Duration {
    if interval == Timeframe::H1 {
        Duration::from_secs(KLINES_1H_CACHE_TTL_SECONDS)
    } else {
        Duration::from_secs(KLINES_CACHE_TTL_SECONDS)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BinanceDataService
// ═══════════════════════════════════════════════════════════════════════════

/// Async Binance Spot fetcher with per-data-type caching.
pub struct BinanceDataService {
    client: reqwest::Client,
    cache: Mutex<DataCache>,
    config: DataSourceConfig,
}

impl BinanceDataService {
    pub fn new(config: DataSourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            cache: Mutex::new(DataCache::default()),
            config,
        })
    }

    // -----------------------------------------------------------------------
    // Private: HTTP + cache helpers
    // -----------------------------------------------------------------------

    fn cache(&self) -> std::sync::MutexGuard<'_, DataCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Issue a GET request to a Binance endpoint and return the parsed JSON.
    ///
    /// HTTP 400 (unknown symbol) yields `Ok(None)`.
    async fn binance_get_optional(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        let url = format!("{}{path}", self.config.base_url);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(url = %url, "rate limited by Binance");
            return Err(ScannerError::DataUnavailable { name: url }.into());
        }
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = resp.text().await.unwrap_or_default();
            debug!(url = %url, body = %body, "Binance rejected request");
            return Ok(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, body = %body, "Binance request failed");
            return Err(ScannerError::DataUnavailable { name: url }.into());
        }

        let value = resp
            .json::<Value>()
            .await
            .with_context(|| format!("parse JSON from {url}"))?;
        Ok(Some(value))
    }

    async fn binance_get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.binance_get_optional(path, params)
            .await?
            .ok_or_else(|| ScannerError::unavailable(format!("{path} rejected {params:?}")).into())
    }
}

#[async_trait]
impl MarketDataGateway for BinanceDataService {
    async fn get_current_price(&self, symbol: &str) -> Result<Decimal> {
        if let Some(entry) = self.cache().prices.get(symbol) {
            if entry.is_valid() {
                trace!(symbol = symbol, price = %entry.data, "price cache HIT");
                return Ok(entry.data);
            }
        }

        let data = self
            .binance_get("/api/v3/ticker/price", &[("symbol", symbol)])
            .await?;
        let price = data
            .get("price")
            .map(parse_decimal_str)
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| ScannerError::unavailable(format!("price {symbol}")))?;

        self.cache().prices.insert(
            symbol.to_string(),
            CacheEntry::new(price, Duration::from_secs(PRICE_CACHE_TTL_SECONDS)),
        );
        Ok(price)
    }

    async fn get_24h_ticker(&self, symbol: &str) -> Result<Option<TickerSnapshot>> {
        if let Some(entry) = self.cache().tickers.get(symbol) {
            if entry.is_valid() {
                trace!(symbol = symbol, "ticker cache HIT");
                return Ok(entry.data.clone());
            }
        }

        let start = Instant::now();
        let ticker = self
            .binance_get_optional("/api/v3/ticker/24hr", &[("symbol", symbol)])
            .await?
            .as_ref()
            .and_then(parse_ticker);

        debug!(
            symbol = symbol,
            found = ticker.is_some(),
            latency_ms = start.elapsed().as_millis() as u64,
            "24h ticker fetched"
        );

        self.cache().tickers.insert(
            symbol.to_string(),
            CacheEntry::new(ticker.clone(), Duration::from_secs(PRICE_CACHE_TTL_SECONDS)),
        );
        Ok(ticker)
    }

    /// Binance `/api/v3/klines` returns `[[open_time, O, H, L, C, V, close_time, …], …]`.
    async fn get_klines(
        &self,
        symbol: &str,
        interval: Timeframe,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let cache_key = format!("klines:{symbol}:{interval}:{limit}");

        if let Some(entry) = self.cache().klines.get(&cache_key) {
            if entry.is_valid() {
                trace!(cache_key = %cache_key, candles = entry.data.len(), "klines cache HIT");
                return Ok(entry.data.clone());
            }
        }

        trace!(cache_key = %cache_key, "klines cache MISS - fetching from API");

        let start = Instant::now();
        let limit_str = limit.to_string();
        let data = self
            .binance_get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol),
                    ("interval", interval.as_binance_interval()),
                    ("limit", &limit_str),
                ],
            )
            .await?;

        let candles = parse_klines(&data)
            .ok_or_else(|| ScannerError::unavailable("klines response not an array"))?;

        let ttl = klines_ttl(interval);
        debug!(
            symbol = symbol,
            interval = %interval,
            candles = candles.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            ttl_secs = ttl.as_secs(),
            latest_close = %candles.last().map(|c| c.close).unwrap_or_default(),
            "klines fetched and cached"
        );

        self.cache()
            .klines
            .insert(cache_key, CacheEntry::new(candles.clone(), ttl));
        Ok(candles)
    }

    async fn get_all_tradable_pairs(&self) -> Result<Vec<String>> {
        if let Some(entry) = &self.cache().pairs {
            if entry.is_valid() {
                return Ok(entry.data.clone());
            }
        }

        let data = self.binance_get("/api/v3/exchangeInfo", &[]).await?;
        let pairs = parse_tradable_pairs(&data, &self.config.quote_asset);

        info!(
            quote_asset = %self.config.quote_asset,
            pairs = pairs.len(),
            first = pairs.first().map(String::as_str).unwrap_or("-"),
            last = pairs.last().map(String::as_str).unwrap_or("-"),
            "tradable pairs loaded"
        );

        self.cache().pairs = Some(CacheEntry::new(
            pairs.clone(),
            Duration::from_secs(PAIRS_CACHE_TTL_SECONDS),
        ));
        Ok(pairs)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Free helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Parse a `serde_json::Value` that may be a number-as-string into `Decimal`.
fn parse_decimal_str(v: &Value) -> Decimal {
    v.as_str()
        .and_then(|s| s.parse::<Decimal>().ok())
        .or_else(|| v.as_f64().and_then(Decimal::from_f64))
        .unwrap_or(Decimal::ZERO)
}

/// Parse one `/api/v3/ticker/24hr` object.
fn parse_ticker(v: &Value) -> Option<TickerSnapshot> {
    let field = |name: &str| v.get(name).map(parse_decimal_str);
    Some(TickerSnapshot {
        symbol: v.get("symbol")?.as_str()?.to_string(),
        last_price: field("lastPrice")?,
        price_change_percent: field("priceChangePercent")?,
        volume: field("volume")?,
        quote_volume: field("quoteVolume")?,
    })
}

/// Parse one kline row; rows shorter than seven fields are skipped.
fn parse_kline_row(row: &Value) -> Option<Candle> {
    let items = row.as_array().filter(|a| a.len() >= 7)?;
    Some(Candle {
        open_time: items[0].as_i64()?,
        open: parse_decimal_str(&items[1]),
        high: parse_decimal_str(&items[2]),
        low: parse_decimal_str(&items[3]),
        close: parse_decimal_str(&items[4]),
        volume: parse_decimal_str(&items[5]),
        close_time: items[6].as_i64()?,
    })
}

/// `None` if the response is not an array at all.
fn parse_klines(data: &Value) -> Option<Vec<Candle>> {
    Some(data.as_array()?.iter().filter_map(parse_kline_row).collect())
}

/// Symbols quoted in `quote_asset`, status `TRADING` and open for spot
/// trading, sorted.
fn parse_tradable_pairs(data: &Value, quote_asset: &str) -> Vec<String> {
    let Some(symbols) = data.get("symbols").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut pairs: Vec<String> = symbols
        .iter()
        .filter(|s| {
            s.get("status").and_then(Value::as_str) == Some(BINANCE_TRADING_STATUS)
                && s.get("quoteAsset").and_then(Value::as_str) == Some(quote_asset)
                && is_spot_enabled(s)
        })
        .filter_map(|s| s.get("symbol").and_then(Value::as_str))
        .filter(|sym| sym.ends_with(quote_asset))
        .map(str::to_string)
        .collect();

    pairs.sort();
    pairs.dedup();
    pairs
}

fn is_spot_enabled(symbol: &Value) -> bool {
    if let Some(allowed) = symbol.get("isSpotTradingAllowed").and_then(Value::as_bool) {
        return allowed;
    }
    symbol
        .get("permissions")
        .and_then(Value::as_array)
        .is_some_and(|perms| perms.iter().any(|p| p.as_str() == Some("SPOT")))
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
