//! Real-time 24h ticker feed over the Binance combined WebSocket stream.
//!
//! Subscribes to `<symbol>@ticker` for every watched symbol, keeps the latest
//! update per symbol and reconnects with exponential backoff until the
//! shutdown token fires.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::StreamConfig;

/// Connection state of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Idle,
    Connecting,
    Connected,
    Closed,
    Error,
}

/// Latest ticker values for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerUpdate {
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// Price carried by the previous update, if any.
    #[serde(with = "rust_decimal::serde::str_option")]
    pub prev_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    /// Event time in ms since epoch.
    pub event_time: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_change_percent: Decimal,
}

/// Reconnect delay for the given attempt: `base * 2^attempt`, capped at `max`.
pub fn backoff_delay(base_ms: u64, attempt: u32, max_ms: u64) -> Duration {
    let ms = base_ms.saturating_mul(2u64.saturating_pow(attempt)).min(max_ms);
    Duration::from_millis(ms)
}

pub struct TickerStream {
    config: StreamConfig,
    symbols: Vec<String>,
    tickers: RwLock<HashMap<String, TickerUpdate>>,
    status: RwLock<StreamStatus>,
    last_error: RwLock<Option<String>>,
    shutdown: CancellationToken,
    messages: AtomicU64,
    errors: AtomicU64,
}

impl TickerStream {
    pub fn new(config: StreamConfig, symbols: Vec<String>, shutdown: CancellationToken) -> Self {
        Self {
            config,
            symbols: symbols.iter().map(|s| s.to_uppercase()).collect(),
            tickers: RwLock::new(HashMap::new()),
            status: RwLock::new(StreamStatus::Idle),
            last_error: RwLock::new(None),
            shutdown,
            messages: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Combined stream URL for every watched symbol.
    pub fn stream_url(&self) -> String {
        let streams: Vec<String> = self
            .symbols
            .iter()
            .map(|s| format!("{}@ticker", s.to_lowercase()))
            .collect();
        format!(
            "{}/stream?streams={}",
            self.config.binance_ws_url.trim_end_matches('/'),
            streams.join("/")
        )
    }

    pub async fn status(&self) -> StreamStatus {
        *self.status.read().await
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }

    pub async fn ticker(&self, symbol: &str) -> Option<TickerUpdate> {
        self.tickers.read().await.get(&symbol.to_uppercase()).cloned()
    }

    pub async fn snapshot(&self) -> HashMap<String, TickerUpdate> {
        self.tickers.read().await.clone()
    }

    async fn set_status(&self, status: StreamStatus) {
        *self.status.write().await = status;
    }

    // -----------------------------------------------------------------------
    // Connection loop
    // -----------------------------------------------------------------------

    /// Run until cancelled, reconnecting after every disconnect.
    pub async fn run(&self) -> Result<()> {
        if !self.config.enabled || self.symbols.is_empty() {
            info!(
                enabled = self.config.enabled,
                symbols = self.symbols.len(),
                "ticker stream idle"
            );
            self.set_status(StreamStatus::Idle).await;
            return Ok(());
        }

        let url = self.stream_url();
        info!(symbols = ?self.symbols, url = %url, "ticker stream starting");

        let mut attempt = 0u32;
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            self.set_status(StreamStatus::Connecting).await;
            match self.connect_and_process(&url, &mut attempt).await {
                Ok(()) => self.set_status(StreamStatus::Closed).await,
                Err(e) => {
                    self.errors.fetch_add(1, Ordering::Relaxed);
                    *self.last_error.write().await = Some(e.to_string());
                    self.set_status(StreamStatus::Error).await;
                    warn!(error = %e, "ticker stream error");
                }
            }

            if self.shutdown.is_cancelled() {
                break;
            }

            attempt = (attempt + 1).min(self.config.max_backoff_exponent);
            let delay = backoff_delay(
                self.config.reconnect_delay_ms,
                attempt,
                self.config.max_reconnect_delay_ms,
            );
            warn!(
                attempt = attempt,
                next_retry_ms = delay.as_millis() as u64,
                "ticker stream disconnected, reconnecting"
            );

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.set_status(StreamStatus::Closed).await;
        let tickers = self.tickers.read().await.len();
        info!(
            messages = self.messages.load(Ordering::Relaxed),
            errors = self.errors.load(Ordering::Relaxed),
            tickers = tickers,
            "ticker stream stopped"
        );
        Ok(())
    }

    /// Connect and consume messages until the server closes the stream or
    /// shutdown fires. Resets `attempt` once connected.
    async fn connect_and_process(&self, url: &str, attempt: &mut u32) -> Result<()> {
        let connect_start = Instant::now();
        let (ws_stream, response) = connect_async(url)
            .await
            .context("failed to connect to binance websocket")?;

        *attempt = 0;
        *self.last_error.write().await = None;
        self.set_status(StreamStatus::Connected).await;
        info!(
            connect_time_ms = connect_start.elapsed().as_millis() as u64,
            status = ?response.status(),
            "ticker stream connected"
        );

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        self.messages.fetch_add(1, Ordering::Relaxed);
                        if let Err(e) = self.process_message(text.as_str()).await {
                            self.errors.fetch_add(1, Ordering::Relaxed);
                            warn!(error = %e, "skipping malformed ticker message");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        trace!("received ping, sending pong");
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!(error = %e, "failed to send pong");
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(
                            close_code = ?frame.as_ref().map(|f| f.code),
                            "ticker stream closed by server"
                        );
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(anyhow::anyhow!("websocket error: {e}")),
                    None => return Err(anyhow::anyhow!("websocket stream ended")),
                    _ => {}
                },
            }
        }
    }

    // -----------------------------------------------------------------------
    // Message handling
    // -----------------------------------------------------------------------

    /// Apply one combined-stream message. Messages without a ticker payload
    /// are ignored.
    async fn process_message(&self, text: &str) -> Result<()> {
        let wrapper: StreamWrapper =
            serde_json::from_str(text).context("failed to parse websocket message")?;
        if !wrapper.stream.ends_with("@ticker") {
            return Ok(());
        }

        let payload: TickerPayload =
            serde_json::from_value(wrapper.data).context("failed to parse ticker payload")?;

        let price = parse_decimal(&payload.close)?;
        let mut tickers = self.tickers.write().await;
        let prev_price = tickers.get(&payload.symbol).map(|t| t.price);
        let update = TickerUpdate {
            price,
            prev_price,
            open: parse_decimal(&payload.open)?,
            high: parse_decimal(&payload.high)?,
            low: parse_decimal(&payload.low)?,
            volume: parse_decimal(&payload.volume)?,
            event_time: payload.event_time,
            price_change_percent: parse_decimal(&payload.price_change_percent)?,
        };
        debug!(symbol = %payload.symbol, price = %price, "ticker update");
        tickers.insert(payload.symbol, update);
        Ok(())
    }
}

// ============================================================================
// Binance WebSocket Message Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct StreamWrapper {
    stream: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TickerPayload {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "E")]
    event_time: i64,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "v")]
    volume: String,
    #[serde(rename = "P")]
    price_change_percent: String,
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("failed to parse decimal: {s}"))
}
