use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::timeframe::Timeframe;

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    pub app: AppConfig,
    pub data_source: DataSourceConfig,
    pub analysis: AnalysisConfig,
    pub scanner: ScanConfig,
    pub stream: Option<StreamConfig>,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

fn default_file_prefix() -> String {
    "scanner.log".into()
}

// ---------------------------------------------------------------------------
// data_source.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    /// Binance REST base, e.g. `https://api.binance.com`.
    pub base_url: String,
    /// Only symbols quoted in this asset are scanned.
    pub quote_asset: String,
    pub request_timeout_seconds: u64,
}

// ---------------------------------------------------------------------------
// analysis.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Candle interval for the full market analysis.
    pub interval: Timeframe,
    pub history_candles: u32,
    /// Candle interval for whale detection.
    pub whale_interval: Timeframe,
    pub whale_candles: u32,
    pub indicators: IndicatorParams,
    pub whale: WhaleParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_trend: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx_period: usize,
    pub atr_period: usize,
    /// Trailing window for the volume-profile average.
    pub volume_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: 50,
            ema_trend: 200,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            atr_period: 14,
            volume_window: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhaleParams {
    /// 24h quote volume (USD) above which a symbol counts as whale-active.
    #[serde(with = "rust_decimal::serde::str")]
    pub quote_volume_threshold_usd: Decimal,
    /// Number of trailing candles averaged for the volume-spike test.
    pub volume_lookback: usize,
}

impl Default for WhaleParams {
    fn default() -> Self {
        Self {
            quote_volume_threshold_usd: Decimal::from(1_000_000),
            volume_lookback: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// scanner.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    /// Minimum final confidence for a signal to be emitted.
    pub min_confidence: u32,
    pub symbol_timeout_seconds: u64,
}

// ---------------------------------------------------------------------------
// stream.json (optional)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub enabled: bool,
    pub binance_ws_url: String,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
    pub max_backoff_exponent: u32,
}
