pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`ScannerConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   data_source.json
///   analysis.json
///   scanner.json
///   stream.json   (optional)
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                         | Config Field                               |
/// |---------------------------------|--------------------------------------------|
/// | `BINANCE_API_URL`               | `data_source.base_url`                     |
/// | `SCANNER_QUOTE_ASSET`           | `data_source.quote_asset`                  |
/// | `SCANNER_BATCH_SIZE`            | `scanner.batch_size`                       |
/// | `SCANNER_BATCH_DELAY_MS`        | `scanner.batch_delay_ms`                   |
/// | `SCANNER_MIN_CONFIDENCE`        | `scanner.min_confidence`                   |
/// | `WHALE_QUOTE_VOLUME_THRESHOLD`  | `analysis.whale.quote_volume_threshold_usd`|
pub fn load_config(config_dir: &Path) -> Result<ScannerConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let data_source: DataSourceConfig =
        serde_json::from_str(&read("data_source.json")?).context("parsing data_source.json")?;

    let analysis: AnalysisConfig =
        serde_json::from_str(&read("analysis.json")?).context("parsing analysis.json")?;

    let scanner: ScanConfig =
        serde_json::from_str(&read("scanner.json")?).context("parsing scanner.json")?;

    // Stream config is optional.
    let stream: Option<StreamConfig> = match read("stream.json") {
        Ok(contents) => Some(serde_json::from_str(&contents).context("parsing stream.json")?),
        Err(_) => None,
    };

    let mut config = ScannerConfig {
        app,
        data_source,
        analysis,
        scanner,
        stream,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are skipped and the
/// JSON value remains.
fn apply_env_overrides(config: &mut ScannerConfig) {
    // -- Data source ---------------------------------------------------------
    if let Some(val) = env_string("BINANCE_API_URL") {
        info!(url = %val, "env override: BINANCE_API_URL");
        config.data_source.base_url = val;
    }

    if let Some(val) = env_string("SCANNER_QUOTE_ASSET") {
        let val = val.to_uppercase();
        info!(quote_asset = %val, "env override: SCANNER_QUOTE_ASSET");
        config.data_source.quote_asset = val;
    }

    // -- Scanner -------------------------------------------------------------
    if let Some(val) = env_parse::<usize>("SCANNER_BATCH_SIZE") {
        info!(val, "env override: SCANNER_BATCH_SIZE");
        config.scanner.batch_size = val;
    }

    if let Some(val) = env_parse::<u64>("SCANNER_BATCH_DELAY_MS") {
        info!(val, "env override: SCANNER_BATCH_DELAY_MS");
        config.scanner.batch_delay_ms = val;
    }

    if let Some(val) = env_parse::<u32>("SCANNER_MIN_CONFIDENCE") {
        info!(val, "env override: SCANNER_MIN_CONFIDENCE");
        config.scanner.min_confidence = val;
    }

    // -- Whale ---------------------------------------------------------------
    if let Some(val) = env_decimal("WHALE_QUOTE_VOLUME_THRESHOLD") {
        info!(%val, "env override: WHALE_QUOTE_VOLUME_THRESHOLD");
        config.analysis.whale.quote_volume_threshold_usd = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

/// Read a non-empty env var and parse it as `Decimal`.
fn env_decimal(key: &str) -> Option<Decimal> {
    env_string(key).and_then(|v| Decimal::from_str(&v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::timeframe::Timeframe;
    use rust_decimal_macros::dec;
    use serial_test::serial;
    use std::path::PathBuf;

    fn project_config_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
    }

    // -----------------------------------------------------------------------
    // Helper: write a minimal set of config JSON files to a temp dir.
    // -----------------------------------------------------------------------

    fn write_test_configs(dir: &Path) {
        std::fs::write(
            dir.join("app.json"),
            r#"{ "logging": { "log_dir": "logs" } }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("data_source.json"),
            r#"{
                "base_url": "https://api.binance.com",
                "quote_asset": "USDT",
                "request_timeout_seconds": 10
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("analysis.json"),
            r#"{
                "interval": "1h",
                "history_candles": 200,
                "whale_interval": "5m",
                "whale_candles": 50,
                "indicators": {
                    "ema_fast": 50,
                    "ema_trend": 200,
                    "rsi_period": 14,
                    "macd_fast": 12,
                    "macd_slow": 26,
                    "macd_signal": 9,
                    "adx_period": 14,
                    "atr_period": 14,
                    "volume_window": 20
                },
                "whale": {
                    "quote_volume_threshold_usd": "1000000",
                    "volume_lookback": 10
                }
            }"#,
        )
        .unwrap();

        std::fs::write(
            dir.join("scanner.json"),
            r#"{
                "batch_size": 20,
                "batch_delay_ms": 300,
                "min_confidence": 70,
                "symbol_timeout_seconds": 10
            }"#,
        )
        .unwrap();
    }

    // -----------------------------------------------------------------------
    // Env cleanup helper
    // -----------------------------------------------------------------------

    /// Remove all scanner-related env vars so tests don't interfere with each other.
    fn clean_scanner_env() {
        for key in [
            "BINANCE_API_URL",
            "SCANNER_QUOTE_ASSET",
            "SCANNER_BATCH_SIZE",
            "SCANNER_BATCH_DELAY_MS",
            "SCANNER_MIN_CONFIDENCE",
            "WHALE_QUOTE_VOLUME_THRESHOLD",
        ] {
            std::env::remove_var(key);
        }
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[test]
    #[serial]
    fn test_load_real_configs() {
        clean_scanner_env();
        let dir = project_config_dir();
        if !dir.exists() {
            eprintln!("skipping, config dir not found at {}", dir.display());
            return;
        }
        let config = load_config(&dir).expect("config should load and validate");
        assert_eq!(config.analysis.interval, Timeframe::H1);
        assert_eq!(config.scanner.batch_size, 20);
        assert!(config.stream.is_some());
    }

    #[test]
    #[serial]
    fn test_load_test_configs() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        let config = load_config(tmp.path()).expect("test config should load");
        assert_eq!(config.data_source.quote_asset, "USDT");
        assert_eq!(config.analysis.whale_interval, Timeframe::M5);
        assert_eq!(
            config.analysis.whale.quote_volume_threshold_usd,
            dec!(1000000)
        );
        assert_eq!(config.app.logging.file_prefix, "scanner.log");
        assert!(config.app.logging.filter.is_none());
        assert!(config.stream.is_none());
    }

    #[test]
    #[serial]
    fn test_missing_config_file_errors() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(
            format!("{err:#}").contains("app.json"),
            "error should name the missing file: {err:#}"
        );
    }

    #[test]
    #[serial]
    fn test_malformed_json_names_file() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        std::fs::write(tmp.path().join("scanner.json"), "{ not json").unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing scanner.json"));
    }

    #[test]
    #[serial]
    fn test_env_override_scanner_fields() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("SCANNER_BATCH_SIZE", "5");
        std::env::set_var("SCANNER_BATCH_DELAY_MS", "1000");
        std::env::set_var("SCANNER_MIN_CONFIDENCE", "80");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.scanner.batch_size, 5);
        assert_eq!(config.scanner.batch_delay_ms, 1000);
        assert_eq!(config.scanner.min_confidence, 80);
        clean_scanner_env();
    }

    #[test]
    #[serial]
    fn test_env_override_data_source() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("BINANCE_API_URL", "https://api.binance.us");
        std::env::set_var("SCANNER_QUOTE_ASSET", "fdusd");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.data_source.base_url, "https://api.binance.us");
        assert_eq!(config.data_source.quote_asset, "FDUSD");
        clean_scanner_env();
    }

    #[test]
    #[serial]
    fn test_env_override_whale_threshold() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("WHALE_QUOTE_VOLUME_THRESHOLD", "2500000.5");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(
            config.analysis.whale.quote_volume_threshold_usd,
            dec!(2500000.5)
        );
        clean_scanner_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_string_ignored() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("SCANNER_BATCH_SIZE", "");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.scanner.batch_size, 20);
        clean_scanner_env();
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_parse_ignored() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("SCANNER_BATCH_SIZE", "twenty");
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.scanner.batch_size, 20);
        clean_scanner_env();
    }

    #[test]
    #[serial]
    fn test_env_override_still_validated() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());

        std::env::set_var("SCANNER_MIN_CONFIDENCE", "99");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("min_confidence (99)"));
        clean_scanner_env();
    }

    #[test]
    #[serial]
    fn test_optional_stream_config_loaded() {
        clean_scanner_env();
        let tmp = tempfile::tempdir().unwrap();
        write_test_configs(tmp.path());
        std::fs::write(
            tmp.path().join("stream.json"),
            r#"{
                "enabled": true,
                "binance_ws_url": "wss://stream.binance.com:9443",
                "reconnect_delay_ms": 1000,
                "max_reconnect_delay_ms": 30000,
                "max_backoff_exponent": 8
            }"#,
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        let stream = config.stream.expect("stream.json present");
        assert_eq!(stream.max_reconnect_delay_ms, 30_000);
    }
}
