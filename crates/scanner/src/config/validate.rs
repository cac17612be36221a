use anyhow::{bail, Result};
use rust_decimal::Decimal;

use super::types::ScannerConfig;
use crate::constants::MAX_SCORE;

/// Binance caps `/api/v3/klines` at 1000 rows per request.
const MAX_KLINE_LIMIT: u32 = 1000;

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Called automatically by [`super::load_config`].
pub fn validate_config(config: &ScannerConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_data_source_config(config, &mut errors);
    validate_analysis_config(config, &mut errors);
    validate_scanner_config(config, &mut errors);
    validate_stream_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

fn validate_data_source_config(config: &ScannerConfig, errors: &mut Vec<String>) {
    let ds = &config.data_source;

    if !ds.base_url.starts_with("http://") && !ds.base_url.starts_with("https://") {
        errors.push(format!(
            "data_source: base_url '{}' must be an http(s) URL",
            ds.base_url
        ));
    }
    if ds.quote_asset.trim().is_empty() {
        errors.push("data_source: quote_asset is empty".into());
    }
    if ds.request_timeout_seconds == 0 {
        errors.push("data_source: request_timeout_seconds must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

fn validate_analysis_config(config: &ScannerConfig, errors: &mut Vec<String>) {
    let a = &config.analysis;

    for (name, count) in [
        ("history_candles", a.history_candles),
        ("whale_candles", a.whale_candles),
    ] {
        if count == 0 || count > MAX_KLINE_LIMIT {
            errors.push(format!(
                "analysis: {name} ({count}) must be in 1..={MAX_KLINE_LIMIT}"
            ));
        }
    }

    let ind = &a.indicators;
    let periods = [
        ("ema_fast", ind.ema_fast),
        ("ema_trend", ind.ema_trend),
        ("rsi_period", ind.rsi_period),
        ("macd_fast", ind.macd_fast),
        ("macd_slow", ind.macd_slow),
        ("macd_signal", ind.macd_signal),
        ("adx_period", ind.adx_period),
        ("atr_period", ind.atr_period),
        ("volume_window", ind.volume_window),
    ];
    for (name, period) in periods {
        if period == 0 {
            errors.push(format!("analysis.indicators: {name} must be > 0"));
        }
    }

    if ind.macd_fast >= ind.macd_slow {
        errors.push(format!(
            "analysis.indicators: macd_fast ({}) must be < macd_slow ({})",
            ind.macd_fast, ind.macd_slow
        ));
    }
    if ind.ema_fast >= ind.ema_trend {
        errors.push(format!(
            "analysis.indicators: ema_fast ({}) must be < ema_trend ({})",
            ind.ema_fast, ind.ema_trend
        ));
    }

    if a.whale.quote_volume_threshold_usd <= Decimal::ZERO {
        errors.push(format!(
            "analysis.whale: quote_volume_threshold_usd ({}) must be positive",
            a.whale.quote_volume_threshold_usd
        ));
    }
    if a.whale.volume_lookback == 0 {
        errors.push("analysis.whale: volume_lookback must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

fn validate_scanner_config(config: &ScannerConfig, errors: &mut Vec<String>) {
    let s = &config.scanner;

    if s.batch_size == 0 {
        errors.push("scanner: batch_size must be > 0".into());
    }
    if s.min_confidence > MAX_SCORE {
        errors.push(format!(
            "scanner: min_confidence ({}) can never be reached, scores cap at {MAX_SCORE}",
            s.min_confidence
        ));
    }
    if s.symbol_timeout_seconds == 0 {
        errors.push("scanner: symbol_timeout_seconds must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

fn validate_stream_config(config: &ScannerConfig, errors: &mut Vec<String>) {
    let Some(stream) = &config.stream else {
        return;
    };
    if !stream.enabled {
        return;
    }

    if !stream.binance_ws_url.starts_with("wss://") && !stream.binance_ws_url.starts_with("ws://")
    {
        errors.push(format!(
            "stream: binance_ws_url '{}' must be a ws(s) URL",
            stream.binance_ws_url
        ));
    }
    if stream.reconnect_delay_ms == 0 {
        errors.push("stream: reconnect_delay_ms must be > 0".into());
    }
    if stream.reconnect_delay_ms > stream.max_reconnect_delay_ms {
        errors.push(format!(
            "stream: reconnect_delay_ms ({}) must be <= max_reconnect_delay_ms ({})",
            stream.reconnect_delay_ms, stream.max_reconnect_delay_ms
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::*;
    use crate::types::timeframe::Timeframe;
    use rust_decimal_macros::dec;

    fn valid_config() -> ScannerConfig {
        ScannerConfig {
            app: AppConfig {
                logging: LoggingConfig {
                    log_dir: "logs".into(),
                    file_prefix: "scanner.log".into(),
                    filter: None,
                },
            },
            data_source: DataSourceConfig {
                base_url: "https://api.binance.com".into(),
                quote_asset: "USDT".into(),
                request_timeout_seconds: 10,
            },
            analysis: AnalysisConfig {
                interval: Timeframe::H1,
                history_candles: 200,
                whale_interval: Timeframe::M5,
                whale_candles: 50,
                indicators: IndicatorParams::default(),
                whale: WhaleParams::default(),
            },
            scanner: ScanConfig {
                batch_size: 20,
                batch_delay_ms: 300,
                min_confidence: 70,
                symbol_timeout_seconds: 10,
            },
            stream: Some(StreamConfig {
                enabled: true,
                binance_ws_url: "wss://stream.binance.com:9443".into(),
                reconnect_delay_ms: 1000,
                max_reconnect_delay_ms: 30_000,
                max_backoff_exponent: 8,
            }),
        }
    }

    fn error_text(config: &ScannerConfig) -> String {
        validate_config(config).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_macd_periods_must_be_ordered() {
        let mut config = valid_config();
        config.analysis.indicators.macd_fast = 26;
        let msg = error_text(&config);
        assert!(msg.contains("macd_fast (26) must be < macd_slow (26)"), "{msg}");
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = valid_config();
        config.scanner.batch_size = 0;
        config.scanner.min_confidence = 96;
        config.analysis.history_candles = 1001;
        let msg = error_text(&config);
        assert!(msg.starts_with("Configuration validation failed (3 errors)"), "{msg}");
        assert!(msg.contains("batch_size must be > 0"));
        assert!(msg.contains("min_confidence (96)"));
        assert!(msg.contains("history_candles (1001)"));
    }

    #[test]
    fn test_zero_period_rejected() {
        let mut config = valid_config();
        config.analysis.indicators.rsi_period = 0;
        assert!(error_text(&config).contains("rsi_period must be > 0"));
    }

    #[test]
    fn test_whale_threshold_must_be_positive() {
        let mut config = valid_config();
        config.analysis.whale.quote_volume_threshold_usd = dec!(0);
        assert!(error_text(&config).contains("quote_volume_threshold_usd (0) must be positive"));
    }

    #[test]
    fn test_stream_delays_ordered() {
        let mut config = valid_config();
        if let Some(stream) = config.stream.as_mut() {
            stream.reconnect_delay_ms = 60_000;
        }
        assert!(error_text(&config).contains("must be <= max_reconnect_delay_ms"));
    }

    #[test]
    fn test_disabled_stream_skips_checks() {
        let mut config = valid_config();
        if let Some(stream) = config.stream.as_mut() {
            stream.enabled = false;
            stream.binance_ws_url = "not-a-url".into();
        }
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_base_url_scheme() {
        let mut config = valid_config();
        config.data_source.base_url = "api.binance.com".into();
        assert!(error_text(&config).contains("must be an http(s) URL"));
    }
}
