use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use market_scanner::config;
use market_scanner::config::StreamConfig;
use market_scanner::core::data_service::BinanceDataService;
use market_scanner::core::gateway::MarketDataGateway;
use market_scanner::core::market_analyzer::MarketAnalyzer;
use market_scanner::core::scanner::MarketScanner;
use market_scanner::core::ticker_stream::TickerStream;
use market_scanner::logging;
use market_scanner::types::MarketAnalysis;

/// Interval between live ticker summaries while watching signals.
const WATCH_LOG_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("SCANNER_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Hold the guard for the process lifetime.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        base_url = %config.data_source.base_url,
        quote_asset = %config.data_source.quote_asset,
        interval = %config.analysis.interval,
        batch_size = config.scanner.batch_size,
        min_confidence = config.scanner.min_confidence,
        "market scanner starting"
    );

    // -----------------------------------------------------------------------
    // Component construction
    // -----------------------------------------------------------------------

    let gateway: Arc<dyn MarketDataGateway> =
        Arc::new(BinanceDataService::new(config.data_source.clone())?);
    let analyzer = Arc::new(MarketAnalyzer::new(gateway.clone(), config.analysis.clone()));

    let shutdown = CancellationToken::new();
    let scanner = MarketScanner::new(analyzer.clone(), config.scanner.clone(), shutdown.clone());

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received, stopping gracefully...");
                ctrl_c_token.cancel();
            }
            Err(e) => error!(error = %e, "failed to listen for Ctrl+C"),
        }
    });

    // -----------------------------------------------------------------------
    // Scan
    // -----------------------------------------------------------------------

    let args: Vec<String> = std::env::args().skip(1).map(|s| s.to_uppercase()).collect();
    let pairs = if args.is_empty() {
        gateway
            .get_all_tradable_pairs()
            .await
            .context("failed to list tradable pairs")?
    } else {
        args
    };

    let results = scanner
        .scan_all_pairs(&pairs, |scanned, total, symbol| {
            debug!(scanned = scanned, total = total, symbol = symbol, "scan progress");
        })
        .await;

    for analysis in &results {
        log_signal(&analyzer, analysis).await;
    }

    let json = serde_json::to_string_pretty(&results).context("failed to serialize scan results")?;
    println!("{json}");

    // -----------------------------------------------------------------------
    // Live prices for the signals found
    // -----------------------------------------------------------------------

    if let Some(stream_config) = config.stream.filter(|s| s.enabled) {
        if !results.is_empty() && !shutdown.is_cancelled() {
            let symbols = results.iter().map(|a| a.symbol.clone()).collect();
            watch_signals(stream_config, symbols, shutdown.clone()).await;
        }
    }

    info!("market scanner stopped");
    Ok(())
}

/// Log a surviving signal together with its short-horizon force check.
async fn log_signal(analyzer: &MarketAnalyzer, analysis: &MarketAnalysis) {
    let force = analyzer.detect_force_change(&analysis.symbol).await;
    info!(
        symbol = %analysis.symbol,
        signal = %analysis.signal,
        confidence = analysis.confidence,
        probability = analysis.probability,
        price = %analysis.price,
        whale_target = ?analysis.whale.as_ref().map(|w| w.price_target),
        best_timeframe = %analysis.best_timeframe,
        entry = %analysis.entry_time,
        force_changing = force.is_changing,
        force_direction = ?force.new_direction,
        force_reason = %force.reason,
        "signal"
    );
}

/// Stream live tickers for `symbols` until Ctrl+C.
async fn watch_signals(config: StreamConfig, symbols: Vec<String>, shutdown: CancellationToken) {
    let stream = Arc::new(TickerStream::new(config, symbols, shutdown.clone()));
    info!("watching live prices, press Ctrl+C to exit");

    let runner = stream.clone();
    let handle = tokio::spawn(async move {
        if let Err(e) = runner.run().await {
            error!(error = %e, "ticker stream exited with error");
        }
    });

    let mut interval = tokio::time::interval(WATCH_LOG_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let status = stream.status().await;
                for (symbol, ticker) in stream.snapshot().await {
                    info!(
                        symbol = %symbol,
                        price = %ticker.price,
                        prev_price = ?ticker.prev_price,
                        change_pct = %ticker.price_change_percent,
                        status = ?status,
                        "live ticker"
                    );
                }
                if let Some(e) = stream.last_error().await {
                    warn!(error = %e, status = ?status, "ticker stream degraded");
                }
            }
        }
    }

    if let Err(e) = handle.await {
        error!(error = %e, "ticker stream task panicked");
    }
}
