//! Batched whale-gated market scan.
//!
//! Symbols are processed in fixed-size batches. Every symbol in a batch is
//! analysed concurrently; batches run one after another with a fixed pause
//! so the upstream REST API is not rate limited. A signal is only emitted
//! when a whale is active in the same direction.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::future::join_all;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::market_analyzer::MarketAnalyzer;
use crate::config::ScanConfig;
use crate::constants::MAX_SCORE;
use crate::errors::ScannerError;
use crate::types::{MarketAnalysis, Signal, WhaleAssessment, WhaleContext};

/// Scans a caller-supplied symbol list for whale-confirmed signals.
pub struct MarketScanner {
    analyzer: Arc<MarketAnalyzer>,
    config: ScanConfig,
    shutdown: CancellationToken,
}

impl MarketScanner {
    pub fn new(analyzer: Arc<MarketAnalyzer>, config: ScanConfig, shutdown: CancellationToken) -> Self {
        Self {
            analyzer,
            config,
            shutdown,
        }
    }

    /// Scan `pairs` and return the surviving signals, highest confidence
    /// first.
    ///
    /// `on_progress(scanned, total, symbol)` fires once per symbol after its
    /// batch settles. Cancellation is honoured between batches and returns
    /// whatever was collected so far.
    pub async fn scan_all_pairs<F>(&self, pairs: &[String], mut on_progress: F) -> Vec<MarketAnalysis>
    where
        F: FnMut(usize, usize, &str),
    {
        let start = Instant::now();
        let total = pairs.len();
        let batch_size = self.config.batch_size.max(1);
        let batch_count = total.div_ceil(batch_size);
        let delay = Duration::from_millis(self.config.batch_delay_ms);

        info!(pairs = total, batch_size = batch_size, batches = batch_count, "market scan started");

        let mut results = Vec::new();
        let mut scanned = 0usize;
        let mut failures = 0usize;

        for (index, batch) in pairs.chunks(batch_size).enumerate() {
            if self.shutdown.is_cancelled() {
                warn!(scanned = scanned, total = total, "scan cancelled");
                break;
            }

            debug!(
                batch = index + 1,
                batches = batch_count,
                size = batch.len(),
                first = batch.first().map(String::as_str).unwrap_or_default(),
                last = batch.last().map(String::as_str).unwrap_or_default(),
                "scanning batch"
            );

            let outcomes = join_all(batch.iter().map(|symbol| self.scan_symbol(symbol))).await;

            let mut found = 0usize;
            for (symbol, outcome) in batch.iter().zip(outcomes) {
                scanned += 1;
                on_progress(scanned, total, symbol);
                match outcome {
                    Ok(Some(analysis)) => {
                        info!(
                            symbol = %symbol,
                            signal = %analysis.signal,
                            confidence = analysis.confidence,
                            "signal found"
                        );
                        found += 1;
                        results.push(analysis);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        failures += 1;
                        warn!(symbol = %symbol, error = %e, "symbol analysis failed");
                    }
                }
            }
            debug!(batch = index + 1, signals = found, "batch complete");

            if index + 1 < batch_count {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        warn!(scanned = scanned, total = total, "scan cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        results.sort_by(|a, b| b.confidence.cmp(&a.confidence));

        let avg_confidence = if results.is_empty() {
            0
        } else {
            results.iter().map(|r| u64::from(r.confidence)).sum::<u64>() / results.len() as u64
        };
        info!(
            scanned = scanned,
            total = total,
            signals = results.len(),
            buy = results.iter().filter(|r| r.signal == Signal::Buy).count(),
            sell = results.iter().filter(|r| r.signal == Signal::Sell).count(),
            failures = failures,
            avg_confidence = avg_confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "market scan complete"
        );

        results
    }

    /// Analyse one symbol with its whale assessment under the per-symbol
    /// timeout. `Ok(None)` means the symbol produced no signal.
    async fn scan_symbol(&self, symbol: &str) -> Result<Option<MarketAnalysis>> {
        let seconds = self.config.symbol_timeout_seconds;
        let (analysis, whale) = tokio::time::timeout(Duration::from_secs(seconds), async {
            tokio::join!(
                self.analyzer.analyze_market(symbol),
                self.analyzer.try_detect_whale_movement(symbol),
            )
        })
        .await
        .map_err(|_| ScannerError::Timeout {
            name: symbol.to_string(),
            seconds,
        })?;

        Ok(apply_whale_gate(analysis?, &whale?, self.config.min_confidence))
    }
}

/// Gate a signal on whale activity.
///
/// Returns `None` when no whale is active, when a directional signal runs
/// against the whale, or when the boosted confidence stays under
/// `min_confidence`. Survivors carry the whale context, whale reasons first.
pub fn apply_whale_gate(
    mut analysis: MarketAnalysis,
    whale: &WhaleAssessment,
    min_confidence: u32,
) -> Option<MarketAnalysis> {
    if !whale.is_whale_active {
        debug!(symbol = %analysis.symbol, "no whale activity");
        return None;
    }

    let whale_signal = whale.direction.as_signal();
    if analysis.signal.is_directional() && analysis.signal != whale_signal {
        debug!(
            symbol = %analysis.symbol,
            signal = %analysis.signal,
            whale = %whale_signal,
            "signal ignored, whale trades the other way"
        );
        return None;
    }

    analysis.confidence = analysis.confidence.max(whale.confidence).min(MAX_SCORE);

    let whale_reasons = [
        format!(
            "🐋 BALEIA ATIVA! Volume: ${:.2}M",
            whale.volume / Decimal::from(1_000_000)
        ),
        format!("💪 Força: {}/100", whale.strength),
        format!("🎯 Alvo da Baleia: ${:.2}", whale.price_target),
        format!("⏱️ Duração Estimada: {}", whale.estimated_duration),
    ];
    let signal_reasons = std::mem::take(&mut analysis.reasons);
    analysis.reasons = whale_reasons.into_iter().chain(signal_reasons).collect();

    analysis.whale = Some(WhaleContext {
        price_target: whale.price_target,
        estimated_duration: whale.estimated_duration.clone(),
        strength: whale.strength,
        volume: whale.volume,
    });

    (analysis.confidence >= min_confidence).then_some(analysis)
}
