//! Per-symbol market analysis service.
//!
//! Fetches data through a [`MarketDataGateway`] and runs the indicator,
//! pattern, scoring, whale and force-change pipelines on it. The assembly
//! step itself ([`analyze_candles`]) is pure so it can be exercised without a
//! gateway.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{Timelike, Utc};
use tracing::{debug, warn};

use super::force_change::assess_force_change;
use super::gateway::MarketDataGateway;
use super::indicators::compute_indicator_set;
use super::patterns::{detect_patterns, pattern_labels};
use super::signal_scorer::{best_entry_time, classify_volatility, score_signal};
use super::whale_detector::assess_whale;
use crate::config::{AnalysisConfig, IndicatorParams};
use crate::constants::{FORCE_CANDLES_1M, FORCE_CANDLES_5M};
use crate::errors::ScannerError;
use crate::types::{
    Candle, ForceChange, MarketAnalysis, TickerSnapshot, Timeframe, WhaleAssessment,
};

/// Build a [`MarketAnalysis`] from already-fetched data.
///
/// `hour_utc` is the current UTC hour, used for the entry-time hint.
pub fn analyze_candles(
    ticker: &TickerSnapshot,
    candles: &[Candle],
    params: &IndicatorParams,
    hour_utc: u32,
) -> MarketAnalysis {
    let indicators = compute_indicator_set(candles, params);
    let patterns = detect_patterns(candles);
    let score = score_signal(&indicators, &patterns);
    let volatility = classify_volatility(indicators.atr, ticker.last_price);

    MarketAnalysis {
        symbol: ticker.symbol.clone(),
        price: ticker.last_price,
        trend: score.trend,
        strength: indicators.adx,
        volatility,
        signal: score.signal,
        confidence: score.confidence,
        best_timeframe: volatility.best_timeframe(),
        entry_time: best_entry_time(score.signal, indicators.rsi, indicators.adx, hour_utc),
        patterns: pattern_labels(&patterns),
        probability: score.probability,
        reasons: score.reasons,
        indicators,
        whale: None,
    }
}

/// Gateway-backed analysis entry points.
pub struct MarketAnalyzer {
    gateway: Arc<dyn MarketDataGateway>,
    config: AnalysisConfig,
}

impl MarketAnalyzer {
    pub fn new(gateway: Arc<dyn MarketDataGateway>, config: AnalysisConfig) -> Self {
        Self { gateway, config }
    }

    // -----------------------------------------------------------------------
    // Full analysis
    // -----------------------------------------------------------------------

    /// Analyse `symbol` on the configured interval.
    ///
    /// Fails with [`ScannerError::DataUnavailable`] when the exchange has no
    /// ticker or no candles for it. Short histories are not an error.
    pub async fn analyze_market(&self, symbol: &str) -> Result<MarketAnalysis> {
        let start = Instant::now();
        let (ticker, candles) = tokio::join!(
            self.gateway.get_24h_ticker(symbol),
            self.gateway
                .get_klines(symbol, self.config.interval, self.config.history_candles),
        );

        let ticker = ticker
            .with_context(|| format!("fetching 24h ticker for {symbol}"))?
            .ok_or_else(|| ScannerError::unavailable(format!("24h ticker {symbol}")))?;
        let candles = candles.with_context(|| format!("fetching klines for {symbol}"))?;
        if candles.is_empty() {
            return Err(ScannerError::unavailable(format!("klines {symbol}")).into());
        }

        let analysis = analyze_candles(
            &ticker,
            &candles,
            &self.config.indicators,
            Utc::now().hour(),
        );

        debug!(
            symbol = symbol,
            candles = candles.len(),
            signal = %analysis.signal,
            confidence = analysis.confidence,
            adx = %analysis.strength.round_dp(1),
            rsi = %analysis.indicators.rsi.round_dp(1),
            latency_ms = start.elapsed().as_millis() as u64,
            "market analysed"
        );

        Ok(analysis)
    }

    // -----------------------------------------------------------------------
    // Whale movement
    // -----------------------------------------------------------------------

    /// Whale assessment, surfacing fetch failures.
    pub async fn try_detect_whale_movement(&self, symbol: &str) -> Result<WhaleAssessment> {
        let (ticker, candles) = tokio::join!(
            self.gateway.get_24h_ticker(symbol),
            self.gateway.get_klines(
                symbol,
                self.config.whale_interval,
                self.config.whale_candles
            ),
        );

        let ticker = ticker?.ok_or_else(|| ScannerError::unavailable(format!("24h ticker {symbol}")))?;
        let candles = candles?;

        let whale = assess_whale(&ticker, &candles, &self.config.whale);
        debug!(
            symbol = symbol,
            active = whale.is_whale_active,
            direction = ?whale.direction,
            strength = whale.strength,
            confidence = whale.confidence,
            "whale assessed"
        );
        Ok(whale)
    }

    /// Whale assessment; any failure yields an inactive assessment.
    pub async fn detect_whale_movement(&self, symbol: &str) -> WhaleAssessment {
        match self.try_detect_whale_movement(symbol).await {
            Ok(whale) => whale,
            Err(e) => {
                warn!(symbol = symbol, error = %e, "whale detection failed");
                WhaleAssessment::inactive()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Force change
    // -----------------------------------------------------------------------

    /// Short-horizon reversal check on 1m and 5m candles.
    pub async fn detect_force_change(&self, symbol: &str) -> ForceChange {
        let (candles_1m, candles_5m) = tokio::join!(
            self.gateway.get_klines(symbol, Timeframe::M1, FORCE_CANDLES_1M),
            self.gateway.get_klines(symbol, Timeframe::M5, FORCE_CANDLES_5M),
        );

        match (candles_1m, candles_5m) {
            (Ok(c1), Ok(c5)) => assess_force_change(&c1, &c5),
            (Err(e), _) | (_, Err(e)) => {
                warn!(symbol = symbol, error = %e, "force change detection failed");
                ForceChange::unknown("Erro na análise")
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Synthetic market data shared by analyzer and scanner tests.

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::config::{AnalysisConfig, IndicatorParams, WhaleParams};
    use crate::types::{Candle, TickerSnapshot, Timeframe};

    pub fn analysis_config() -> AnalysisConfig {
        AnalysisConfig {
            interval: Timeframe::H1,
            history_candles: 200,
            whale_interval: Timeframe::M5,
            whale_candles: 50,
            indicators: IndicatorParams::default(),
            whale: WhaleParams::default(),
        }
    }

    pub fn ticker(symbol: &str, price: Decimal, change: Decimal, quote_volume: Decimal) -> TickerSnapshot {
        TickerSnapshot {
            symbol: symbol.to_string(),
            last_price: price,
            price_change_percent: change,
            volume: dec!(10000),
            quote_volume,
        }
    }

    fn candle(i: usize, open: Decimal, close: Decimal, volume: Decimal) -> Candle {
        let open_time = i as i64 * 3_600_000;
        Candle {
            open_time,
            open,
            high: open.max(close) + dec!(1),
            low: open.min(close) - dec!(1),
            close,
            volume,
            close_time: open_time + 3_599_999,
        }
    }

    /// Build candles from closes, each opening at the previous close.
    fn from_closes(closes: &[Decimal], volume: impl Fn(usize) -> Decimal) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                candle(i, open, close, volume(i))
            })
            .collect()
    }

    /// 200 hourly candles accelerating from 100 to 150 with the last five
    /// bars on triple volume.
    pub fn trending_up_candles() -> Vec<Candle> {
        let closes: Vec<Decimal> = (0..200u64)
            .map(|i| dec!(100) + dec!(50) * Decimal::from(i * i) / Decimal::from(199u64 * 199))
            .collect();
        from_closes(&closes, |i| if i >= 195 { dec!(300) } else { dec!(100) })
    }

    /// Mirror of [`trending_up_candles`] falling from 150 to 100.
    pub fn trending_down_candles() -> Vec<Candle> {
        let closes: Vec<Decimal> = (0..200u64)
            .map(|i| dec!(150) - dec!(50) * Decimal::from(i * i) / Decimal::from(199u64 * 199))
            .collect();
        from_closes(&closes, |i| if i >= 195 { dec!(300) } else { dec!(100) })
    }

    /// Ten whale-window candles whose last bar carries `last_volume`.
    pub fn whale_candles(last_volume: Decimal) -> Vec<Candle> {
        (0..10)
            .map(|i| {
                let v = if i == 9 { last_volume } else { dec!(100) };
                candle(i, dec!(100), dec!(100), v)
            })
            .collect()
    }
}
