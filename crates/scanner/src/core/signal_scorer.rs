//! Composite signal scoring.
//!
//! Turns an [`IndicatorSet`] plus detected patterns into a discrete
//! COMPRA / VENDA / NEUTRO signal with a confidence score, an independent
//! probability score and the reasons behind them. Trend-strength gating is
//! absolute: with ADX at or below 25 the signal is always NEUTRO.

use rust_decimal::Decimal;

use super::patterns::CandlePattern;
use crate::constants::{
    ADX_STRONG, ADX_TREND_THRESHOLD, ADX_VERY_STRONG, BASE_CONFIDENCE, DIRECTIONAL_CONFIDENCE,
    MAX_SCORE, RSI_ENTRY_BUY, RSI_ENTRY_SELL, RSI_OVERBOUGHT, RSI_OVERSOLD, VOLATILITY_HIGH,
    VOLATILITY_MEDIUM, VOLATILITY_VERY_HIGH,
};
use crate::types::{IndicatorSet, Signal, Trend, Volatility, VolumeProfile};

/// Output of [`score_signal`].
#[derive(Debug, Clone, PartialEq)]
pub struct SignalScore {
    pub trend: Trend,
    pub signal: Signal,
    /// `[0, 95]`.
    pub confidence: u32,
    /// `[0, 95]`.
    pub probability: u32,
    pub reasons: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Scoring
// ═══════════════════════════════════════════════════════════════════════════

/// EMA-fast above EMA-trend is bullish; ties are bearish.
pub fn ema_trend(indicators: &IndicatorSet) -> Trend {
    if indicators.ema_50 > indicators.ema_200 {
        Trend::Bullish
    } else {
        Trend::Bearish
    }
}

fn macd_bullish(indicators: &IndicatorSet) -> bool {
    indicators.macd_histogram > Decimal::ZERO
}

/// Score the composite signal.
///
/// Precedence: BUY when trend, ADX and MACD agree bullish; SELL when they
/// agree bearish; otherwise NEUTRO at the base confidence. Only BUY gets the
/// pattern bonus.
pub fn score_signal(indicators: &IndicatorSet, patterns: &[CandlePattern]) -> SignalScore {
    let trend = ema_trend(indicators);
    let macd_up = macd_bullish(indicators);
    let trending = indicators.adx > ADX_TREND_THRESHOLD;
    let strong_volume = indicators.volume_profile == VolumeProfile::Strong;
    let adx_text = format!("{:.1}", indicators.adx);

    let mut reasons = Vec::new();
    let (signal, confidence) = if trend == Trend::Bullish && trending && macd_up {
        let mut confidence = DIRECTIONAL_CONFIDENCE;
        reasons.push("✅ Tendência de alta confirmada (EMA50 > EMA200)".to_string());
        reasons.push(format!("✅ Força forte (ADX: {adx_text})"));
        reasons.push("✅ MACD positivo".to_string());

        if indicators.rsi < RSI_OVERSOLD {
            confidence += 10;
            reasons.push("✅ RSI sobrevendido - momento de compra".to_string());
        }
        if strong_volume {
            confidence += 10;
            reasons.push("✅ Volume forte sustentando alta".to_string());
        }
        if let Some(first) = patterns.first() {
            confidence += 5;
            reasons.push(format!("✅ Padrão detectado: {}", first.label()));
        }
        (Signal::Buy, confidence)
    } else if trend == Trend::Bearish && trending && !macd_up {
        let mut confidence = DIRECTIONAL_CONFIDENCE;
        reasons.push("⚠️ Tendência de baixa confirmada (EMA50 < EMA200)".to_string());
        reasons.push(format!("⚠️ Força forte (ADX: {adx_text})"));
        reasons.push("⚠️ MACD negativo".to_string());

        if indicators.rsi > RSI_OVERBOUGHT {
            confidence += 10;
            reasons.push("⚠️ RSI sobrecomprado - momento de venda".to_string());
        }
        if strong_volume {
            confidence += 10;
            reasons.push("⚠️ Volume forte pressionando baixa".to_string());
        }
        (Signal::Sell, confidence)
    } else {
        reasons.push("⏸️ Mercado lateral ou sem força suficiente".to_string());
        reasons.push(format!("⏸️ ADX: {adx_text} (abaixo de 25)"));
        (Signal::Neutral, BASE_CONFIDENCE)
    };

    SignalScore {
        trend,
        signal,
        confidence: confidence.min(MAX_SCORE),
        probability: probability(indicators, patterns.len()),
        reasons,
    }
}

/// Independent reliability score, starting at 50 and capped at 95.
pub fn probability(indicators: &IndicatorSet, pattern_count: usize) -> u32 {
    let mut p = BASE_CONFIDENCE;

    if ema_trend(indicators) == Trend::Bullish && macd_bullish(indicators) {
        p += 15;
    }
    if indicators.adx > ADX_STRONG {
        p += 10;
    }
    if indicators.adx > ADX_VERY_STRONG {
        p += 5;
    }
    if indicators.rsi < RSI_OVERSOLD || indicators.rsi > RSI_OVERBOUGHT {
        p += 10;
    }
    if indicators.volume_profile == VolumeProfile::Strong {
        p += 10;
    }
    if pattern_count > 0 {
        p += 5;
    }

    p.min(MAX_SCORE)
}

// ═══════════════════════════════════════════════════════════════════════════
// Context
// ═══════════════════════════════════════════════════════════════════════════

/// Classify ATR as a fraction of price.
pub fn classify_volatility(atr: Decimal, price: Decimal) -> Volatility {
    if atr > price * VOLATILITY_VERY_HIGH {
        Volatility::VeryHigh
    } else if atr > price * VOLATILITY_HIGH {
        Volatility::High
    } else if atr > price * VOLATILITY_MEDIUM {
        Volatility::Medium
    } else {
        Volatility::Low
    }
}

/// Entry timing hint for a scored signal at `hour_utc`.
pub fn best_entry_time(signal: Signal, rsi: Decimal, adx: Decimal, hour_utc: u32) -> String {
    let ideal = adx > ADX_TREND_THRESHOLD
        && match signal {
            Signal::Buy => rsi < RSI_ENTRY_BUY,
            Signal::Sell => rsi > RSI_ENTRY_SELL,
            Signal::Neutral => false,
        };

    if ideal {
        "Agora - Condições ideais".to_string()
    } else {
        format!("Aguardar próximo candle ({:02}:00 UTC)", (hour_utc + 1) % 24)
    }
}
