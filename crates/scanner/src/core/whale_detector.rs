//! Whale-movement heuristic.
//!
//! A symbol is whale-active when its 24h quote volume is large, its latest
//! bar volume spikes, or it moves strongly on above-average volume. Active
//! whales with a clear 24h direction get a strength, confidence, price
//! target and duration estimate.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::indicators::trailing_average;
use crate::config::WhaleParams;
use crate::constants::{
    BASE_CONFIDENCE, DURATION_GIANT, DURATION_LARGE, DURATION_NORMAL, DURATION_UNKNOWN,
    MAX_WHALE_CONFIDENCE, MAX_WHALE_STRENGTH, STRONG_VOLUME_MULTIPLE, WHALE_DIRECTION_CHANGE_PCT,
    WHALE_STRONG_MOVE_PCT, WHALE_VOLUME_SPIKE_MULTIPLE,
};
use crate::types::{Candle, TickerSnapshot, WhaleAssessment, WhaleDirection};

/// Assess whale activity from the 24h ticker and recent candles.
///
/// The trailing average covers the last `volume_lookback` candle volumes,
/// the latest bar included. Empty `candles` yield
/// [`WhaleAssessment::inactive`].
pub fn assess_whale(
    ticker: &TickerSnapshot,
    candles: &[Candle],
    params: &WhaleParams,
) -> WhaleAssessment {
    let Some(latest) = candles.last() else {
        return WhaleAssessment::inactive();
    };

    let quote_volume = ticker.quote_volume;
    let change = ticker.price_change_percent;
    let price = ticker.last_price;
    let threshold = params.quote_volume_threshold_usd;

    let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();
    let avg_volume = trailing_average(&volumes, params.volume_lookback);
    let current_volume = latest.volume;

    let is_high_volume = quote_volume > threshold;
    let is_volume_spike = current_volume > avg_volume * WHALE_VOLUME_SPIKE_MULTIPLE;
    let is_strong_move = change.abs() > WHALE_STRONG_MOVE_PCT
        && current_volume > avg_volume * STRONG_VOLUME_MULTIPLE;
    let is_whale_active = is_high_volume || is_volume_spike || is_strong_move;

    let direction = if !is_whale_active {
        WhaleDirection::Neutral
    } else if change > WHALE_DIRECTION_CHANGE_PCT {
        WhaleDirection::Buy
    } else if change < -WHALE_DIRECTION_CHANGE_PCT {
        WhaleDirection::Sell
    } else {
        WhaleDirection::Neutral
    };

    if direction == WhaleDirection::Neutral {
        return WhaleAssessment {
            is_whale_active,
            direction,
            volume: quote_volume,
            confidence: BASE_CONFIDENCE,
            strength: 0,
            price_target: price,
            estimated_duration: DURATION_UNKNOWN.into(),
        };
    }

    let volume_multiple = ratio(quote_volume, threshold);
    let volume_ratio = ratio(current_volume, avg_volume);
    let abs_change = change.abs();

    let raw_strength = volume_multiple * dec!(30) + volume_ratio * dec!(20) + abs_change * dec!(5);
    let strength = raw_strength
        .floor()
        .min(Decimal::from(MAX_WHALE_STRENGTH))
        .to_u32()
        .unwrap_or(0);
    let strength_d = Decimal::from(strength);

    let confidence = (dec!(70) + abs_change * dec!(3) + strength_d / dec!(2))
        .min(Decimal::from(MAX_WHALE_CONFIDENCE))
        .floor()
        .to_u32()
        .unwrap_or(0);

    let projection = strength_d / dec!(1000) + abs_change / dec!(100);
    let price_target = match direction {
        WhaleDirection::Sell => price * (Decimal::ONE - projection),
        _ => price * (Decimal::ONE + projection),
    };

    WhaleAssessment {
        is_whale_active,
        direction,
        volume: quote_volume,
        confidence,
        strength,
        price_target,
        estimated_duration: duration_band(volume_multiple).into(),
    }
}

/// Duration estimate from the quote volume as a multiple of the threshold.
pub fn duration_band(volume_multiple: Decimal) -> &'static str {
    if volume_multiple >= dec!(10) {
        DURATION_GIANT
    } else if volume_multiple >= dec!(5) {
        DURATION_LARGE
    } else {
        DURATION_NORMAL
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
