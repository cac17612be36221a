//! Candlestick pattern detection over the most recent candles.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::PATTERN_LOOKBACK;
use crate::types::Candle;

/// Reversal patterns recognised by [`detect_patterns`], in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Hammer,
    ShootingStar,
    BullishEngulfing,
    BearishEngulfing,
}

impl CandlePattern {
    /// Human-readable label surfaced in analysis output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hammer => "Martelo (Hammer) - Reversão de alta",
            Self::ShootingStar => "Shooting Star - Reversão de baixa",
            Self::BullishEngulfing => "Engolfo de Alta - Forte compra",
            Self::BearishEngulfing => "Engolfo de Baixa - Forte venda",
        }
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Long lower shadow (> 2x body) with a short upper shadow (< 0.5x body).
pub fn is_hammer(candle: &Candle) -> bool {
    let body = candle.body();
    candle.lower_shadow() > body * dec!(2) && candle.upper_shadow() < body * dec!(0.5)
}

/// Long upper shadow (> 2x body) with a short lower shadow (< 0.5x body).
pub fn is_shooting_star(candle: &Candle) -> bool {
    let body = candle.body();
    candle.upper_shadow() > body * dec!(2) && candle.lower_shadow() < body * dec!(0.5)
}

fn is_bullish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.is_bearish() && cur.is_bullish() && cur.close > prev.open && cur.open < prev.close
}

fn is_bearish_engulfing(prev: &Candle, cur: &Candle) -> bool {
    prev.is_bullish() && cur.is_bearish() && cur.close < prev.open && cur.open > prev.close
}

/// Detect reversal patterns on the latest candles.
///
/// Needs at least [`PATTERN_LOOKBACK`] candles, otherwise nothing is
/// reported. Shape patterns look at the latest candle only; engulfing
/// patterns compare it with the one before.
pub fn detect_patterns(candles: &[Candle]) -> Vec<CandlePattern> {
    if candles.len() < PATTERN_LOOKBACK {
        return Vec::new();
    }

    let recent = &candles[candles.len() - PATTERN_LOOKBACK..];
    let mut patterns = Vec::new();

    let Some((last, rest)) = recent.split_last() else {
        return patterns;
    };

    if is_hammer(last) {
        patterns.push(CandlePattern::Hammer);
    }
    if is_shooting_star(last) {
        patterns.push(CandlePattern::ShootingStar);
    }

    if let Some(prev) = rest.last() {
        if is_bullish_engulfing(prev, last) {
            patterns.push(CandlePattern::BullishEngulfing);
        }
        if is_bearish_engulfing(prev, last) {
            patterns.push(CandlePattern::BearishEngulfing);
        }
    }

    patterns
}

/// Labels of `patterns`, preserving order.
pub fn pattern_labels(patterns: &[CandlePattern]) -> Vec<String> {
    patterns.iter().map(|p| p.label().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn c(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle {
            open_time: 0,
            open,
            high,
            low,
            close,
            volume: dec!(1),
            close_time: 0,
        }
    }

    /// Plain bullish filler candles ending with `tail`, ten in total.
    fn series(tail: &[Candle]) -> Vec<Candle> {
        let mut out: Vec<Candle> = (0..10)
            .map(|_| c(dec!(100), dec!(103), dec!(97), dec!(101)))
            .collect();
        out.truncate(10 - tail.len());
        out.extend_from_slice(tail);
        out
    }

    #[test]
    fn test_fewer_than_ten_candles_is_empty() {
        let hammer = c(dec!(100), dec!(101), dec!(90), dec!(101));
        let candles = vec![hammer; 9];
        assert!(detect_patterns(&candles).is_empty());
    }

    #[test]
    fn test_hammer() {
        // body 1, lower shadow 10, upper shadow 0.2
        let candles = series(&[c(dec!(100), dec!(101.2), dec!(90), dec!(101))]);
        assert_eq!(detect_patterns(&candles), vec![CandlePattern::Hammer]);
    }

    #[test]
    fn test_shooting_star() {
        let candles = series(&[c(dec!(101), dec!(110), dec!(99.8), dec!(100))]);
        assert_eq!(detect_patterns(&candles), vec![CandlePattern::ShootingStar]);
    }

    #[test]
    fn test_bullish_engulfing() {
        let prev = c(dec!(105), dec!(106), dec!(99), dec!(100));
        let cur = c(dec!(99), dec!(108), dec!(98), dec!(107));
        let candles = series(&[prev, cur]);
        assert_eq!(detect_patterns(&candles), vec![CandlePattern::BullishEngulfing]);
    }

    #[test]
    fn test_bearish_engulfing() {
        let prev = c(dec!(100), dec!(106), dec!(99), dec!(105));
        let cur = c(dec!(106), dec!(107), dec!(98), dec!(99));
        let candles = series(&[prev, cur]);
        assert_eq!(detect_patterns(&candles), vec![CandlePattern::BearishEngulfing]);
    }

    #[test]
    fn test_engulfing_requires_containment() {
        let prev = c(dec!(105), dec!(106), dec!(99), dec!(100));
        // Bullish but closes below the previous open.
        let cur = c(dec!(99), dec!(105), dec!(98), dec!(104));
        let candles = series(&[prev, cur]);
        assert!(detect_patterns(&candles).is_empty());
    }

    #[test]
    fn test_hammer_and_engulfing_together_keep_order() {
        let prev = c(dec!(101), dec!(101.5), dec!(100.5), dec!(100.6));
        // body 0.8, lower shadow 10.4, upper shadow 0.1
        let cur = c(dec!(100.5), dec!(101.4), dec!(90.1), dec!(101.3));
        let candles = series(&[prev, cur]);
        assert_eq!(
            detect_patterns(&candles),
            vec![CandlePattern::Hammer, CandlePattern::BullishEngulfing]
        );
    }

    #[test]
    fn test_detection_is_idempotent() {
        let candles = series(&[c(dec!(100), dec!(101.2), dec!(90), dec!(101))]);
        let first = detect_patterns(&candles);
        let second = detect_patterns(&candles);
        assert_eq!(first, second);
        assert_eq!(
            pattern_labels(&first),
            vec!["Martelo (Hammer) - Reversão de alta".to_string()]
        );
    }

    #[test]
    fn test_flat_doji_is_not_a_shape_pattern() {
        let doji = c(dec!(100), dec!(100), dec!(100), dec!(100));
        assert!(!is_hammer(&doji));
        assert!(!is_shooting_star(&doji));
    }
}
