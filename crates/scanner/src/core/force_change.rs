//! Short-horizon force-change (reversal) heuristic over 1m and 5m candles.

use rust_decimal::Decimal;

use super::indicators::{rsi, trailing_average};
use super::patterns::{is_hammer, is_shooting_star};
use crate::constants::{
    DURATION_UNKNOWN, FORCE_MIN_CANDLES_1M, FORCE_MIN_CANDLES_5M, RSI_OVERBOUGHT, RSI_OVERSOLD,
    VOLUME_DECAY_RATIO,
};
use crate::types::{Candle, ForceChange, ForceDirection};

const RSI_PERIOD: usize = 14;
const VOLUME_WINDOW: usize = 10;
/// Close-to-close lookback used to call the short-term direction.
const MOMENTUM_LOOKBACK: usize = 5;

/// Detect an imminent change of market force.
///
/// Combines the 1m RSI, a >30 % volume decay of the last 10 bars against the
/// 10 before, the shape of the last 1m candle and its close against the close
/// four bars earlier. The 5m series only gates on having enough history.
pub fn assess_force_change(candles_1m: &[Candle], candles_5m: &[Candle]) -> ForceChange {
    if candles_1m.len() < FORCE_MIN_CANDLES_1M || candles_5m.len() < FORCE_MIN_CANDLES_5M {
        return ForceChange::unknown("Dados insuficientes");
    }

    let closes: Vec<Decimal> = candles_1m.iter().map(|c| c.close).collect();
    let volumes: Vec<Decimal> = candles_1m.iter().map(|c| c.volume).collect();
    let n = candles_1m.len();

    let rsi_now = rsi(&closes, RSI_PERIOD);

    let recent_volume = trailing_average(&volumes, VOLUME_WINDOW);
    let previous_volume = trailing_average(&volumes[..n - VOLUME_WINDOW], VOLUME_WINDOW);
    let volume_decreasing = recent_volume < previous_volume * VOLUME_DECAY_RATIO;

    let last = &candles_1m[n - 1];
    let reference_close = closes[n - MOMENTUM_LOOKBACK];
    let falling = last.close < reference_close;
    let rising = last.close > reference_close;

    if (rsi_now > RSI_OVERBOUGHT && is_shooting_star(last)) || (volume_decreasing && falling) {
        ForceChange {
            is_changing: true,
            new_direction: ForceDirection::Down,
            confidence: 75,
            reason: "⚠️ REVERSÃO IMINENTE: RSI sobrecomprado + padrão de exaustão".into(),
            estimated_time: "5-15 minutos".into(),
        }
    } else if (rsi_now < RSI_OVERSOLD && is_hammer(last)) || (volume_decreasing && rising) {
        ForceChange {
            is_changing: true,
            new_direction: ForceDirection::Up,
            confidence: 75,
            reason: "✅ REVERSÃO PARA ALTA: RSI sobrevendido + padrão de recuperação".into(),
            estimated_time: "5-15 minutos".into(),
        }
    } else if volume_decreasing {
        ForceChange {
            is_changing: true,
            new_direction: ForceDirection::Neutral,
            confidence: 60,
            reason: "⏸️ Volume diminuindo - possível mudança de direção".into(),
            estimated_time: "10-30 minutos".into(),
        }
    } else {
        ForceChange {
            is_changing: false,
            new_direction: ForceDirection::Neutral,
            confidence: 50,
            reason: "Força mantida".into(),
            estimated_time: DURATION_UNKNOWN.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(close: Decimal, volume: Decimal) -> Candle {
        Candle {
            open_time: 0,
            open: close,
            high: close + dec!(0.5),
            low: close - dec!(0.5),
            close,
            volume,
            close_time: 59_999,
        }
    }

    fn flat_5m() -> Vec<Candle> {
        vec![bar(dec!(100), dec!(10)); 12]
    }

    /// 30 one-minute bars: `closes` drive price, volume drops to `tail_volume`
    /// over the last 10 bars.
    fn series_1m(closes: impl Fn(usize) -> Decimal, tail_volume: Decimal) -> Vec<Candle> {
        (0..30)
            .map(|i| {
                let volume = if i >= 20 { tail_volume } else { dec!(100) };
                bar(closes(i), volume)
            })
            .collect()
    }

    #[test]
    fn test_insufficient_data() {
        let short = vec![bar(dec!(100), dec!(1)); 19];
        let f = assess_force_change(&short, &flat_5m());
        assert!(!f.is_changing);
        assert_eq!(f.confidence, 0);
        assert_eq!(f.reason, "Dados insuficientes");

        let ok_1m = vec![bar(dec!(100), dec!(1)); 20];
        let f = assess_force_change(&ok_1m, &flat_5m()[..9]);
        assert_eq!(f.reason, "Dados insuficientes");
    }

    #[test]
    fn test_volume_decay_while_falling_is_down() {
        let candles = series_1m(|i| dec!(200) - Decimal::from(i), dec!(50));
        let f = assess_force_change(&candles, &flat_5m());
        assert!(f.is_changing);
        assert_eq!(f.new_direction, ForceDirection::Down);
        assert_eq!(f.confidence, 75);
        assert_eq!(f.estimated_time, "5-15 minutos");
    }

    #[test]
    fn test_volume_decay_while_rising_is_up() {
        let candles = series_1m(|i| dec!(100) + Decimal::from(i), dec!(50));
        let f = assess_force_change(&candles, &flat_5m());
        assert_eq!(f.new_direction, ForceDirection::Up);
        assert_eq!(f.confidence, 75);
    }

    #[test]
    fn test_volume_decay_flat_price_is_neutral_change() {
        let candles = series_1m(|_| dec!(100), dec!(50));
        let f = assess_force_change(&candles, &flat_5m());
        assert!(f.is_changing);
        assert_eq!(f.new_direction, ForceDirection::Neutral);
        assert_eq!(f.confidence, 60);
        assert_eq!(f.estimated_time, "10-30 minutos");
    }

    #[test]
    fn test_steady_volume_force_maintained() {
        let candles = series_1m(|i| dec!(100) + Decimal::from(i), dec!(100));
        let f = assess_force_change(&candles, &flat_5m());
        assert!(!f.is_changing);
        assert_eq!(f.confidence, 50);
        assert_eq!(f.reason, "Força mantida");
        assert_eq!(f.estimated_time, "N/A");
    }

    #[test]
    fn test_overbought_shooting_star_is_down() {
        let mut candles = series_1m(|i| dec!(100) + Decimal::from(i), dec!(100));
        if let Some(last) = candles.last_mut() {
            // body 0.2, upper shadow 3, lower shadow 0
            last.open = dec!(129);
            last.close = dec!(129.2);
            last.high = dec!(132.2);
            last.low = dec!(129);
        }
        let f = assess_force_change(&candles, &flat_5m());
        assert_eq!(f.new_direction, ForceDirection::Down);
        assert!(f.reason.contains("RSI sobrecomprado"));
    }
}
