//! Pure computation module for technical indicators.
//!
//! No I/O, no side effects. Takes price / OHLCV slices and returns indicator
//! values as `Decimal`. Every function degrades to a documented neutral value
//! on short or mismatched input instead of failing, so the scorer stays safe
//! on young symbols with little history.
//!
//! Indicators implemented:
//! - EMA (SMA-seeded), RSI over the trailing window, MACD with a 9-period
//!   EMA signal line
//! - ADX as a single-point DX over trailing averages, ATR as the mean of the
//!   trailing true ranges
//! - Volume profile of the latest bar against its trailing average
//!
//! References:
//!     Wilder (1978), "New Concepts in Technical Trading Systems".
//!     Appel (2005), "Technical Analysis: Power Tools for Active Investors".

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::IndicatorParams;
use crate::constants::{ADX_WEAK_DEFAULT, RSI_NEUTRAL, STRONG_VOLUME_MULTIPLE};
use crate::types::{Candle, IndicatorSet, VolumeProfile};

// ═══════════════════════════════════════════════════════════════════════════
// Moving averages & momentum
// ═══════════════════════════════════════════════════════════════════════════

/// Exponential Moving Average series.
///
/// Multiplier `k = 2 / (period + 1)`. First value seeded with SMA of the
/// first `period` prices. Returns empty `Vec` if insufficient data.
pub fn ema_series(prices: &[Decimal], period: usize) -> Vec<Decimal> {
    if prices.len() < period || period == 0 {
        return Vec::new();
    }

    let k = dec!(2) / Decimal::from(period as u64 + 1);

    let sma: Decimal =
        prices[..period].iter().copied().sum::<Decimal>() / Decimal::from(period as u64);

    let mut result = Vec::with_capacity(prices.len() - period + 1);
    let mut prev = sma;
    result.push(sma);

    for &price in &prices[period..] {
        prev = (price - prev) * k + prev;
        result.push(prev);
    }

    result
}

/// Latest EMA value.
///
/// With fewer than `period` prices the last price is returned as-is
/// (`0` for an empty slice).
pub fn ema(prices: &[Decimal], period: usize) -> Decimal {
    ema_series(prices, period)
        .last()
        .or_else(|| prices.last())
        .copied()
        .unwrap_or(Decimal::ZERO)
}

/// Relative Strength Index over the trailing window.
///
/// Averages the gains and losses of the last `period` deltas (the last
/// `period + 1` closes) without any running smoothing. Returns 50 if
/// insufficient data and 100 when there were no losses.
pub fn rsi(closes: &[Decimal], period: usize) -> Decimal {
    if period == 0 || closes.len() < period + 1 {
        return RSI_NEUTRAL;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((Decimal::ZERO, Decimal::ZERO), |(g, l), change| {
            if change > Decimal::ZERO {
                (g + change, l)
            } else {
                (g, l - change)
            }
        });

    let period_d = Decimal::from(period as u64);
    let avg_gain = gains / period_d;
    let avg_loss = losses / period_d;

    if avg_loss == Decimal::ZERO {
        return dec!(100);
    }

    let rs = avg_gain / avg_loss;
    dec!(100) - (dec!(100) / (dec!(1) + rs))
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macd {
    pub line: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// Moving Average Convergence Divergence.
///
/// `line = EMA(fast) - EMA(slow)`; the signal line is the `signal`-period
/// EMA of the aligned MACD-line series. When that series is shorter than
/// `signal` the signal line equals the MACD line and the histogram is zero.
pub fn macd(closes: &[Decimal], fast: usize, slow: usize, signal: usize) -> Macd {
    let line = ema(closes, fast) - ema(closes, slow);

    let fast_series = ema_series(closes, fast);
    let slow_series = ema_series(closes, slow);
    let n = fast_series.len().min(slow_series.len());

    // Both series end on the latest close; align them on their tails.
    let macd_values: Vec<Decimal> = fast_series[fast_series.len() - n..]
        .iter()
        .zip(&slow_series[slow_series.len() - n..])
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = ema_series(&macd_values, signal)
        .last()
        .copied()
        .unwrap_or(line);

    Macd {
        line,
        signal: signal_line,
        histogram: line - signal_line,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Trend strength & volatility
// ═══════════════════════════════════════════════════════════════════════════

/// Per-bar true ranges, `TR = max(H-L, |H-prevC|, |L-prevC|)`.
///
/// One value per bar after the first. Empty on mismatched lengths.
pub fn true_ranges(highs: &[Decimal], lows: &[Decimal], closes: &[Decimal]) -> Vec<Decimal> {
    let n = highs.len();
    if lows.len() != n || closes.len() != n {
        return Vec::new();
    }

    (1..n)
        .map(|i| {
            let hl = highs[i] - lows[i];
            let hc = (highs[i] - closes[i - 1]).abs();
            let lc = (lows[i] - closes[i - 1]).abs();
            hl.max(hc).max(lc)
        })
        .collect()
}

/// Directional strength as a single-point DX.
///
/// `+DM`/`-DM` and true ranges are averaged over the trailing `period` bars,
/// then `DX = |+DI - -DI| / (+DI + -DI) * 100`. Returns 20 if insufficient
/// data and 0 for a flat window.
pub fn adx(highs: &[Decimal], lows: &[Decimal], closes: &[Decimal], period: usize) -> Decimal {
    let n = highs.len();
    if period == 0 || n < period + 1 || lows.len() != n || closes.len() != n {
        return ADX_WEAK_DEFAULT;
    }

    let trs = true_ranges(highs, lows, closes);
    let (plus_dms, minus_dms): (Vec<Decimal>, Vec<Decimal>) = (1..n)
        .map(|i| {
            let up_move = highs[i] - highs[i - 1];
            let down_move = lows[i - 1] - lows[i];
            let plus = if up_move > down_move && up_move > Decimal::ZERO {
                up_move
            } else {
                Decimal::ZERO
            };
            let minus = if down_move > up_move && down_move > Decimal::ZERO {
                down_move
            } else {
                Decimal::ZERO
            };
            (plus, minus)
        })
        .unzip();

    let avg_tr = trailing_average(&trs, period);
    if avg_tr == Decimal::ZERO {
        return Decimal::ZERO;
    }

    let plus_di = trailing_average(&plus_dms, period) / avg_tr * dec!(100);
    let minus_di = trailing_average(&minus_dms, period) / avg_tr * dec!(100);
    let di_sum = plus_di + minus_di;
    if di_sum == Decimal::ZERO {
        return Decimal::ZERO;
    }

    (plus_di - minus_di).abs() / di_sum * dec!(100)
}

/// Average True Range: plain mean of the trailing `period` true ranges.
///
/// Returns `Decimal::ZERO` on mismatched or insufficient data.
pub fn atr(highs: &[Decimal], lows: &[Decimal], closes: &[Decimal], period: usize) -> Decimal {
    let n = highs.len();
    if period == 0 || n < period + 1 || lows.len() != n || closes.len() != n {
        return Decimal::ZERO;
    }
    trailing_average(&true_ranges(highs, lows, closes), period)
}

// ═══════════════════════════════════════════════════════════════════════════
// Volume
// ═══════════════════════════════════════════════════════════════════════════

/// Mean of the last `min(len, window)` values; zero when there are none.
pub fn trailing_average(values: &[Decimal], window: usize) -> Decimal {
    let take = values.len().min(window);
    if take == 0 {
        return Decimal::ZERO;
    }
    values[values.len() - take..].iter().copied().sum::<Decimal>() / Decimal::from(take as u64)
}

/// `> 1.5x` average is FORTE, above average MODERADO, otherwise FRACO.
pub fn volume_profile(current: Decimal, average: Decimal) -> VolumeProfile {
    if current > average * STRONG_VOLUME_MULTIPLE {
        VolumeProfile::Strong
    } else if current > average {
        VolumeProfile::Moderate
    } else {
        VolumeProfile::Weak
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Aggregate
// ═══════════════════════════════════════════════════════════════════════════

/// Compute every indicator the scorer needs from one candle series.
pub fn compute_indicator_set(candles: &[Candle], params: &IndicatorParams) -> IndicatorSet {
    let closes: Vec<Decimal> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<Decimal> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<Decimal> = candles.iter().map(|c| c.low).collect();
    let volumes: Vec<Decimal> = candles.iter().map(|c| c.volume).collect();

    let current_volume = volumes.last().copied().unwrap_or(Decimal::ZERO);
    let average_volume = trailing_average(&volumes, params.volume_window);

    IndicatorSet {
        ema_50: ema(&closes, params.ema_fast),
        ema_200: ema(&closes, params.ema_trend),
        rsi: rsi(&closes, params.rsi_period),
        macd_histogram: macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal)
            .histogram,
        adx: adx(&highs, &lows, &closes, params.adx_period),
        atr: atr(&highs, &lows, &closes, params.atr_period),
        volume_profile: volume_profile(current_volume, average_volume),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
