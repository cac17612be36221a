use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Hard ceiling for confidence and probability. Never reports certainty.
pub const MAX_SCORE: u32 = 95;

/// Confidence of a NEUTRO signal and the probability starting point.
pub const BASE_CONFIDENCE: u32 = 50;

/// Starting confidence of a directional (COMPRA/VENDA) signal.
pub const DIRECTIONAL_CONFIDENCE: u32 = 70;

/// ADX must be strictly above this for any directional signal.
pub const ADX_TREND_THRESHOLD: Decimal = dec!(25);

/// Probability bonus thresholds on ADX.
pub const ADX_STRONG: Decimal = dec!(30);
pub const ADX_VERY_STRONG: Decimal = dec!(40);

pub const RSI_OVERSOLD: Decimal = dec!(30);
pub const RSI_OVERBOUGHT: Decimal = dec!(70);

/// Immediate-entry RSI bounds (BUY below, SELL above).
pub const RSI_ENTRY_BUY: Decimal = dec!(40);
pub const RSI_ENTRY_SELL: Decimal = dec!(60);

/// Neutral fallbacks for short histories.
pub const RSI_NEUTRAL: Decimal = dec!(50);
pub const ADX_WEAK_DEFAULT: Decimal = dec!(20);

/// Current volume above this multiple of the trailing average is FORTE.
pub const STRONG_VOLUME_MULTIPLE: Decimal = dec!(1.5);

// ---------------------------------------------------------------------------
// Volatility bands (ATR as a fraction of price)
// ---------------------------------------------------------------------------

pub const VOLATILITY_VERY_HIGH: Decimal = dec!(0.03);
pub const VOLATILITY_HIGH: Decimal = dec!(0.02);
pub const VOLATILITY_MEDIUM: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Candles inspected by the pattern detector.
pub const PATTERN_LOOKBACK: usize = 10;

// ---------------------------------------------------------------------------
// Whale detection
// ---------------------------------------------------------------------------

/// |24h change| in percent above which a whale gets a direction.
pub const WHALE_DIRECTION_CHANGE_PCT: Decimal = dec!(1.5);

/// |24h change| in percent that counts as a strong move.
pub const WHALE_STRONG_MOVE_PCT: Decimal = dec!(2);

/// Latest-bar volume multiple of the trailing average that alone flags a whale.
pub const WHALE_VOLUME_SPIKE_MULTIPLE: Decimal = dec!(3);

pub const MAX_WHALE_CONFIDENCE: u32 = 98;
pub const MAX_WHALE_STRENGTH: u32 = 100;

pub const DURATION_GIANT: &str = "2-4 horas";
pub const DURATION_LARGE: &str = "1-2 horas";
pub const DURATION_NORMAL: &str = "30min-1hora";
pub const DURATION_UNKNOWN: &str = "N/A";

// ---------------------------------------------------------------------------
// Force change
// ---------------------------------------------------------------------------

pub const FORCE_MIN_CANDLES_1M: usize = 20;
pub const FORCE_MIN_CANDLES_5M: usize = 10;
pub const FORCE_CANDLES_1M: u32 = 100;
pub const FORCE_CANDLES_5M: u32 = 50;

/// Recent volume below this fraction of the previous window is a decay.
pub const VOLUME_DECAY_RATIO: Decimal = dec!(0.7);

// ---------------------------------------------------------------------------
// Binance
// ---------------------------------------------------------------------------

pub const BINANCE_TRADING_STATUS: &str = "TRADING";

// ---------------------------------------------------------------------------
// Timeouts & Intervals (seconds)
// ---------------------------------------------------------------------------

pub const PRICE_CACHE_TTL_SECONDS: u64 = 5;
pub const KLINES_1H_CACHE_TTL_SECONDS: u64 = 60;
pub const KLINES_CACHE_TTL_SECONDS: u64 = 30;
pub const PAIRS_CACHE_TTL_SECONDS: u64 = 300;
