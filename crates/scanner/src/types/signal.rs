use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timeframe::Timeframe;

/// EMA-based trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Bullish,
    Bearish,
}

/// Discrete trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[serde(rename = "COMPRA")]
    Buy,
    #[serde(rename = "VENDA")]
    Sell,
    #[serde(rename = "NEUTRO")]
    Neutral,
}

impl Signal {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "COMPRA",
            Self::Sell => "VENDA",
            Self::Neutral => "NEUTRO",
        }
    }

    pub fn is_directional(&self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current-bar volume versus its trailing average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeProfile {
    #[serde(rename = "FRACO")]
    Weak,
    #[serde(rename = "MODERADO")]
    Moderate,
    /// Above 1.5x the trailing average.
    #[serde(rename = "FORTE")]
    Strong,
}

/// ATR relative to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Volatility {
    #[serde(rename = "BAIXA")]
    Low,
    #[serde(rename = "MÉDIA")]
    Medium,
    #[serde(rename = "ALTA")]
    High,
    #[serde(rename = "MUITO ALTA")]
    VeryHigh,
}

impl Volatility {
    /// Recommended trading timeframe: the more volatile, the shorter.
    pub fn best_timeframe(&self) -> Timeframe {
        match self {
            Self::VeryHigh => Timeframe::M5,
            Self::High => Timeframe::M15,
            Self::Medium => Timeframe::H1,
            Self::Low => Timeframe::H4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "BAIXA",
            Self::Medium => "MÉDIA",
            Self::High => "ALTA",
            Self::VeryHigh => "MUITO ALTA",
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Indicator values computed fresh from one candle series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    #[serde(with = "rust_decimal::serde::str")]
    pub ema_50: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub ema_200: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub rsi: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub macd_histogram: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub adx: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub atr: Decimal,
    pub volume_profile: VolumeProfile,
}

/// Whale metadata attached to a signal that survived whale gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleContext {
    #[serde(with = "rust_decimal::serde::str")]
    pub price_target: Decimal,
    pub estimated_duration: String,
    pub strength: u32,
    /// 24h quote volume in USD.
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
}

/// Full analysis of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub trend: Trend,
    /// Trend strength, equal to the ADX value.
    #[serde(with = "rust_decimal::serde::str")]
    pub strength: Decimal,
    pub volatility: Volatility,
    pub signal: Signal,
    /// Always within `[0, 95]`.
    pub confidence: u32,
    pub best_timeframe: Timeframe,
    pub entry_time: String,
    pub indicators: IndicatorSet,
    pub patterns: Vec<String>,
    /// Always within `[0, 95]`.
    pub probability: u32,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whale: Option<WhaleContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_labels() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"COMPRA\"");
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"VENDA\"");
        assert_eq!(Signal::Neutral.to_string(), "NEUTRO");
        assert!(Signal::Buy.is_directional());
        assert!(!Signal::Neutral.is_directional());
    }

    #[test]
    fn test_volatility_labels_and_timeframes() {
        assert_eq!(
            serde_json::to_string(&Volatility::VeryHigh).unwrap(),
            "\"MUITO ALTA\""
        );
        assert_eq!(Volatility::Medium.to_string(), "MÉDIA");
        assert_eq!(Volatility::VeryHigh.best_timeframe(), Timeframe::M5);
        assert_eq!(Volatility::High.best_timeframe(), Timeframe::M15);
        assert_eq!(Volatility::Medium.best_timeframe(), Timeframe::H1);
        assert_eq!(Volatility::Low.best_timeframe(), Timeframe::H4);
    }

    #[test]
    fn test_trend_and_volume_labels() {
        assert_eq!(serde_json::to_string(&Trend::Bullish).unwrap(), "\"BULLISH\"");
        assert_eq!(serde_json::to_string(&VolumeProfile::Strong).unwrap(), "\"FORTE\"");
        let v: VolumeProfile = serde_json::from_str("\"FRACO\"").unwrap();
        assert_eq!(v, VolumeProfile::Weak);
    }
}
