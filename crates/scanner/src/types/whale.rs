use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::signal::Signal;
use crate::constants::DURATION_UNKNOWN;

/// Direction attributed to a whale movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WhaleDirection {
    Buy,
    Sell,
    Neutral,
}

impl WhaleDirection {
    /// The trading signal that trades with this whale.
    pub fn as_signal(&self) -> Signal {
        match self {
            Self::Buy => Signal::Buy,
            Self::Sell => Signal::Sell,
            Self::Neutral => Signal::Neutral,
        }
    }
}

/// Result of the whale heuristic for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleAssessment {
    pub is_whale_active: bool,
    pub direction: WhaleDirection,
    /// 24h quote volume in USD.
    #[serde(with = "rust_decimal::serde::str")]
    pub volume: Decimal,
    pub confidence: u32,
    /// `[0, 100]`.
    pub strength: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_target: Decimal,
    pub estimated_duration: String,
}

impl WhaleAssessment {
    /// No data, or the lookup failed.
    pub fn inactive() -> Self {
        Self {
            is_whale_active: false,
            direction: WhaleDirection::Neutral,
            volume: Decimal::ZERO,
            confidence: 0,
            strength: 0,
            price_target: Decimal::ZERO,
            estimated_duration: DURATION_UNKNOWN.into(),
        }
    }
}

/// Direction of an imminent short-horizon reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForceDirection {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceChange {
    pub is_changing: bool,
    pub new_direction: ForceDirection,
    pub confidence: u32,
    pub reason: String,
    pub estimated_time: String,
}

impl ForceChange {
    /// Not changing, with `reason` explaining why nothing could be said.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            is_changing: false,
            new_direction: ForceDirection::Neutral,
            confidence: 0,
            reason: reason.into(),
            estimated_time: DURATION_UNKNOWN.into(),
        }
    }
}
