pub mod market_data;
pub mod signal;
pub mod timeframe;
pub mod whale;

pub use market_data::{Candle, TickerSnapshot};
pub use signal::{IndicatorSet, MarketAnalysis, Signal, Trend, Volatility, VolumeProfile, WhaleContext};
pub use timeframe::Timeframe;
pub use whale::{ForceChange, ForceDirection, WhaleAssessment, WhaleDirection};
