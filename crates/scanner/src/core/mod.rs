pub mod data_service;
pub mod force_change;
pub mod gateway;
pub mod indicators;
pub mod market_analyzer;
pub mod patterns;
pub mod scanner;
pub mod signal_scorer;
pub mod ticker_stream;
pub mod whale_detector;
