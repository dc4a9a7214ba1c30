//! Scout Core: momentum signal scoring and position risk management.
//!
//! This crate contains the decision engine; it never places orders:
//! - Domain types (candles, tickers, signals, positions, trade results)
//! - Indicator library (RSI, EMA, MACD, Bollinger, ATR, volume, trend, regime)
//! - Multi-timeframe aggregation and the regime-adaptive signal scorer
//! - Per-symbol rolling history store
//! - Risk manager: entry gate, sizing, stops, trailing-stop ratchet, exits
//! - Collaborator traits for market data, balances and alerts
//! - Validated engine configuration

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod history;
pub mod indicators;
pub mod notify;
pub mod risk;

pub use analysis::SignalScorer;
pub use config::EngineConfig;
pub use error::EngineError;
pub use risk::RiskManager;
