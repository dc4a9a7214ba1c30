//! Market data and account collaborator traits with their error type.
//!
//! The engine only ever talks to an exchange through these traits, so the
//! Binance client, the synthetic market and test mocks are interchangeable.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Candle, Interval, Ticker};

/// Structured error types for collaborator fetches.
///
/// The scorer never propagates these; a failed fetch degrades to neutral
/// indicator values.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by exchange (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: exchange has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("insufficient data for {symbol}: got {got}, need {need}")]
    Insufficient {
        symbol: String,
        got: usize,
        need: usize,
    },

    #[error("data error: {0}")]
    Other(String),
}

/// Source of tickers, candles and spot prices.
pub trait MarketData: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// 24h tickers for every listed pair.
    fn tickers(&self) -> Result<Vec<Ticker>, DataError>;

    /// Most recent `limit` candles, oldest first.
    fn candles(&self, symbol: &str, interval: Interval, limit: usize)
        -> Result<Vec<Candle>, DataError>;

    fn current_price(&self, symbol: &str) -> Result<f64, DataError>;
}

/// Account balances, used only to seed the initial capital figure.
pub trait AccountSource: Send + Sync {
    /// Free balance per asset.
    fn balances(&self) -> Result<HashMap<String, f64>, DataError>;
}
