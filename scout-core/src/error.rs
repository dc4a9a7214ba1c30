//! Engine error taxonomy.
//!
//! Only contract breaches from collaborators surface as errors. Missing data
//! degrades to neutral readings and business-rule rejections are ordinary
//! values (`GateVerdict`, HOLD signals), so neither appears here.

use thiserror::Error;

/// Malformed input handed to the engine by a collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("empty symbol")]
    EmptySymbol,

    #[error("invalid price for {symbol}: {price}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("invalid volume for {symbol}: {volume}")]
    InvalidVolume { symbol: String, volume: f64 },

    #[error("malformed candle at index {index} for {symbol}")]
    MalformedCandle { symbol: String, index: usize },

    #[error("non-monotonic candle timestamps at index {index} for {symbol}")]
    NonMonotonicCandles { symbol: String, index: usize },

    #[error("invalid quantity for {symbol}: {quantity}")]
    InvalidQuantity { symbol: String, quantity: f64 },
}

impl EngineError {
    pub fn invalid_price(symbol: &str, price: f64) -> Self {
        Self::InvalidPrice {
            symbol: symbol.to_string(),
            price,
        }
    }
}

/// Reject NaN, infinite, zero and negative prices.
pub fn ensure_price(symbol: &str, price: f64) -> Result<(), EngineError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(EngineError::invalid_price(symbol, price))
    }
}
