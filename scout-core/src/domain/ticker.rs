use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_price, EngineError};

/// 24h rolling ticker snapshot for one trading pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub last_price: f64,
    /// 24h change in percent (5.0 means +5%).
    pub price_change_percent: f64,
    /// 24h traded volume in quote asset units.
    pub quote_volume: f64,
    /// 24h traded volume in base asset units.
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// Reject snapshots that break the data source contract.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.symbol.trim().is_empty() {
            return Err(EngineError::EmptySymbol);
        }
        ensure_price(&self.symbol, self.last_price)?;
        for volume in [self.volume, self.quote_volume] {
            if !volume.is_finite() || volume < 0.0 {
                return Err(EngineError::InvalidVolume {
                    symbol: self.symbol.clone(),
                    volume,
                });
            }
        }
        if !self.price_change_percent.is_finite() {
            return Err(EngineError::invalid_price(
                &self.symbol,
                self.price_change_percent,
            ));
        }
        Ok(())
    }

    /// True when the pair is quoted in `quote` (e.g. `BTCUSDT` in `USDT`).
    pub fn is_quoted_in(&self, quote: &str) -> bool {
        self.symbol.len() > quote.len() && self.symbol.ends_with(quote)
    }
}
