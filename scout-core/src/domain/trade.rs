use serde::{Deserialize, Serialize};

/// Outcome of a closed position, kept in the risk ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub symbol: String,
    pub realized_pnl: f64,
    pub hold_duration_minutes: f64,
    /// True when the trade made money (pnl > 0).
    pub success: bool,
}

impl TradeResult {
    pub fn new(symbol: impl Into<String>, realized_pnl: f64, hold_duration_minutes: f64) -> Self {
        Self {
            symbol: symbol.into(),
            realized_pnl,
            hold_duration_minutes,
            success: realized_pnl > 0.0,
        }
    }
}
