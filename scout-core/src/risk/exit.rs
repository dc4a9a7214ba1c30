use std::fmt;

use serde::{Deserialize, Serialize};

/// Why an open position should be closed, in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CloseReason {
    TrailingStop { level: f64 },
    StopLoss { level: f64 },
    TakeProfit { level: f64 },
    /// Open too long without making progress.
    Stall { hours: f64, pnl_percent: f64 },
    /// Open past the maximum holding time.
    HardExit { hours: f64 },
}

impl CloseReason {
    /// Short machine-friendly label.
    pub fn label(&self) -> &'static str {
        match self {
            CloseReason::TrailingStop { .. } => "trailing_stop",
            CloseReason::StopLoss { .. } => "stop_loss",
            CloseReason::TakeProfit { .. } => "take_profit",
            CloseReason::Stall { .. } => "stall",
            CloseReason::HardExit { .. } => "hard_exit",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::TrailingStop { level } => write!(f, "Trailing stop hit at ${level:.4}"),
            CloseReason::StopLoss { level } => write!(f, "Stop loss hit at ${level:.4}"),
            CloseReason::TakeProfit { level } => write!(f, "Take profit hit at ${level:.4}"),
            CloseReason::Stall { hours, pnl_percent } => write!(
                f,
                "Time-based exit: open {hours:.1}h with {pnl_percent:.2}% PnL"
            ),
            CloseReason::HardExit { hours } => write!(f, "Time-based exit: open {hours:.1}h"),
        }
    }
}
