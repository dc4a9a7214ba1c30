use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of the entry gate. A rejection is a normal decision, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateVerdict {
    Allowed,
    MaxPositions { open: usize, max: usize },
    DailyLossLimit { pnl: f64, limit: f64 },
    LossStreak { losses: usize, window: usize },
    Drawdown { loss_percent: f64, limit: f64 },
}

impl GateVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateVerdict::Allowed => f.write_str("allowed"),
            GateVerdict::MaxPositions { open, max } => {
                write!(f, "maximum positions reached ({open}/{max})")
            }
            GateVerdict::DailyLossLimit { pnl, limit } => {
                write!(f, "daily loss limit reached: {pnl:.2} (limit -{limit:.2})")
            }
            GateVerdict::LossStreak { losses, window } => write!(
                f,
                "high loss rate ({losses} of last {window} trades), pausing to protect capital"
            ),
            GateVerdict::Drawdown {
                loss_percent,
                limit,
            } => write!(f, "drawdown {loss_percent:.2}% exceeds limit {limit:.2}%"),
        }
    }
}
