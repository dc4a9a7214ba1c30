//! Position risk: entry gating, sizing, stop placement, trailing stops and
//! exit decisions, plus the trade ledger they draw on.

mod exit;
mod gate;
mod ledger;
mod manager;
pub mod sizing;
mod trailing;

pub use exit::CloseReason;
pub use gate::GateVerdict;
pub use ledger::{TradeLedger, DEFAULT_LEDGER_CAPACITY};
pub use manager::{EntryPlan, PositionUpdate, RiskManager};
pub use sizing::{risk_reward, RiskReward, MIN_ACCEPTABLE_RR};
pub use trailing::TrailingStop;
