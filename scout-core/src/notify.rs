//! Notification sink contract.
//!
//! Delivery failures come back as `NotifyError`; callers log them and move on.
//! Nothing here retries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Position, Signal, Ticker, TradeResult};
use crate::risk::{CloseReason, EntryPlan};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("notification sink not configured: {0}")]
    NotConfigured(String),
}

/// Figures for the periodic performance report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub open_positions: usize,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub win_rate: f64,
    pub total_trades: usize,
}

pub trait AlertSink: Send + Sync {
    fn started(&self) -> Result<(), NotifyError>;

    /// An accepted BUY together with the suggested entry.
    fn signal_alert(&self, signal: &Signal, plan: &EntryPlan) -> Result<(), NotifyError>;

    fn hot_coins(&self, coins: &[Ticker]) -> Result<(), NotifyError>;

    fn position_opened(&self, position: &Position, reason: &str) -> Result<(), NotifyError>;

    fn position_closed(
        &self,
        position: &Position,
        trade: &TradeResult,
        reason: &CloseReason,
    ) -> Result<(), NotifyError>;

    fn trailing_stop_moved(&self, position: &Position) -> Result<(), NotifyError>;

    fn daily_report(&self, report: &DailyReport) -> Result<(), NotifyError>;

    fn error(&self, message: &str) -> Result<(), NotifyError>;
}
