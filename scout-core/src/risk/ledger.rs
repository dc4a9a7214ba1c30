//! Bounded ledger of closed trades and the performance figures derived from it.

use std::collections::VecDeque;

use crate::domain::TradeResult;

pub const DEFAULT_LEDGER_CAPACITY: usize = 50;

const KELLY_MIN_TRADES: usize = 10;
const KELLY_DEFAULT: f64 = 0.5;
const KELLY_FRACTION: f64 = 0.25;

/// FIFO ledger: the oldest trade is dropped once capacity is exceeded.
#[derive(Debug, Clone)]
pub struct TradeLedger {
    trades: VecDeque<TradeResult>,
    capacity: usize,
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_CAPACITY)
    }
}

impl TradeLedger {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            trades: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, trade: TradeResult) {
        self.trades.push_back(trade);
        while self.trades.len() > self.capacity {
            self.trades.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &TradeResult> {
        self.trades.iter()
    }

    /// The last `n` trades, or `None` if fewer than `n` have been recorded.
    pub fn last(&self, n: usize) -> Option<impl Iterator<Item = &TradeResult>> {
        if self.trades.len() < n {
            return None;
        }
        Some(self.trades.iter().skip(self.trades.len() - n))
    }

    /// Losing trades among the last `n`; `None` below `n` trades.
    pub fn losses_in_last(&self, n: usize) -> Option<usize> {
        self.last(n).map(|trades| trades.filter(|t| !t.success).count())
    }

    /// Winning trades among the last `n`; `None` below `n` trades.
    pub fn wins_in_last(&self, n: usize) -> Option<usize> {
        self.last(n).map(|trades| trades.filter(|t| t.success).count())
    }

    /// (wins / total, total); (0, 0) when empty.
    pub fn win_rate(&self) -> (f64, usize) {
        let total = self.trades.len();
        if total == 0 {
            return (0.0, 0);
        }
        let wins = self.trades.iter().filter(|t| t.success).count();
        (wins as f64 / total as f64, total)
    }

    /// Quarter Kelly: 0.25 * (W - (1 - W) / R), clamped to [0.1, 0.5].
    ///
    /// 0.5 with fewer than 10 trades, no wins or no losses.
    pub fn kelly_fraction(&self) -> f64 {
        let total = self.trades.len();
        if total < KELLY_MIN_TRADES {
            return KELLY_DEFAULT;
        }

        let (wins, total_win, total_loss) =
            self.trades
                .iter()
                .fold((0usize, 0.0, 0.0), |(wins, won, lost), t| {
                    if t.success {
                        (wins + 1, won + t.realized_pnl, lost)
                    } else {
                        (wins, won, lost + t.realized_pnl.abs())
                    }
                });
        if wins == 0 || total_loss == 0.0 {
            return KELLY_DEFAULT;
        }

        let win_rate = wins as f64 / total as f64;
        let avg_win = total_win / wins as f64;
        let avg_loss = total_loss / (total - wins) as f64;
        let ratio = avg_win / avg_loss;

        (KELLY_FRACTION * (win_rate - (1.0 - win_rate) / ratio)).clamp(0.1, 0.5)
    }
}
