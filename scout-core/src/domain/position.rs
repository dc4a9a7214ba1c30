use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::TrailingStop;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for a long, -1 for a short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        })
    }
}

/// An open paper position tracked by the caller and managed by the risk manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub current_price: f64,
    /// Best price seen since entry for a long.
    pub highest_price_since_entry: f64,
    /// Best price seen since entry for a short.
    pub lowest_price_since_entry: f64,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: TrailingStop,
    pub entry_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    /// Unrealized PnL as a percentage of entry price (1.0 means +1%).
    pub pnl_percent: f64,
}

impl Position {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        entry_price: f64,
        quantity: f64,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            entry_price,
            current_price: entry_price,
            highest_price_since_entry: entry_price,
            lowest_price_since_entry: entry_price,
            quantity,
            stop_loss: 0.0,
            take_profit: 0.0,
            trailing_stop: TrailingStop::disabled(side),
            entry_time,
            last_update_time: entry_time,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            pnl_percent: 0.0,
        }
    }

    pub fn with_stops(mut self, stop_loss: f64, take_profit: f64) -> Self {
        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self
    }

    pub fn with_trailing_stop(mut self, trailing_stop: TrailingStop) -> Self {
        self.trailing_stop = trailing_stop;
        self
    }

    /// Refresh price-derived fields. Extremes are left to the trailing-stop update.
    pub fn mark(&mut self, price: f64, now: DateTime<Utc>) {
        self.current_price = price;
        self.last_update_time = now;
        self.unrealized_pnl = (price - self.entry_price) * self.quantity * self.side.sign();
        self.pnl_percent = if self.entry_price > 0.0 {
            (price - self.entry_price) / self.entry_price * 100.0 * self.side.sign()
        } else {
            0.0
        };
    }

    /// Record a new favorable extreme. Returns true if the current price set one.
    pub fn record_extreme(&mut self) -> bool {
        match self.side {
            Side::Buy if self.current_price > self.highest_price_since_entry => {
                self.highest_price_since_entry = self.current_price;
                true
            }
            Side::Sell if self.current_price < self.lowest_price_since_entry => {
                self.lowest_price_since_entry = self.current_price;
                true
            }
            _ => false,
        }
    }

    /// Favorable extreme for this side.
    pub fn best_price(&self) -> f64 {
        match self.side {
            Side::Buy => self.highest_price_since_entry,
            Side::Sell => self.lowest_price_since_entry,
        }
    }

    pub fn notional(&self) -> f64 {
        self.entry_price * self.quantity
    }

    /// Hours elapsed since the true entry time.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.entry_time).num_seconds() as f64 / 3600.0
    }
}
