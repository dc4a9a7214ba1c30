//! Risk manager: the authority over a position's lifecycle.
//!
//! Gates new entries, sizes them, places the initial stop and target, ratchets
//! trailing stops on every price refresh, decides when to close, and keeps the
//! trade ledger plus the period PnL counter. Ledger and counter share one lock
//! so the manager can be used through `&self` from several threads.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::exit::CloseReason;
use super::gate::GateVerdict;
use super::ledger::TradeLedger;
use super::sizing::{self, RiskReward};
use super::trailing::TrailingStop;
use crate::config::EngineConfig;
use crate::domain::{Position, Side, Signal, TradeResult};
use crate::notify::DailyReport;

const LOSS_STREAK_WINDOW: usize = 5;
const LOSS_STREAK_LIMIT: usize = 4;
const PERFORMANCE_WINDOW: usize = 3;
const STALL_HOURS: f64 = 4.0;
const STALL_MIN_PNL_PERCENT: f64 = 1.0;
const HARD_EXIT_HOURS: f64 = 24.0;

/// Suggested entry derived from a signal. Nothing is transmitted anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPlan {
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub quantity: f64,
    /// quantity x entry price, in quote currency.
    pub notional: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward: RiskReward,
    pub atr: f64,
    /// ATR as a percentage of the entry price.
    pub volatility_percent: f64,
    pub strength: f64,
    /// Fractional Kelly suggestion from the ledger.
    pub kelly_fraction: f64,
}

impl EntryPlan {
    pub fn stop_percent(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs() / self.entry_price * 100.0
    }

    pub fn target_percent(&self) -> f64 {
        (self.take_profit - self.entry_price).abs() / self.entry_price * 100.0
    }
}

/// Result of feeding a fresh price to an open position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub trailing_moved: bool,
    pub close: Option<CloseReason>,
}

#[derive(Debug, Default)]
struct RiskState {
    period_pnl: f64,
    ledger: TradeLedger,
}

#[derive(Debug)]
pub struct RiskManager {
    config: EngineConfig,
    initial_balance: f64,
    state: Mutex<RiskState>,
}

impl RiskManager {
    pub fn new(config: EngineConfig, initial_balance: f64) -> Self {
        Self::with_ledger(config, initial_balance, TradeLedger::default())
    }

    pub fn with_ledger(config: EngineConfig, initial_balance: f64, ledger: TradeLedger) -> Self {
        Self {
            config,
            initial_balance,
            state: Mutex::new(RiskState {
                period_pnl: 0.0,
                ledger,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, RiskState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Entry gate ──

    /// Checked in order: position cap, period loss, loss streak, drawdown.
    pub fn can_open(&self, open_positions: usize) -> GateVerdict {
        let max = self.config.strategy.max_positions;
        if open_positions >= max {
            return GateVerdict::MaxPositions {
                open: open_positions,
                max,
            };
        }

        let state = self.state();
        let limit = self.config.risk.max_daily_loss;
        if state.period_pnl <= -limit {
            return GateVerdict::DailyLossLimit {
                pnl: state.period_pnl,
                limit,
            };
        }

        if let Some(losses) = state.ledger.losses_in_last(LOSS_STREAK_WINDOW) {
            if losses >= LOSS_STREAK_LIMIT {
                return GateVerdict::LossStreak {
                    losses,
                    window: LOSS_STREAK_WINDOW,
                };
            }
        }

        let drawdown_limit = self.config.risk.max_drawdown_percent;
        if self.initial_balance > 0.0 && drawdown_limit > 0.0 && state.period_pnl < 0.0 {
            let loss_percent = -state.period_pnl / self.initial_balance * 100.0;
            if loss_percent >= drawdown_limit {
                return GateVerdict::Drawdown {
                    loss_percent,
                    limit: drawdown_limit,
                };
            }
        }

        GateVerdict::Allowed
    }

    // ── Sizing and placement ──

    /// Quantity for an entry at `price`. 0 for a non-positive price.
    pub fn position_size(&self, price: f64, strength: f64, atr_percent: f64) -> f64 {
        if price <= 0.0 {
            return 0.0;
        }
        let performance =
            sizing::performance_multiplier(self.state().ledger.wins_in_last(PERFORMANCE_WINDOW));
        sizing::adjusted_size(
            self.config.strategy.position_size,
            strength,
            atr_percent,
            performance,
        ) / price
    }

    pub fn stop_loss(&self, entry: f64, side: Side, atr: f64) -> f64 {
        let distance = sizing::stop_distance(entry, atr, self.config.strategy.stop_loss_percent);
        entry * (1.0 - distance * side.sign())
    }

    pub fn take_profit(&self, entry: f64, side: Side, strength: f64) -> f64 {
        let distance =
            sizing::target_distance(self.config.strategy.take_profit_percent, strength);
        entry * (1.0 + distance * side.sign())
    }

    pub fn risk_reward(&self, entry: f64, stop_loss: f64, take_profit: f64) -> RiskReward {
        sizing::risk_reward(entry, stop_loss, take_profit)
    }

    /// Long entry plan for a scored signal.
    pub fn plan_entry(&self, signal: &Signal) -> EntryPlan {
        self.plan(
            signal.symbol(),
            Side::Buy,
            signal.price(),
            signal.strength(),
            signal.atr(),
        )
    }

    pub fn plan(&self, symbol: &str, side: Side, price: f64, strength: f64, atr: f64) -> EntryPlan {
        let volatility_percent = if price > 0.0 { atr / price * 100.0 } else { 0.0 };
        let quantity = self.position_size(price, strength, volatility_percent);
        let stop_loss = self.stop_loss(price, side, atr);
        let take_profit = self.take_profit(price, side, strength);
        let risk_reward = self.risk_reward(price, stop_loss, take_profit);

        let plan = EntryPlan {
            symbol: symbol.to_string(),
            side,
            entry_price: price,
            quantity,
            notional: quantity * price,
            stop_loss,
            take_profit,
            risk_reward,
            atr,
            volatility_percent,
            strength,
            kelly_fraction: self.kelly_fraction(),
        };
        debug!(
            symbol,
            quantity = plan.quantity,
            stop = plan.stop_loss,
            target = plan.take_profit,
            rr = plan.risk_reward.ratio,
            "entry planned"
        );
        plan
    }

    /// Track a paper position for `plan`, entered at `now`.
    pub fn open_position(&self, plan: &EntryPlan, now: DateTime<Utc>) -> Position {
        let trailing = if self.config.strategy.trailing_stop_enabled {
            TrailingStop::new(plan.side)
        } else {
            TrailingStop::disabled(plan.side)
        };
        info!(
            symbol = %plan.symbol,
            side = %plan.side,
            entry = plan.entry_price,
            quantity = plan.quantity,
            "position opened"
        );
        Position::new(
            plan.symbol.clone(),
            plan.side,
            plan.entry_price,
            plan.quantity,
            now,
        )
        .with_stops(plan.stop_loss, plan.take_profit)
        .with_trailing_stop(trailing)
    }

    // ── Monitoring ──

    /// Mark to `price`, ratchet the trailing stop, then evaluate exits.
    pub fn refresh(&self, position: &mut Position, price: f64, now: DateTime<Utc>) -> PositionUpdate {
        position.mark(price, now);
        let trailing_moved = self.update_trailing_stop(position);
        PositionUpdate {
            trailing_moved,
            close: self.should_close(position, now),
        }
    }

    /// On a new favorable extreme, propose extreme x (1 ∓ distance) to the
    /// ratchet. Returns true if the stop moved.
    pub fn update_trailing_stop(&self, position: &mut Position) -> bool {
        let new_extreme = position.record_extreme();
        if !self.config.strategy.trailing_stop_enabled
            || !position.trailing_stop.is_enabled()
            || !new_extreme
        {
            return false;
        }

        let best = position.best_price();
        let profit = (best - position.entry_price) / position.entry_price * position.side.sign();
        let distance = sizing::trailing_distance(self.config.strategy.trailing_stop_percent, profit);
        let proposed = best * (1.0 - distance * position.side.sign());

        let moved = position.trailing_stop.apply(proposed);
        if moved {
            debug!(
                symbol = %position.symbol,
                level = proposed,
                distance,
                "trailing stop ratcheted"
            );
        }
        moved
    }

    /// First matching exit in priority order, or `None` to stay open.
    pub fn should_close(&self, position: &Position, now: DateTime<Utc>) -> Option<CloseReason> {
        let price = position.current_price;

        if self.config.strategy.trailing_stop_enabled && position.trailing_stop.is_hit(price) {
            if let Some(level) = position.trailing_stop.level() {
                return Some(CloseReason::TrailingStop { level });
            }
        }

        let (stop_hit, target_hit) = match position.side {
            Side::Buy => (
                position.stop_loss > 0.0 && price <= position.stop_loss,
                position.take_profit > 0.0 && price >= position.take_profit,
            ),
            Side::Sell => (
                position.stop_loss > 0.0 && price >= position.stop_loss,
                position.take_profit > 0.0 && price <= position.take_profit,
            ),
        };
        if stop_hit {
            return Some(CloseReason::StopLoss {
                level: position.stop_loss,
            });
        }
        if target_hit {
            return Some(CloseReason::TakeProfit {
                level: position.take_profit,
            });
        }

        let hours = position.age_hours(now);
        if hours > STALL_HOURS && position.pnl_percent < STALL_MIN_PNL_PERCENT {
            return Some(CloseReason::Stall {
                hours,
                pnl_percent: position.pnl_percent,
            });
        }
        if hours > HARD_EXIT_HOURS {
            return Some(CloseReason::HardExit { hours });
        }
        None
    }

    // ── Closing and bookkeeping ──

    /// Realize the position's PnL at its last marked price and record the trade.
    pub fn close_position(&self, position: &mut Position, now: DateTime<Utc>) -> TradeResult {
        position.realized_pnl = position.unrealized_pnl;
        position.unrealized_pnl = 0.0;
        position.last_update_time = now;

        let minutes = (now - position.entry_time).num_seconds() as f64 / 60.0;
        let trade = TradeResult::new(position.symbol.clone(), position.realized_pnl, minutes);
        info!(
            symbol = %trade.symbol,
            pnl = trade.realized_pnl,
            minutes = trade.hold_duration_minutes,
            "position closed"
        );
        self.record_trade(trade.clone());
        trade
    }

    /// Append to the ledger and add to the period PnL.
    pub fn record_trade(&self, trade: TradeResult) {
        let mut state = self.state();
        state.period_pnl += trade.realized_pnl;
        state.ledger.record(trade);
    }

    pub fn win_rate(&self) -> (f64, usize) {
        self.state().ledger.win_rate()
    }

    pub fn kelly_fraction(&self) -> f64 {
        self.state().ledger.kelly_fraction()
    }

    pub fn trade_count(&self) -> usize {
        self.state().ledger.len()
    }

    pub fn period_pnl(&self) -> f64 {
        self.state().period_pnl
    }

    /// Start a new accounting period. The ledger is kept.
    pub fn reset_period_pnl(&self) {
        self.state().period_pnl = 0.0;
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn daily_report(&self, open_positions: &[Position]) -> DailyReport {
        let (win_rate, total_trades) = self.win_rate();
        DailyReport {
            open_positions: open_positions.len(),
            realized_pnl: self.period_pnl(),
            unrealized_pnl: open_positions.iter().map(|p| p.unrealized_pnl).sum(),
            win_rate,
            total_trades,
        }
    }
}
