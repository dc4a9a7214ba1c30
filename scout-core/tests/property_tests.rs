//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. RSI stays within [0, 100] for any finite series
//! 2. Linear-time MACD agrees with the prefix-replay reference
//! 3. Ratchet monotonicity: trailing stops may only tighten, never loosen
//! 4. The trade ledger and the rolling history never exceed their capacity

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use scout_core::config::EngineConfig;
use scout_core::domain::{Side, TradeResult};
use scout_core::history::HistoryStore;
use scout_core::indicators::{macd, macd_replay, rsi};
use scout_core::risk::{RiskManager, TradeLedger, TrailingStop};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (0.01..10_000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_series(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_price(), 0..max_len)
}

/// Random walk around 100 so stops actually get exercised.
fn arb_walk(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-3.0..3.0_f64, 1..len).prop_map(|steps| {
        steps
            .into_iter()
            .scan(100.0_f64, |price, step| {
                *price = (*price * (1.0 + step / 100.0)).max(1.0);
                Some(*price)
            })
            .collect()
    })
}

// ── 1. RSI Bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(values in arb_series(120), period in 1usize..30) {
        let value = rsi(&values, period);
        prop_assert!((0.0..=100.0).contains(&value), "rsi = {value}");
    }

    #[test]
    fn rsi_neutral_on_short_series(values in arb_series(15)) {
        prop_assert_eq!(rsi(&values, 14), 50.0);
    }
}

// ── 2. MACD Equivalence ──────────────────────────────────────────────

proptest! {
    #[test]
    fn macd_matches_replay(values in prop::collection::vec(arb_price(), 0..90)) {
        let fast = macd(&values);
        let slow = macd_replay(&values);
        let tolerance = 1e-9 * values.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
        prop_assert!((fast.macd - slow.macd).abs() <= tolerance);
        prop_assert!((fast.signal - slow.signal).abs() <= tolerance);
        prop_assert!((fast.histogram - slow.histogram).abs() <= tolerance);
    }
}

// ── 3. Ratchet Monotonicity ──────────────────────────────────────────

proptest! {
    /// Whatever levels are offered, a long stop never goes down.
    #[test]
    fn ratchet_long_stops_never_loosen(
        initial in arb_price(),
        proposals in prop::collection::vec(arb_price(), 1..40),
    ) {
        let mut stop = TrailingStop::with_initial_level(Side::Buy, initial);
        let mut previous = initial;
        for proposed in proposals {
            stop.apply(proposed);
            let level = stop.level().unwrap_or(previous);
            prop_assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn ratchet_short_stops_never_loosen(
        initial in arb_price(),
        proposals in prop::collection::vec(arb_price(), 1..40),
    ) {
        let mut stop = TrailingStop::with_initial_level(Side::Sell, initial);
        let mut previous = initial;
        for proposed in proposals {
            stop.apply(proposed);
            let level = stop.level().unwrap_or(previous);
            prop_assert!(level <= previous);
            previous = level;
        }
    }

    /// A live position driven through a random walk: once armed, the stop
    /// stays armed and only rises.
    #[test]
    fn ratchet_via_risk_manager(walk in arb_walk(80), percent in 0.5..5.0_f64) {
        let mut config = EngineConfig::default();
        config.strategy.trailing_stop_percent = percent;
        let rm = RiskManager::new(config, 1_000.0);
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        let plan = rm.plan("WALKUSDT", Side::Buy, 100.0, 0.7, 1.0);
        let mut position = rm.open_position(&plan, t0);
        let mut previous: Option<f64> = None;
        for (i, price) in walk.into_iter().enumerate() {
            let now = t0 + chrono::Duration::seconds(30 * (i as i64 + 1));
            rm.refresh(&mut position, price, now);
            let level = position.trailing_stop.level();
            if let (Some(before), Some(after)) = (previous, level) {
                prop_assert!(after >= before, "{after} < {before}");
            }
            prop_assert!(previous.is_none() || level.is_some());
            previous = level;
        }
    }
}

// ── 4. Bounded Buffers ───────────────────────────────────────────────

proptest! {
    #[test]
    fn ledger_never_exceeds_capacity(
        pnls in prop::collection::vec(-50.0..50.0_f64, 0..200),
        capacity in 1usize..60,
    ) {
        let mut ledger = TradeLedger::new(capacity);
        for (i, pnl) in pnls.iter().enumerate() {
            ledger.record(TradeResult::new(format!("S{i}"), *pnl, 1.0));
            prop_assert!(ledger.len() <= capacity);
        }
        prop_assert_eq!(ledger.len(), pnls.len().min(capacity));
        // Oldest trades are dropped first
        if let Some(last) = pnls.last() {
            let newest = ledger.iter().last().map(|t| t.realized_pnl);
            prop_assert_eq!(newest, Some(*last));
        }
    }

    #[test]
    fn history_never_exceeds_capacity(
        prices in prop::collection::vec(arb_price(), 1..250),
        capacity in 1usize..120,
    ) {
        let store = HistoryStore::new(capacity);
        for price in &prices {
            let snapshot = store.append("HISTUSDT", *price, 1.0);
            prop_assert!(snapshot.len() <= capacity);
            prop_assert_eq!(snapshot.prices.len(), snapshot.volumes.len());
        }
        prop_assert_eq!(store.len("HISTUSDT"), prices.len().min(capacity));
        prop_assert_eq!(
            store.snapshot("HISTUSDT").and_then(|s| s.last_price()),
            prices.last().copied()
        );
    }
}
