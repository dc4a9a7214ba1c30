//! The scan loop: the timing authority around the engine.
//!
//! One cycle fetches tickers, ranks hot coins, refreshes paper positions and
//! alerts the first strong enough BUY. Around the cycle the loop logs status
//! and sends the daily report. Nothing here places orders.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use scout_core::data::{DataError, MarketData};
use scout_core::domain::{Position, Ticker};
use scout_core::{RiskManager, SignalScorer};

use crate::config::ScheduleConfig;
use crate::notify::Notifier;

/// Last alert time per symbol.
#[derive(Debug, Default)]
pub struct AlertCooldowns {
    last_alert: HashMap<String, DateTime<Utc>>,
}

impl AlertCooldowns {
    pub fn is_cooling(&self, symbol: &str, now: DateTime<Utc>, cooldown: chrono::Duration) -> bool {
        self.last_alert
            .get(symbol)
            .is_some_and(|&at| now - at < cooldown)
    }

    pub fn record(&mut self, symbol: &str, now: DateTime<Utc>) {
        self.last_alert.insert(symbol.to_string(), now);
    }

    /// Forget alerts older than `retention`.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: chrono::Duration) {
        self.last_alert.retain(|_, at| now - *at < retention);
    }

    pub fn len(&self) -> usize {
        self.last_alert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alert.is_empty()
    }
}

/// What one cycle did.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CycleReport {
    pub tickers: usize,
    pub hot_coins: Vec<String>,
    pub alerted: Option<String>,
    pub opened: Option<String>,
    pub closed: Vec<String>,
    pub daily_report_sent: bool,
}

pub struct Scanner {
    market: Arc<dyn MarketData>,
    scorer: SignalScorer,
    risk: RiskManager,
    notifier: Notifier,
    schedule: ScheduleConfig,
    paper: bool,
    positions: Vec<Position>,
    cooldowns: AlertCooldowns,
    last_hot_coins: Option<DateTime<Utc>>,
    last_report: DateTime<Utc>,
    last_status: DateTime<Utc>,
    cycles: u64,
}

impl Scanner {
    pub fn new(
        market: Arc<dyn MarketData>,
        scorer: SignalScorer,
        risk: RiskManager,
        notifier: Notifier,
        schedule: ScheduleConfig,
        paper: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            market,
            scorer,
            risk,
            notifier,
            schedule,
            paper,
            positions: Vec::new(),
            cooldowns: AlertCooldowns::default(),
            last_hot_coins: None,
            last_report: now,
            last_status: now,
            cycles: 0,
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    /// Loop forever, or for a single cycle with `once`.
    pub fn run(&mut self, once: bool) {
        info!(
            market = self.market.name(),
            paper = self.paper,
            interval_secs = self.schedule.scan_interval_secs,
            "scanner starting"
        );
        self.notifier.started();

        loop {
            let now = Utc::now();
            self.run_cycle(now);
            if once {
                self.status(now);
                break;
            }
            if now - self.last_status >= self.schedule.status_interval() {
                self.status(now);
            }
            std::thread::sleep(std::time::Duration::from_secs(
                self.schedule.scan_interval_secs,
            ));
        }
    }

    pub fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        self.cycles += 1;
        let mut report = CycleReport::default();

        match self.market.tickers() {
            Ok(tickers) => {
                report.tickers = tickers.len();
                let hot = self.scorer.scan_hot_coins(&tickers);
                report.hot_coins = hot.iter().map(|t| t.symbol.clone()).collect();
                debug!(tickers = tickers.len(), hot = hot.len(), "tickers fetched");

                if !hot.is_empty() && self.hot_coins_due(now) {
                    self.notifier.hot_coins(&hot);
                    self.last_hot_coins = Some(now);
                }

                if self.paper {
                    report.closed = self.monitor_positions(now);
                }

                if let Some((symbol, opened)) = self.analyze_and_alert(&hot, now) {
                    report.alerted = Some(symbol.clone());
                    if opened {
                        report.opened = Some(symbol);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "ticker fetch failed");
                self.notifier.error(&format!("Failed to fetch tickers: {e}"));
            }
        }

        self.cooldowns.prune(now, self.schedule.alert_retention());

        if now - self.last_report >= self.schedule.daily_report_interval() {
            let daily = self.risk.daily_report(&self.positions);
            self.notifier.daily_report(&daily);
            self.risk.reset_period_pnl();
            self.last_report = now;
            report.daily_report_sent = true;
        }

        report
    }

    fn hot_coins_due(&self, now: DateTime<Utc>) -> bool {
        self.last_hot_coins
            .map_or(true, |last| now - last > self.schedule.hot_coins_interval())
    }

    /// Mark every paper position and close the ones whose exit fired.
    /// Returns the closed symbols.
    fn monitor_positions(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let market = Arc::clone(&self.market);
        let prices: Vec<Result<f64, DataError>> = self
            .positions
            .par_iter()
            .map(|p| market.current_price(&p.symbol))
            .collect();

        let mut closed = Vec::new();
        let mut still_open = Vec::with_capacity(self.positions.len());
        for (mut position, price) in std::mem::take(&mut self.positions).into_iter().zip(prices) {
            let price = match price {
                Ok(price) => price,
                Err(e) => {
                    warn!(symbol = %position.symbol, error = %e, "price refresh failed");
                    still_open.push(position);
                    continue;
                }
            };

            let update = self.risk.refresh(&mut position, price, now);
            if update.trailing_moved {
                self.notifier.trailing_stop_moved(&position);
            }
            match update.close {
                Some(reason) => {
                    let trade = self.risk.close_position(&mut position, now);
                    self.notifier.position_closed(&position, &trade, &reason);
                    closed.push(position.symbol);
                }
                None => still_open.push(position),
            }
        }
        self.positions = still_open;
        closed
    }

    /// Score the candidates in order and alert the first BUY that clears the
    /// strength floor. Returns its symbol and whether a paper position opened.
    fn analyze_and_alert(&mut self, candidates: &[Ticker], now: DateTime<Utc>) -> Option<(String, bool)> {
        let verdict = self.risk.can_open(self.positions.len());
        if !verdict.is_allowed() {
            info!(reason = %verdict, "entries blocked");
            return None;
        }

        let floor = self.scorer.config().strategy.min_signal_strength;
        let cooldown = self.schedule.alert_cooldown();

        for ticker in candidates {
            if self.cooldowns.is_cooling(&ticker.symbol, now, cooldown) {
                debug!(symbol = %ticker.symbol, "alert cooling down");
                continue;
            }

            let signal = match self
                .scorer
                .score(ticker, self.market.as_ref(), &self.positions)
            {
                Ok(signal) => signal,
                Err(e) => {
                    warn!(symbol = %ticker.symbol, error = %e, "scoring failed");
                    continue;
                }
            };

            if !signal.is_buy() || signal.strength() < floor {
                debug!(
                    symbol = signal.symbol(),
                    action = %signal.action(),
                    strength = signal.strength(),
                    "no alert"
                );
                continue;
            }

            let plan = self.risk.plan_entry(&signal);
            self.notifier.signal_alert(&signal, &plan);
            self.cooldowns.record(signal.symbol(), now);

            let mut opened = false;
            if self.paper && plan.quantity > 0.0 {
                let position = self.risk.open_position(&plan, now);
                let reason = format!("paper entry, strength {:.0}%", signal.strength() * 100.0);
                self.notifier.position_opened(&position, &reason);
                self.positions.push(position);
                opened = true;
            }
            return Some((signal.symbol().to_string(), opened));
        }
        None
    }

    pub fn status(&mut self, now: DateTime<Utc>) {
        let (win_rate, trades) = self.risk.win_rate();
        let unrealized: f64 = self.positions.iter().map(|p| p.unrealized_pnl).sum();
        info!(
            cycles = self.cycles,
            open_positions = self.positions.len(),
            tracked_symbols = self.scorer.history().symbol_count(),
            cooling = self.cooldowns.len(),
            period_pnl = self.risk.period_pnl(),
            unrealized,
            win_rate,
            trades,
            "status"
        );
        self.last_status = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use scout_core::config::EngineConfig;
    use scout_core::domain::{Candle, Interval, Signal, TradeResult};
    use scout_core::notify::{AlertSink, DailyReport, NotifyError};
    use scout_core::risk::{CloseReason, EntryPlan};
    use std::sync::Mutex;

    // ── Helpers ──

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    const SERIES_LEN: usize = 100;

    /// Zigzag rally, then a plateau that keeps edging up.
    fn close_at(i: usize) -> f64 {
        if i < 83 {
            8.6 + i as f64 * 0.0125 + if i % 2 == 1 { 0.05 } else { 0.0 }
        } else {
            let j = i - 83;
            9.90 + j as f64 * 0.004 + if j % 2 == 0 { 0.02 } else { 0.0 }
        }
    }

    /// Every symbol follows the same rally, so every symbol scores a BUY.
    struct TrendingMarket {
        symbols: Vec<String>,
        price: Mutex<f64>,
        fail_tickers: bool,
    }

    impl TrendingMarket {
        fn new(symbols: &[&str]) -> Self {
            Self {
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
                price: Mutex::new(10.0),
                fail_tickers: false,
            }
        }

        fn set_price(&self, price: f64) {
            *self.price.lock().unwrap() = price;
        }
    }

    impl MarketData for TrendingMarket {
        fn name(&self) -> &str {
            "trending"
        }

        fn tickers(&self) -> Result<Vec<Ticker>, DataError> {
            if self.fail_tickers {
                return Err(DataError::NetworkUnreachable("offline".into()));
            }
            let price = *self.price.lock().unwrap();
            Ok(self
                .symbols
                .iter()
                .map(|s| Ticker {
                    symbol: s.clone(),
                    last_price: price,
                    price_change_percent: 5.0,
                    quote_volume: 2_000_000.0,
                    volume: 1_000.0,
                    timestamp: t0(),
                })
                .collect())
        }

        fn candles(
            &self,
            _symbol: &str,
            interval: Interval,
            limit: usize,
        ) -> Result<Vec<Candle>, DataError> {
            let start = SERIES_LEN.saturating_sub(limit);
            let step = interval.duration();
            let base = t0() - step * SERIES_LEN as i32;
            Ok((start..SERIES_LEN)
                .map(|i| {
                    let close = close_at(i);
                    let open = if i == start { close } else { close_at(i - 1) };
                    let open_time = base + step * i as i32;
                    Candle {
                        open_time,
                        open,
                        high: open.max(close) * 1.002,
                        low: open.min(close) * 0.998,
                        close,
                        volume: if close > open { 1500.0 } else { 500.0 },
                        close_time: open_time + step - Duration::seconds(1),
                    }
                })
                .collect())
        }

        fn current_price(&self, _symbol: &str) -> Result<f64, DataError> {
            Ok(*self.price.lock().unwrap())
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, event: String) -> Result<(), NotifyError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn count(&self, prefix: &str) -> usize {
            self.events().iter().filter(|e| e.starts_with(prefix)).count()
        }
    }

    impl AlertSink for Recorder {
        fn started(&self) -> Result<(), NotifyError> {
            self.push("started".into())
        }
        fn signal_alert(&self, signal: &Signal, _: &EntryPlan) -> Result<(), NotifyError> {
            self.push(format!("signal:{}", signal.symbol()))
        }
        fn hot_coins(&self, coins: &[Ticker]) -> Result<(), NotifyError> {
            self.push(format!("hot:{}", coins.len()))
        }
        fn position_opened(&self, p: &Position, _: &str) -> Result<(), NotifyError> {
            self.push(format!("opened:{}", p.symbol))
        }
        fn position_closed(
            &self,
            p: &Position,
            _: &TradeResult,
            reason: &CloseReason,
        ) -> Result<(), NotifyError> {
            self.push(format!("closed:{}:{}", p.symbol, reason.label()))
        }
        fn trailing_stop_moved(&self, p: &Position) -> Result<(), NotifyError> {
            self.push(format!("trailing:{}", p.symbol))
        }
        fn daily_report(&self, report: &DailyReport) -> Result<(), NotifyError> {
            self.push(format!("daily:{}", report.open_positions))
        }
        fn error(&self, message: &str) -> Result<(), NotifyError> {
            self.push(format!("error:{message}"))
        }
    }

    fn config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.strategy.use_multi_timeframe = false;
        config.strategy.min_signal_strength = 0.0;
        config
    }

    fn scanner(market: Arc<TrendingMarket>, paper: bool) -> (Scanner, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let sink: Arc<dyn AlertSink> = recorder.clone();
        let notifier = Notifier::new(vec![sink]);
        let scanner = Scanner::new(
            market,
            SignalScorer::new(config()),
            RiskManager::new(config(), 1_000.0),
            notifier,
            ScheduleConfig::default(),
            paper,
            t0(),
        );
        (scanner, recorder)
    }

    // ── Cooldowns ──

    #[test]
    fn cooldown_expires_and_prunes() {
        let mut cooldowns = AlertCooldowns::default();
        cooldowns.record("AUSDT", t0());
        let ten = Duration::minutes(10);
        assert!(cooldowns.is_cooling("AUSDT", t0() + Duration::minutes(9), ten));
        assert!(!cooldowns.is_cooling("AUSDT", t0() + Duration::minutes(10), ten));
        assert!(!cooldowns.is_cooling("BUSDT", t0(), ten));

        cooldowns.prune(t0() + Duration::minutes(29), Duration::minutes(30));
        assert_eq!(cooldowns.len(), 1);
        cooldowns.prune(t0() + Duration::minutes(30), Duration::minutes(30));
        assert!(cooldowns.is_empty());
    }

    // ── Cycles ──

    #[test]
    fn ticker_failure_sends_error_alert() {
        let mut market = TrendingMarket::new(&["AUSDT"]);
        market.fail_tickers = true;
        let (mut scanner, recorder) = scanner(Arc::new(market), false);

        let report = scanner.run_cycle(t0());
        assert_eq!(report.tickers, 0);
        assert_eq!(recorder.count("error:Failed to fetch tickers"), 1);
    }

    #[test]
    fn hot_coins_alert_is_throttled() {
        let market = Arc::new(TrendingMarket::new(&["AUSDT", "BUSDT"]));
        let (mut scanner, recorder) = scanner(market, false);

        let report = scanner.run_cycle(t0());
        assert_eq!(report.hot_coins.len(), 2);
        scanner.run_cycle(t0() + Duration::minutes(3));
        assert_eq!(recorder.count("hot:"), 1);
        scanner.run_cycle(t0() + Duration::minutes(6));
        assert_eq!(recorder.count("hot:"), 2);
    }

    #[test]
    fn one_alert_per_cycle_then_cooldown() {
        let market = Arc::new(TrendingMarket::new(&["AUSDT", "BUSDT"]));
        let (mut scanner, recorder) = scanner(market, false);

        let first = scanner.run_cycle(t0());
        let alerted = first.alerted.expect("trending market should alert");
        assert_eq!(first.opened, None);
        assert_eq!(recorder.count("signal:"), 1);

        // The other symbol gets its turn while the first cools down
        let second = scanner.run_cycle(t0() + Duration::minutes(1));
        let other = second.alerted.expect("second symbol should alert");
        assert_ne!(other, alerted);

        let third = scanner.run_cycle(t0() + Duration::minutes(2));
        assert_eq!(third.alerted, None);
        assert_eq!(recorder.count("signal:"), 2);
    }

    #[test]
    fn paper_position_opens_and_closes_on_take_profit() {
        let market = Arc::new(TrendingMarket::new(&["AUSDT"]));
        let (mut scanner, recorder) = scanner(market.clone(), true);

        let report = scanner.run_cycle(t0());
        assert_eq!(report.opened.as_deref(), Some("AUSDT"));
        assert_eq!(scanner.positions().len(), 1);
        let target = scanner.positions()[0].take_profit;

        market.set_price(target * 1.01);
        let report = scanner.run_cycle(t0() + Duration::minutes(1));
        assert_eq!(report.closed, vec!["AUSDT".to_string()]);
        assert!(scanner.positions().is_empty());
        assert_eq!(recorder.count("closed:AUSDT:take_profit"), 1);
        assert_eq!(scanner.risk().trade_count(), 1);
        assert!(scanner.risk().period_pnl() > 0.0);
    }

    #[test]
    fn daily_report_resets_period_pnl() {
        let market = Arc::new(TrendingMarket::new(&["AUSDT"]));
        let (mut scanner, recorder) = scanner(market, false);
        scanner.risk().record_trade(TradeResult::new("AUSDT", -12.0, 30.0));

        let report = scanner.run_cycle(t0() + Duration::hours(23));
        assert!(!report.daily_report_sent);

        let report = scanner.run_cycle(t0() + Duration::hours(25));
        assert!(report.daily_report_sent);
        assert_eq!(recorder.count("daily:"), 1);
        assert_eq!(scanner.risk().period_pnl(), 0.0);
        assert_eq!(scanner.risk().trade_count(), 1);
    }

    #[test]
    fn gate_blocks_alerts_after_daily_loss() {
        let market = Arc::new(TrendingMarket::new(&["AUSDT"]));
        let (mut scanner, recorder) = scanner(market, false);
        let limit = scanner.risk().config().risk.max_daily_loss;
        scanner
            .risk()
            .record_trade(TradeResult::new("XUSDT", -limit, 30.0));

        let report = scanner.run_cycle(t0());
        assert_eq!(report.alerted, None);
        assert_eq!(recorder.count("signal:"), 0);
    }
}
