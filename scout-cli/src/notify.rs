//! Alert sinks: structured log lines and Telegram messages.
//!
//! `Notifier` fans every event out to all configured sinks. A failed delivery
//! is logged and dropped; the scan loop never waits on a retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{info, warn};

use scout_core::domain::{Position, Signal, Ticker, TradeResult};
use scout_core::notify::{AlertSink, DailyReport, NotifyError};
use scout_core::risk::{CloseReason, EntryPlan};

use crate::config::TelegramConfig;

/// Hot coins listed in one Telegram message.
const HOT_COINS_SHOWN: usize = 5;

// ── Log sink ──

/// Writes every event as a tracing line. Always succeeds.
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn started(&self) -> Result<(), NotifyError> {
        info!("scanner started");
        Ok(())
    }

    fn signal_alert(&self, signal: &Signal, plan: &EntryPlan) -> Result<(), NotifyError> {
        info!(
            symbol = signal.symbol(),
            strength = signal.strength(),
            mtf = signal.mtf_score(),
            entry = plan.entry_price,
            quantity = plan.quantity,
            stop_loss = plan.stop_loss,
            take_profit = plan.take_profit,
            rr = plan.risk_reward.ratio,
            "BUY signal"
        );
        Ok(())
    }

    fn hot_coins(&self, coins: &[Ticker]) -> Result<(), NotifyError> {
        let list: Vec<&str> = coins.iter().map(|t| t.symbol.as_str()).collect();
        info!(count = coins.len(), coins = %list.join(","), "hot coins");
        Ok(())
    }

    fn position_opened(&self, position: &Position, reason: &str) -> Result<(), NotifyError> {
        info!(
            symbol = %position.symbol,
            side = %position.side,
            entry = position.entry_price,
            quantity = position.quantity,
            reason,
            "position opened"
        );
        Ok(())
    }

    fn position_closed(
        &self,
        position: &Position,
        trade: &TradeResult,
        reason: &CloseReason,
    ) -> Result<(), NotifyError> {
        info!(
            symbol = %position.symbol,
            exit = position.current_price,
            pnl = trade.realized_pnl,
            reason = reason.label(),
            "position closed"
        );
        Ok(())
    }

    fn trailing_stop_moved(&self, position: &Position) -> Result<(), NotifyError> {
        info!(
            symbol = %position.symbol,
            stop = position.trailing_stop.level(),
            price = position.current_price,
            "trailing stop moved"
        );
        Ok(())
    }

    fn daily_report(&self, report: &DailyReport) -> Result<(), NotifyError> {
        info!(
            open = report.open_positions,
            realized = report.realized_pnl,
            unrealized = report.unrealized_pnl,
            win_rate = report.win_rate,
            trades = report.total_trades,
            "daily report"
        );
        Ok(())
    }

    fn error(&self, message: &str) -> Result<(), NotifyError> {
        warn!(alert = message, "error alert");
        Ok(())
    }
}

// ── Telegram sink ──

/// Sends HTML messages through the Telegram Bot API.
pub struct TelegramSink {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(NotifyError::NotConfigured(
                "telegram bot_token and chat_id are required".into(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
        })
    }

    fn send(&self, text: String) -> Result<(), NotifyError> {
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text.as_str()),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "true"),
        ];
        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().unwrap_or_default();
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl AlertSink for TelegramSink {
    fn started(&self) -> Result<(), NotifyError> {
        self.send(format_started())
    }

    fn signal_alert(&self, signal: &Signal, plan: &EntryPlan) -> Result<(), NotifyError> {
        self.send(format_signal(signal, plan))
    }

    fn hot_coins(&self, coins: &[Ticker]) -> Result<(), NotifyError> {
        self.send(format_hot_coins(coins))
    }

    fn position_opened(&self, position: &Position, reason: &str) -> Result<(), NotifyError> {
        self.send(format_opened(position, reason))
    }

    fn position_closed(
        &self,
        position: &Position,
        trade: &TradeResult,
        reason: &CloseReason,
    ) -> Result<(), NotifyError> {
        self.send(format_closed(position, trade, reason))
    }

    fn trailing_stop_moved(&self, position: &Position) -> Result<(), NotifyError> {
        self.send(format_trailing(position))
    }

    fn daily_report(&self, report: &DailyReport) -> Result<(), NotifyError> {
        self.send(format_daily_report(report))
    }

    fn error(&self, message: &str) -> Result<(), NotifyError> {
        self.send(format_error(message))
    }
}

// ── Message formatting ──

/// Escape the three characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_started() -> String {
    "<b>Scout started</b>\nScanning for momentum signals. Alerts only, no orders are placed."
        .to_string()
}

pub fn format_signal(signal: &Signal, plan: &EntryPlan) -> String {
    let mut text = format!(
        "<b>BUY SIGNAL: {symbol}</b>\n\
         Strength: {strength:.0}%\n\
         MTF score: {mtf:.0}%\n\
         Regime: {regime}\n\n\
         Entry: ${entry:.4}\n\
         Quantity: {quantity:.6}\n\
         Stop loss: ${sl:.4} (-{sl_pct:.2}%)\n\
         Take profit: ${tp:.4} (+{tp_pct:.2}%)\n\
         Risk/Reward: 1:{rr:.2}\n",
        symbol = escape_html(signal.symbol()),
        strength = signal.strength() * 100.0,
        mtf = signal.mtf_score() * 100.0,
        regime = signal.regime(),
        entry = plan.entry_price,
        quantity = plan.quantity,
        sl = plan.stop_loss,
        sl_pct = plan.stop_percent(),
        tp = plan.take_profit,
        tp_pct = plan.target_percent(),
        rr = plan.risk_reward.ratio,
    );

    if !signal.rationale().is_empty() {
        text.push_str("\n<b>Analysis</b>\n");
        for line in signal.rationale() {
            text.push_str("- ");
            text.push_str(&escape_html(line));
            text.push('\n');
        }
    }
    text.push_str("\n<i>MANUAL EXECUTION REQUIRED</i>");
    text
}

pub fn format_hot_coins(coins: &[Ticker]) -> String {
    let mut text = String::from("<b>Hot coins</b>\n");
    for (i, coin) in coins.iter().take(HOT_COINS_SHOWN).enumerate() {
        text.push_str(&format!(
            "{}. {} {:+.2}% vol ${:.1}M\n",
            i + 1,
            escape_html(&coin.symbol),
            coin.price_change_percent,
            coin.quote_volume / 1_000_000.0
        ));
    }
    text
}

pub fn format_opened(position: &Position, reason: &str) -> String {
    format!(
        "<b>Position opened: {}</b>\n\
         Side: {}\n\
         Entry: ${:.4}\n\
         Quantity: {:.6}\n\
         Stop loss: ${:.4}\n\
         Take profit: ${:.4}\n\
         Reason: {}",
        escape_html(&position.symbol),
        position.side,
        position.entry_price,
        position.quantity,
        position.stop_loss,
        position.take_profit,
        escape_html(reason)
    )
}

pub fn format_closed(position: &Position, trade: &TradeResult, reason: &CloseReason) -> String {
    let outcome = if trade.success { "PROFIT" } else { "LOSS" };
    format!(
        "<b>Position closed: {}</b> ({outcome})\n\
         Entry: ${:.4}\n\
         Exit: ${:.4}\n\
         PnL: ${:.2} ({:+.2}%)\n\
         Held: {:.0} min\n\
         Reason: {}",
        escape_html(&position.symbol),
        position.entry_price,
        position.current_price,
        trade.realized_pnl,
        position.pnl_percent,
        trade.hold_duration_minutes,
        escape_html(&reason.to_string())
    )
}

pub fn format_trailing(position: &Position) -> String {
    let stop = position
        .trailing_stop
        .level()
        .map_or_else(|| "unarmed".to_string(), |level| format!("${level:.4}"));
    format!(
        "<b>Trailing stop updated: {}</b>\n\
         New stop: {stop}\n\
         Price: ${:.4}\n\
         Unrealized: {:+.2}%",
        escape_html(&position.symbol),
        position.current_price,
        position.pnl_percent
    )
}

pub fn format_daily_report(report: &DailyReport) -> String {
    format!(
        "<b>Daily report</b>\n\
         Open positions: {}\n\
         Daily PnL: ${:.2}\n\
         Unrealized: ${:.2}\n\
         Win rate: {:.1}% over {} trades",
        report.open_positions,
        report.realized_pnl,
        report.unrealized_pnl,
        report.win_rate * 100.0,
        report.total_trades
    )
}

pub fn format_error(message: &str) -> String {
    format!("<b>Error</b>\n{}", escape_html(message))
}

// ── Fan-out ──

/// Delivers each event to every sink, logging failures.
#[derive(Clone, Default)]
pub struct Notifier {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl Notifier {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    /// Log sink always, Telegram when enabled. A Telegram sink that cannot be
    /// built is reported and skipped.
    pub fn from_config(telegram: &TelegramConfig) -> Self {
        let mut sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(LogSink)];
        if telegram.enabled {
            match TelegramSink::new(telegram) {
                Ok(sink) => sinks.push(Arc::new(sink)),
                Err(e) => warn!(error = %e, "telegram disabled"),
            }
        }
        Self::new(sinks)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each(&self, event: &str, deliver: impl Fn(&dyn AlertSink) -> Result<(), NotifyError>) {
        for sink in &self.sinks {
            if let Err(e) = deliver(sink.as_ref()) {
                warn!(event, error = %e, "notification failed");
            }
        }
    }

    pub fn started(&self) {
        self.each("started", |s| s.started());
    }

    pub fn signal_alert(&self, signal: &Signal, plan: &EntryPlan) {
        self.each("signal", |s| s.signal_alert(signal, plan));
    }

    pub fn hot_coins(&self, coins: &[Ticker]) {
        self.each("hot_coins", |s| s.hot_coins(coins));
    }

    pub fn position_opened(&self, position: &Position, reason: &str) {
        self.each("position_opened", |s| s.position_opened(position, reason));
    }

    pub fn position_closed(&self, position: &Position, trade: &TradeResult, reason: &CloseReason) {
        self.each("position_closed", |s| s.position_closed(position, trade, reason));
    }

    pub fn trailing_stop_moved(&self, position: &Position) {
        self.each("trailing_stop", |s| s.trailing_stop_moved(position));
    }

    pub fn daily_report(&self, report: &DailyReport) {
        self.each("daily_report", |s| s.daily_report(report));
    }

    pub fn error(&self, message: &str) {
        self.each("error", |s| s.error(message));
    }
}
