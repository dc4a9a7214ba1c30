//! Scout CLI: momentum scanner, single-symbol analysis and config check.
//!
//! Commands:
//! - `scan`: scan loop: hot coins, scoring, alerts, optional paper positions
//! - `analyze`: score one symbol and print the signal with its entry plan
//! - `config`: validate the configuration and print its fingerprint
//!
//! Alerts only: no command ever places an order.

mod config;
mod exchange;
mod notify;
mod scanner;
mod synthetic;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use scout_core::data::{AccountSource, MarketData};
use scout_core::domain::Signal;
use scout_core::risk::EntryPlan;
use scout_core::{RiskManager, SignalScorer};

use crate::config::AppConfig;
use crate::exchange::{BinanceClient, CircuitBreaker};
use crate::notify::Notifier;
use crate::scanner::Scanner;
use crate::synthetic::{SyntheticMarket, SYNTHETIC_BALANCE};

#[derive(Parser)]
#[command(
    name = "scout",
    about = "Scout: momentum signal scanner with ATR-based risk envelopes"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./scout.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the market and alert on strong BUY signals.
    Scan {
        /// Run a single cycle and exit.
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Track alerted entries as paper positions and manage their exits.
        #[arg(long, default_value_t = false)]
        paper: bool,

        /// Use the offline synthetic market instead of the exchange.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for the synthetic market.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Score one symbol and print the signal and suggested entry.
    Analyze {
        /// Trading pair, e.g. BTCUSDT.
        symbol: String,

        /// Use the offline synthetic market instead of the exchange.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for the synthetic market.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Validate the configuration and print its fingerprint.
    Config {
        /// Also print the effective engine settings as TOML.
        #[arg(long, default_value_t = false)]
        print: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "scout=info".into()))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            once,
            paper,
            synthetic,
            seed,
        } => run_scan(&config, once, paper, synthetic, seed),
        Commands::Analyze {
            symbol,
            synthetic,
            seed,
        } => run_analyze(&config, &symbol, synthetic, seed),
        Commands::Config { print } => run_config(&config, print),
    }
}

type Sources = (Arc<dyn MarketData>, Arc<dyn AccountSource>);

fn build_sources(config: &AppConfig, synthetic: bool, seed: u64) -> Result<Sources> {
    if synthetic {
        let market = Arc::new(SyntheticMarket::with_default_symbols(seed));
        info!(seed, symbols = market.symbols().len(), "using synthetic market");
        let data: Arc<dyn MarketData> = market.clone();
        let account: Arc<dyn AccountSource> = market;
        return Ok((data, account));
    }

    let breaker = Arc::new(CircuitBreaker::for_exchange());
    let client = Arc::new(
        BinanceClient::new(&config.exchange, breaker).context("failed to create exchange client")?,
    );
    info!(
        base_url = client.base_url(),
        testnet = config.exchange.testnet,
        "using Binance market data"
    );
    if !config.exchange.testnet {
        warn!("connected to Binance mainnet; alerts only, no orders are sent");
    }
    let data: Arc<dyn MarketData> = client.clone();
    let account: Arc<dyn AccountSource> = client;
    Ok((data, account))
}

/// Quote-asset balance, or 0 when the account cannot be read.
fn initial_balance(account: &dyn AccountSource, quote_asset: &str) -> f64 {
    match account.balances() {
        Ok(balances) => {
            let balance = balances.get(quote_asset).copied().unwrap_or(0.0);
            info!(asset = quote_asset, balance, "initial balance");
            balance
        }
        Err(e) => {
            warn!(error = %e, "could not read account balance, drawdown gate disabled");
            0.0
        }
    }
}

fn run_scan(config: &AppConfig, once: bool, paper: bool, synthetic: bool, seed: u64) -> Result<()> {
    let (market, account) = build_sources(config, synthetic, seed)?;
    let engine = config.engine();
    let balance = if synthetic {
        SYNTHETIC_BALANCE
    } else {
        initial_balance(account.as_ref(), &engine.strategy.quote_asset)
    };

    info!(fingerprint = %engine.fingerprint()?, "engine config");
    let mut scanner = Scanner::new(
        market,
        SignalScorer::new(engine.clone()),
        RiskManager::new(engine, balance),
        Notifier::from_config(&config.telegram),
        config.schedule.clone(),
        paper,
        Utc::now(),
    );
    scanner.run(once);
    Ok(())
}

fn run_analyze(config: &AppConfig, symbol: &str, synthetic: bool, seed: u64) -> Result<()> {
    let (market, _) = build_sources(config, synthetic, seed)?;
    let symbol = symbol.to_uppercase();

    let tickers = market.tickers().context("failed to fetch tickers")?;
    let Some(ticker) = tickers.into_iter().find(|t| t.symbol == symbol) else {
        bail!("no ticker for {symbol} on {}", market.name());
    };

    let engine = config.engine();
    let scorer = SignalScorer::new(engine.clone());
    let risk = RiskManager::new(engine, 0.0);
    let signal = scorer.score(&ticker, market.as_ref(), &[])?;
    let plan = risk.plan_entry(&signal);

    print_signal(&signal, &plan);
    if synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
        println!();
    }
    Ok(())
}

fn run_config(config: &AppConfig, print: bool) -> Result<()> {
    let engine = config.engine();
    println!("Config OK");
    println!("Fingerprint:    {}", engine.fingerprint()?);
    println!("Exchange:       {}", config.exchange.base_url());
    println!(
        "Credentials:    {}",
        if config.exchange.has_credentials() { "set" } else { "missing" }
    );
    println!(
        "Telegram:       {}",
        if config.telegram.enabled { "enabled" } else { "disabled" }
    );
    if print {
        println!();
        print!(
            "{}",
            toml::to_string_pretty(&engine).context("failed to render config")?
        );
    }
    Ok(())
}

fn print_signal(signal: &Signal, plan: &EntryPlan) {
    println!();
    println!("=== Signal: {} ===", signal.symbol());
    println!("Action:         {}", signal.action());
    println!("Price:          {:.6}", signal.price());
    println!("Strength:       {:.1}%", signal.strength() * 100.0);
    println!("MTF Score:      {:.1}%", signal.mtf_score() * 100.0);
    println!("RSI:            {:.1}", signal.rsi());
    println!("ATR:            {:.6} ({:.2}%)", signal.atr(), signal.atr_percent());
    println!(
        "Regime:         {} ({:.0}% confidence)",
        signal.regime(),
        signal.regime_confidence() * 100.0
    );

    if !signal.timeframes().is_empty() {
        println!();
        println!("--- Timeframes ---");
        println!(
            "{:<6} {:<10} {:>9} {:>7} {:>12} {:>9}",
            "TF", "Trend", "Strength", "RSI", "MACD Hist", "Momentum"
        );
        for tf in signal.timeframes() {
            println!(
                "{:<6} {:<10} {:>8.0}% {:>7.1} {:>12.6} {:>9.2}",
                tf.timeframe.label(),
                tf.trend.to_string(),
                tf.strength * 100.0,
                tf.rsi,
                tf.macd_histogram,
                tf.momentum_score
            );
        }
    }

    println!();
    println!("--- Rationale ---");
    for line in signal.rationale() {
        println!("  {line}");
    }

    if signal.is_buy() {
        println!();
        println!("--- Entry Plan ---");
        println!("Quantity:       {:.6} (${:.2})", plan.quantity, plan.notional);
        println!(
            "Stop Loss:      {:.6} (-{:.2}%)",
            plan.stop_loss,
            plan.stop_percent()
        );
        println!(
            "Take Profit:    {:.6} (+{:.2}%)",
            plan.take_profit,
            plan.target_percent()
        );
        println!(
            "Risk/Reward:    1:{:.2}{}",
            plan.risk_reward.ratio,
            if plan.risk_reward.acceptable { "" } else { " (below 1.5)" }
        );
        println!("Kelly Fraction: {:.3}", plan.kelly_fraction);
    }
    println!();
}
