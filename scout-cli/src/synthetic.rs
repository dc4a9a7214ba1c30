//! Offline market: seeded random walks standing in for the exchange.
//!
//! Every (symbol, interval) pair is an independent walk seeded from the
//! blake3 hash of the market seed, the symbol and the interval label, so the
//! same seed always produces the same market. Each `tickers()` call moves the
//! clock forward one minute; longer intervals gain a candle once enough
//! minutes have passed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scout_core::data::{AccountSource, DataError, MarketData};
use scout_core::domain::{Candle, Interval, Ticker};

pub const DEFAULT_SYMBOLS: [&str; 8] = [
    "BTCUSDT", "ETHUSDT", "SOLUSDT", "XRPUSDT", "DOGEUSDT", "AVAXUSDT", "LINKUSDT", "ADAUSDT",
];

/// Candles of history available before the first tick.
const HISTORY: i64 = 500;

/// Quote balance reported by the synthetic account.
pub const SYNTHETIC_BALANCE: f64 = 10_000.0;

/// Per-symbol walk parameters, all per minute.
#[derive(Debug, Clone, Copy)]
struct Profile {
    base_price: f64,
    drift: f64,
    volatility: f64,
    quote_volume_per_minute: f64,
}

pub struct SyntheticMarket {
    symbols: Vec<String>,
    seed: u64,
    anchor: DateTime<Utc>,
    minutes: AtomicI64,
}

impl SyntheticMarket {
    pub fn new(symbols: Vec<String>, seed: u64, anchor: DateTime<Utc>) -> Self {
        Self {
            symbols,
            seed,
            anchor,
            minutes: AtomicI64::new(0),
        }
    }

    pub fn with_default_symbols(seed: u64) -> Self {
        Self::new(
            DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            seed,
            Utc::now(),
        )
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Move the clock forward by one minute.
    pub fn advance(&self) {
        self.minutes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.anchor + Duration::minutes(self.minutes.load(Ordering::SeqCst))
    }

    fn rng(&self, symbol: &str, stream: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        hasher.update(stream.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    fn profile(&self, symbol: &str) -> Profile {
        let mut rng = self.rng(symbol, "profile");
        Profile {
            base_price: 10f64.powf(rng.gen_range(-1.0..3.0)),
            drift: rng.gen_range(-0.00005..0.00015),
            volatility: rng.gen_range(0.001..0.004),
            quote_volume_per_minute: rng.gen_range(500.0..5_000.0),
        }
    }

    fn ensure_listed(&self, symbol: &str) -> Result<(), DataError> {
        if self.symbols.iter().any(|s| s == symbol) {
            Ok(())
        } else {
            Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }

    /// The full walk for one interval up to the current clock.
    fn walk(&self, symbol: &str, interval: Interval) -> Vec<Candle> {
        let profile = self.profile(symbol);
        let step = interval.duration();
        let step_minutes = step.num_minutes().max(1);
        let scale = step_minutes as f64;
        let extra = self.minutes.load(Ordering::SeqCst) / step_minutes;
        let total = HISTORY + extra;

        let mut rng = self.rng(symbol, interval.label());
        let mut price = profile.base_price;
        let mut candles = Vec::with_capacity(total as usize);
        for k in 0..total {
            let shock = rng.gen_range(-1.0..1.0) * profile.volatility * scale.sqrt();
            let open = price;
            let close = (open * (1.0 + profile.drift * scale + shock)).max(open * 0.5);
            let wick = profile.volatility * scale.sqrt() * 0.5;
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..wick));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..wick));
            let quote_volume = profile.quote_volume_per_minute * scale * rng.gen_range(0.5..1.5);
            let boost = if close > open { 1.3 } else { 1.0 };
            let open_time = self.anchor + step * (k - HISTORY) as i32;

            candles.push(Candle {
                open_time,
                open,
                high,
                low,
                close,
                volume: quote_volume * boost / close,
                close_time: open_time + step - Duration::milliseconds(1),
            });
            price = close;
        }
        candles
    }
}

impl MarketData for SyntheticMarket {
    fn name(&self) -> &str {
        "synthetic"
    }

    /// 24h figures from the hourly walk; the last price is the 1m close.
    fn tickers(&self) -> Result<Vec<Ticker>, DataError> {
        self.advance();
        let timestamp = self.now();

        self.symbols
            .iter()
            .map(|symbol| -> Result<Ticker, DataError> {
                let hourly = self.walk(symbol, Interval::OneHour);
                let day = &hourly[hourly.len().saturating_sub(24)..];
                let first_open = day.first().map_or(1.0, |c| c.open);
                let last_price = self.current_price(symbol)?;
                let last_hour_close = day.last().map_or(last_price, |c| c.close);

                Ok(Ticker {
                    symbol: symbol.clone(),
                    last_price,
                    price_change_percent: (last_hour_close / first_open - 1.0) * 100.0,
                    quote_volume: day.iter().map(|c| c.volume * c.close).sum(),
                    volume: day.iter().map(|c| c.volume).sum(),
                    timestamp,
                })
            })
            .collect()
    }

    fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        self.ensure_listed(symbol)?;
        let mut candles = self.walk(symbol, interval);
        let keep = limit.min(candles.len());
        Ok(candles.split_off(candles.len() - keep))
    }

    fn current_price(&self, symbol: &str) -> Result<f64, DataError> {
        self.ensure_listed(symbol)?;
        self.walk(symbol, Interval::OneMinute)
            .last()
            .map(|c| c.close)
            .ok_or_else(|| DataError::Insufficient {
                symbol: symbol.to_string(),
                got: 0,
                need: 1,
            })
    }
}

impl AccountSource for SyntheticMarket {
    fn balances(&self) -> Result<HashMap<String, f64>, DataError> {
        Ok(HashMap::from([("USDT".to_string(), SYNTHETIC_BALANCE)]))
    }
}
