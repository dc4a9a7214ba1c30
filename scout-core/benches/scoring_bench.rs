//! Criterion benchmarks for the scan hot paths.
//!
//! Benchmarks:
//! 1. MACD: linear-time pass vs prefix replay
//! 2. Candle indicators (ATR, regime, volume profile)
//! 3. Full ticker scoring against an in-memory market
//! 4. Position refresh (ratchet + exit checks) over a price path

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use scout_core::analysis::SignalScorer;
use scout_core::config::EngineConfig;
use scout_core::data::{DataError, MarketData};
use scout_core::domain::{Candle, Interval, Side, Ticker};
use scout_core::indicators::{atr, classify_regime, macd, macd_replay, volume_profile};
use scout_core::RiskManager;

// ── Helpers ──────────────────────────────────────────────────────────

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
}

fn close_at(i: usize) -> f64 {
    100.0 + (i as f64 * 0.1).sin() * 5.0 + i as f64 * 0.05
}

fn make_closes(n: usize) -> Vec<f64> {
    (0..n).map(close_at).collect()
}

fn make_candles(interval: Interval, n: usize) -> Vec<Candle> {
    let step = interval.duration();
    (0..n)
        .map(|i| {
            let close = close_at(i);
            let open = if i == 0 { close } else { close_at(i - 1) };
            let open_time = t0() + step * i as i32;
            Candle {
                open_time,
                open,
                high: open.max(close) + 0.4,
                low: open.min(close) - 0.4,
                close,
                volume: 1_000.0 + (i % 7) as f64 * 150.0,
                close_time: open_time + step - Duration::seconds(1),
            }
        })
        .collect()
}

struct StaticMarket;

impl MarketData for StaticMarket {
    fn name(&self) -> &str {
        "static"
    }

    fn tickers(&self) -> Result<Vec<Ticker>, DataError> {
        Ok(Vec::new())
    }

    fn candles(
        &self,
        _symbol: &str,
        interval: Interval,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        Ok(make_candles(interval, limit))
    }

    fn current_price(&self, _symbol: &str) -> Result<f64, DataError> {
        Ok(close_at(99))
    }
}

// ── 1. MACD ──────────────────────────────────────────────────────────

fn bench_macd(c: &mut Criterion) {
    let mut group = c.benchmark_group("macd");

    for &len in &[50, 100, 500] {
        let closes = make_closes(len);
        group.bench_with_input(BenchmarkId::new("linear", len), &closes, |b, closes| {
            b.iter(|| macd(black_box(closes)));
        });
        group.bench_with_input(BenchmarkId::new("replay", len), &closes, |b, closes| {
            b.iter(|| macd_replay(black_box(closes)));
        });
    }

    group.finish();
}

// ── 2. Candle Indicators ─────────────────────────────────────────────

fn bench_candle_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("candle_indicators");
    let candles = make_candles(Interval::FiveMinutes, 100);

    group.bench_function("atr_14", |b| b.iter(|| atr(black_box(&candles), 14)));
    group.bench_function("classify_regime", |b| {
        b.iter(|| classify_regime(black_box(&candles)))
    });
    group.bench_function("volume_profile_20", |b| {
        b.iter(|| volume_profile(black_box(&candles), 20))
    });

    group.finish();
}

// ── 3. Scoring ───────────────────────────────────────────────────────

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let market = StaticMarket;
    let ticker = Ticker {
        symbol: "BENCHUSDT".into(),
        last_price: close_at(100),
        price_change_percent: 4.5,
        quote_volume: 3_000_000.0,
        volume: 1_200.0,
        timestamp: t0(),
    };

    for &mtf in &[false, true] {
        let mut config = EngineConfig::default();
        config.strategy.use_multi_timeframe = mtf;
        let scorer = SignalScorer::new(config);
        // Warm the history so every iteration takes the same path
        let _ = scorer.score(&ticker, &market, &[]);

        let label = if mtf { "multi_timeframe" } else { "single_timeframe" };
        group.bench_function(label, |b| {
            b.iter(|| scorer.score(black_box(&ticker), &market, &[]))
        });
    }

    group.finish();
}

// ── 4. Position Refresh ──────────────────────────────────────────────

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_refresh");
    let rm = RiskManager::new(EngineConfig::default(), 1_000.0);
    let path = make_closes(1_000);

    group.bench_function("1000_ticks", |b| {
        b.iter(|| {
            let plan = rm.plan("BENCHUSDT", Side::Buy, path[0], 0.7, 1.5);
            let mut position = rm.open_position(&plan, t0());
            for (i, &price) in path.iter().enumerate() {
                let update = rm.refresh(&mut position, price, t0() + Duration::seconds(i as i64));
                black_box(&update);
            }
            black_box(&position);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_macd,
    bench_candle_indicators,
    bench_scoring,
    bench_refresh
);
criterion_main!(benches);
