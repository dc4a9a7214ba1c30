//! Indicator library.
//!
//! Pure functions over closing prices or candles. None of them fail: on
//! insufficient data each returns a documented neutral value (RSI 50,
//! Neutral trend, Unknown regime, zero bands) so callers can proceed.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod levels;
pub mod macd;
pub mod momentum;
pub mod regime;
pub mod rsi;
pub mod sma;
pub mod trend;
pub mod volume;

pub use atr::{atr, true_range, DEFAULT_ATR_PERIOD};
pub use bollinger::{bollinger, Bands, DEFAULT_BAND_PERIOD, DEFAULT_BAND_WIDTH};
pub use ema::{ema, ema_series, EmaAccumulator};
pub use levels::{support_resistance, vwap, Levels};
pub use macd::{macd, macd_replay, Macd};
pub use momentum::momentum_score;
pub use regime::{classify_regime, RegimeReading};
pub use rsi::{rsi, DEFAULT_RSI_PERIOD};
pub use sma::{mean, sma};
pub use trend::{detect_trend, TrendReading};
pub use volume::{volume_profile, volume_spike, VolumeProfile, VolumeSpike, DEFAULT_PROFILE_PERIODS};

/// Create synthetic one-minute candles from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    use chrono::{Duration, TimeZone, Utc};

    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let open_time = base + Duration::minutes(i as i64);
            Candle {
                open_time,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                close_time: open_time + Duration::seconds(59),
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
