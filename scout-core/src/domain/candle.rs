//! Candle: the OHLCV bar delivered by the market data source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// OHLCV bar for one symbol over one interval.
///
/// Immutable once produced by the data source; every indicator reads it
/// without modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLCV sanity check: high >= low, high >= open/close, positive prices.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }

    /// Close above open.
    pub fn is_up(&self) -> bool {
        self.close > self.open
    }
}

/// Closing prices, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Volumes, oldest first.
pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.volume).collect()
}

/// Check a candle series delivered for `symbol`.
///
/// Every bar must be sane and open times must be strictly increasing.
pub fn validate_series(symbol: &str, candles: &[Candle]) -> Result<(), EngineError> {
    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_sane() {
            return Err(EngineError::MalformedCandle {
                symbol: symbol.to_string(),
                index,
            });
        }
        if index > 0 && candle.open_time <= candles[index - 1].open_time {
            return Err(EngineError::NonMonotonicCandles {
                symbol: symbol.to_string(),
                index,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample_candle(minute: i64) -> Candle {
        let open_time =
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::minutes(minute);
        Candle {
            open_time,
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 5_000.0,
            close_time: open_time + Duration::seconds(59),
        }
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle(0).is_sane());
        assert!(sample_candle(0).is_up());
    }

    #[test]
    fn candle_detects_void() {
        let mut candle = sample_candle(0);
        candle.open = f64::NAN;
        assert!(candle.is_void());
        assert!(!candle.is_sane());
    }

    #[test]
    fn candle_detects_inverted_range() {
        let mut candle = sample_candle(0);
        candle.high = 97.0;
        assert!(!candle.is_sane());
    }

    #[test]
    fn validate_accepts_ordered_series() {
        let series: Vec<Candle> = (0..5).map(sample_candle).collect();
        assert!(validate_series("BTCUSDT", &series).is_ok());
    }

    #[test]
    fn validate_rejects_out_of_order_timestamps() {
        let series = vec![sample_candle(0), sample_candle(2), sample_candle(1)];
        assert_eq!(
            validate_series("BTCUSDT", &series),
            Err(EngineError::NonMonotonicCandles {
                symbol: "BTCUSDT".into(),
                index: 2
            })
        );
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut bad = sample_candle(1);
        bad.low = -1.0;
        let series = vec![sample_candle(0), bad];
        assert!(matches!(
            validate_series("BTCUSDT", &series),
            Err(EngineError::MalformedCandle { index: 1, .. })
        ));
    }
}
