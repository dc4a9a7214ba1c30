//! Trend detector: weighted vote over price, moving-average, oscillator and
//! volume readings.
//!
//! | vote                                   | weight | counted            |
//! |----------------------------------------|--------|--------------------|
//! | close > SMA20                          | 2      | always             |
//! | SMA20 > SMA50                          | 2      | ≥ 50 candles       |
//! | RSI in (50, 70) bull, (30, 50) bear    | 1      | always             |
//! | MACD > signal                          | 2      | always             |
//! | close > Bollinger midpoint             | 1      | always             |
//! | volume spike, direction of last close  | 1      | only on a spike    |
//!
//! strength = bullish weight / counted weight.
//! > 0.65 → Bullish(strength); < 0.35 → Bearish(1 - strength); else Neutral(0.5).
//! Fewer than 20 candles → Neutral(0.5).

use serde::{Deserialize, Serialize};

use super::bollinger::{bollinger, DEFAULT_BAND_PERIOD, DEFAULT_BAND_WIDTH};
use super::macd::macd;
use super::rsi::{rsi, DEFAULT_RSI_PERIOD};
use super::sma::sma;
use super::volume::volume_spike;
use crate::domain::{closes, volumes, Candle, Trend};

pub const MIN_TREND_CANDLES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendReading {
    pub trend: Trend,
    pub strength: f64,
}

impl TrendReading {
    pub const NEUTRAL: TrendReading = TrendReading {
        trend: Trend::Neutral,
        strength: 0.5,
    };
}

#[derive(Default)]
struct Vote {
    bullish: u32,
    total: u32,
}

impl Vote {
    fn cast(&mut self, bullish: bool, weight: u32) {
        if bullish {
            self.bullish += weight;
        }
        self.total += weight;
    }
}

pub fn detect_trend(candles: &[Candle]) -> TrendReading {
    if candles.len() < MIN_TREND_CANDLES {
        return TrendReading::NEUTRAL;
    }

    let closes = closes(candles);
    let volumes = volumes(candles);
    let n = closes.len();
    let price = closes[n - 1];

    let sma20 = sma(&closes, 20);
    let rsi = rsi(&closes, DEFAULT_RSI_PERIOD);
    let macd = macd(&closes);
    let bands = bollinger(&closes, DEFAULT_BAND_PERIOD, DEFAULT_BAND_WIDTH);
    let spike = volume_spike(&volumes[..n - 1], volumes[n - 1]);

    let mut vote = Vote::default();
    vote.cast(price > sma20, 2);
    if n >= 50 {
        vote.cast(sma20 > sma(&closes, 50), 2);
    }
    // A neutral RSI still counts toward the total
    vote.cast(rsi > 50.0 && rsi < 70.0, 1);
    vote.cast(macd.macd > macd.signal, 2);
    vote.cast(price > bands.midpoint(), 1);
    if spike.spike && spike.ratio > 2.0 {
        vote.cast(price > closes[n - 2], 1);
    }

    let strength = vote.bullish as f64 / vote.total as f64;
    if strength > 0.65 {
        TrendReading {
            trend: Trend::Bullish,
            strength,
        }
    } else if strength < 0.35 {
        TrendReading {
            trend: Trend::Bearish,
            strength: 1.0 - strength,
        }
    } else {
        TrendReading::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn short_history_is_neutral() {
        let candles = make_candles(&[1.0; 19]);
        assert_eq!(detect_trend(&candles), TrendReading::NEUTRAL);
    }

    #[test]
    fn steady_rally_is_bullish() {
        // Steps alternate +1.0 / -0.6, keeping RSI near 62
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + i as f64 * 0.2 + if i % 2 == 1 { 0.8 } else { 0.0 })
            .collect();
        let reading = detect_trend(&make_candles(&closes));
        assert_eq!(reading.trend, Trend::Bullish);
        assert!(reading.strength > 0.65 && reading.strength <= 1.0);
    }

    #[test]
    fn steady_decline_is_bearish() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let reading = detect_trend(&make_candles(&closes));
        assert_eq!(reading.trend, Trend::Bearish);
        assert!(reading.strength > 0.65);
    }

    #[test]
    fn strength_stays_in_unit_interval() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 50.0 + (i as f64 * 0.9).sin() * 3.0)
            .collect();
        let reading = detect_trend(&make_candles(&closes));
        assert!((0.0..=1.0).contains(&reading.strength));
    }
}
