//! Market regime classification.
//!
//! volatility  = ATR(14) / close * 100
//! deviation   = |close - SMA20| / SMA20 * 100
//! consistency = share of the last 20 closes above SMA20
//!
//! Rules, first match wins:
//! 1. volatility > 5%                    → Volatile, 0.8
//! 2. consistency > 0.7 or < 0.3         → Trending, |consistency - 0.5| * 2
//! 3. deviation < 2%                     → Ranging, 0.7
//! 4. otherwise                          → Transitioning, 0.5
//!
//! Fewer than 50 candles → Unknown, 0.5.

use serde::{Deserialize, Serialize};

use super::atr::{atr, DEFAULT_ATR_PERIOD};
use super::sma::sma;
use crate::domain::{closes, Candle, Regime};

pub const MIN_REGIME_CANDLES: usize = 50;
const CONSISTENCY_WINDOW: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeReading {
    pub regime: Regime,
    pub confidence: f64,
}

impl RegimeReading {
    pub const UNKNOWN: RegimeReading = RegimeReading {
        regime: Regime::Unknown,
        confidence: 0.5,
    };
}

pub fn classify_regime(candles: &[Candle]) -> RegimeReading {
    if candles.len() < MIN_REGIME_CANDLES {
        return RegimeReading::UNKNOWN;
    }

    let closes = closes(candles);
    let price = closes[closes.len() - 1];
    let sma20 = sma(&closes, CONSISTENCY_WINDOW);
    if price <= 0.0 || sma20 <= 0.0 {
        return RegimeReading::UNKNOWN;
    }

    let volatility = atr(candles, DEFAULT_ATR_PERIOD) / price * 100.0;
    let deviation = (price - sma20).abs() / sma20 * 100.0;
    let above = closes[closes.len() - CONSISTENCY_WINDOW..]
        .iter()
        .filter(|c| **c > sma20)
        .count();
    let consistency = above as f64 / CONSISTENCY_WINDOW as f64;

    if volatility > 5.0 {
        RegimeReading {
            regime: Regime::Volatile,
            confidence: 0.8,
        }
    } else if consistency > 0.7 || consistency < 0.3 {
        RegimeReading {
            regime: Regime::Trending,
            confidence: (consistency - 0.5).abs() * 2.0,
        }
    } else if deviation < 2.0 {
        RegimeReading {
            regime: Regime::Ranging,
            confidence: 0.7,
        }
    } else {
        RegimeReading {
            regime: Regime::Transitioning,
            confidence: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn short_history_is_unknown() {
        let candles = make_candles(&[100.0; 49]);
        assert_eq!(classify_regime(&candles), RegimeReading::UNKNOWN);
    }

    #[test]
    fn step_up_is_trending() {
        // 15 of the last 20 closes sit above SMA20 (102.25)
        let closes: Vec<f64> = (0..60).map(|i| if i < 45 { 100.0 } else { 103.0 }).collect();
        let reading = classify_regime(&make_candles(&closes));
        assert_eq!(reading.regime, Regime::Trending);
        assert_approx(reading.confidence, 0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn straight_line_is_transitioning() {
        // Half the window above a lagging SMA20, 3.8% deviation
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let reading = classify_regime(&make_candles(&closes));
        assert_eq!(reading.regime, Regime::Transitioning);
    }

    #[test]
    fn wide_ranges_are_volatile() {
        // make_candles pads high/low by 1.0; at price 10 that is a 20% range
        let closes: Vec<f64> = (0..60).map(|i| 10.0 + (i % 3) as f64 * 0.1).collect();
        let reading = classify_regime(&make_candles(&closes));
        assert_eq!(reading.regime, Regime::Volatile);
        assert_approx(reading.confidence, 0.8, DEFAULT_EPSILON);
    }

    #[test]
    fn tight_chop_is_ranging() {
        // Alternating closes: half the window above SMA20, near-zero deviation
        let closes: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 1_000.0 } else { 1_001.0 })
            .collect();
        let reading = classify_regime(&make_candles(&closes));
        assert_eq!(reading.regime, Regime::Ranging);
        assert_approx(reading.confidence, 0.7, DEFAULT_EPSILON);
    }
}
