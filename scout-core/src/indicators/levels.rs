//! Price levels: volume-weighted average price and range extremes.

use serde::{Deserialize, Serialize};

use crate::domain::Candle;

const MIN_LEVEL_CANDLES: usize = 20;

/// VWAP over typical price (high + low + close) / 3. 0 when there is no volume.
pub fn vwap(candles: &[Candle]) -> f64 {
    let (weighted, volume) = candles.iter().fold((0.0, 0.0), |(w, v), c| {
        let typical = (c.high + c.low + c.close) / 3.0;
        (w + typical * c.volume, v + c.volume)
    });
    if volume == 0.0 {
        0.0
    } else {
        weighted / volume
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub support: f64,
    pub resistance: f64,
}

/// Lowest low and highest high of the series; zeros under 20 candles.
pub fn support_resistance(candles: &[Candle]) -> Levels {
    if candles.len() < MIN_LEVEL_CANDLES {
        return Levels::default();
    }
    candles.iter().fold(
        Levels {
            support: f64::INFINITY,
            resistance: f64::NEG_INFINITY,
        },
        |acc, c| Levels {
            support: acc.support.min(c.low),
            resistance: acc.resistance.max(c.high),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn vwap_weights_by_volume() {
        let mut candles = make_candles(&[10.0, 20.0]);
        // typical prices: (11+9+10)/3 = 10, (21+9+20)/3 = 50/3
        candles[1].volume = 3_000.0;
        let expected = (10.0 * 1_000.0 + 50.0 / 3.0 * 3_000.0) / 4_000.0;
        assert_approx(vwap(&candles), expected, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_without_volume_is_zero() {
        assert_eq!(vwap(&[]), 0.0);
    }

    #[test]
    fn levels_span_the_range() {
        let closes: Vec<f64> = (0..25).map(|i| 50.0 + (i % 7) as f64).collect();
        let levels = support_resistance(&make_candles(&closes));
        assert_approx(levels.support, 49.0, DEFAULT_EPSILON);
        assert_approx(levels.resistance, 57.0, DEFAULT_EPSILON);
    }

    #[test]
    fn levels_need_twenty_candles() {
        assert_eq!(support_resistance(&make_candles(&[1.0; 5])), Levels::default());
    }
}
