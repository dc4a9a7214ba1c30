//! Sizing and stop-distance rules.
//!
//! All distances are fractions of the entry price (0.02 means 2%).

use serde::{Deserialize, Serialize};

const MIN_SIZE_FACTOR: f64 = 0.3;
const MAX_SIZE_FACTOR: f64 = 1.5;

const ATR_STOP_MULTIPLE: f64 = 2.0;
const MIN_STOP: f64 = 0.015;
const MAX_STOP: f64 = 0.04;

const MIN_TARGET: f64 = 0.03;
const MAX_TARGET: f64 = 0.10;

pub const MIN_ACCEPTABLE_RR: f64 = 1.5;

/// Strong signals trade the full base size, weaker ones less.
pub fn strength_multiplier(strength: f64) -> f64 {
    if strength >= 0.9 {
        1.0
    } else if strength >= 0.7 {
        0.75
    } else {
        0.5
    }
}

/// Shrink size as ATR% grows.
pub fn volatility_multiplier(atr_percent: f64) -> f64 {
    if atr_percent > 5.0 {
        0.5
    } else if atr_percent > 3.0 {
        0.75
    } else {
        1.0
    }
}

/// Last three trades: all wins 1.2, all losses 0.6, otherwise (or unknown) 1.0.
pub fn performance_multiplier(wins_in_last_three: Option<usize>) -> f64 {
    match wins_in_last_three {
        Some(3) => 1.2,
        Some(0) => 0.6,
        _ => 1.0,
    }
}

/// Quote-currency size after multipliers, clamped to [0.3, 1.5] x base.
pub fn adjusted_size(base: f64, strength: f64, atr_percent: f64, performance: f64) -> f64 {
    let size = base * strength_multiplier(strength) * volatility_multiplier(atr_percent) * performance;
    size.clamp(base * MIN_SIZE_FACTOR, base * MAX_SIZE_FACTOR)
}

/// 2 x ATR / price bounded to [1.5%, 4%], or the static percentage without ATR.
pub fn stop_distance(entry: f64, atr: f64, static_percent: f64) -> f64 {
    if atr > 0.0 && entry > 0.0 {
        (ATR_STOP_MULTIPLE * atr / entry).clamp(MIN_STOP, MAX_STOP)
    } else {
        static_percent / 100.0
    }
}

/// Configured take-profit scaled by signal strength, bounded to [3%, 10%].
pub fn target_distance(take_profit_percent: f64, strength: f64) -> f64 {
    let multiplier = if strength >= 0.9 {
        1.5
    } else if strength < 0.7 {
        0.75
    } else {
        1.0
    };
    (take_profit_percent / 100.0 * multiplier).clamp(MIN_TARGET, MAX_TARGET)
}

/// Trailing distance: configured percentage, tightened to 1.25% beyond 5%
/// profit and to 1% beyond 8%.
pub fn trailing_distance(trailing_percent: f64, profit: f64) -> f64 {
    if profit > 0.08 {
        0.01
    } else if profit > 0.05 {
        0.0125
    } else {
        trailing_percent / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReward {
    pub ratio: f64,
    pub acceptable: bool,
}

/// reward / risk; acceptable at 1.5 or better. Zero risk → (0, false).
pub fn risk_reward(entry: f64, stop_loss: f64, take_profit: f64) -> RiskReward {
    let risk = (entry - stop_loss).abs();
    if risk == 0.0 {
        return RiskReward {
            ratio: 0.0,
            acceptable: false,
        };
    }
    let ratio = (take_profit - entry).abs() / risk;
    RiskReward {
        ratio,
        acceptable: ratio >= MIN_ACCEPTABLE_RR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn strength_tiers() {
        assert_eq!(strength_multiplier(0.95), 1.0);
        assert_eq!(strength_multiplier(0.9), 1.0);
        assert_eq!(strength_multiplier(0.75), 0.75);
        assert_eq!(strength_multiplier(0.6), 0.5);
    }

    #[test]
    fn volatility_tiers() {
        assert_eq!(volatility_multiplier(6.0), 0.5);
        assert_eq!(volatility_multiplier(4.0), 0.75);
        assert_eq!(volatility_multiplier(3.0), 1.0);
    }

    #[test]
    fn performance_tiers() {
        assert_eq!(performance_multiplier(None), 1.0);
        assert_eq!(performance_multiplier(Some(3)), 1.2);
        assert_eq!(performance_multiplier(Some(0)), 0.6);
        assert_eq!(performance_multiplier(Some(2)), 1.0);
    }

    #[test]
    fn size_clamped_to_floor() {
        // 100 * 0.5 * 0.5 * 0.6 = 15 → floor 30
        assert!(approx(adjusted_size(100.0, 0.5, 8.0, 0.6), 30.0));
    }

    #[test]
    fn size_unclamped_in_band() {
        assert!(approx(adjusted_size(100.0, 0.95, 1.0, 1.2), 120.0));
        assert!(approx(adjusted_size(100.0, 0.8, 4.0, 1.0), 56.25));
    }

    #[test]
    fn stop_distance_bounds() {
        // 2 * 0.5 / 100 = 1% → 1.5%
        assert!(approx(stop_distance(100.0, 0.5, 2.0), 0.015));
        // 2 * 1.5 / 100 = 3%
        assert!(approx(stop_distance(100.0, 1.5, 2.0), 0.03));
        // 2 * 5 / 100 = 10% → 4%
        assert!(approx(stop_distance(100.0, 5.0, 2.0), 0.04));
        // No ATR: static
        assert!(approx(stop_distance(100.0, 0.0, 2.5), 0.025));
    }

    #[test]
    fn target_distance_scaling() {
        assert!(approx(target_distance(5.0, 0.95), 0.075));
        assert!(approx(target_distance(5.0, 0.8), 0.05));
        assert!(approx(target_distance(5.0, 0.6), 0.0375));
        assert!(approx(target_distance(2.0, 0.6), 0.03));
        assert!(approx(target_distance(8.0, 0.95), 0.10));
    }

    #[test]
    fn trailing_distance_tightens() {
        assert!(approx(trailing_distance(2.0, 0.03), 0.02));
        assert!(approx(trailing_distance(2.0, 0.06), 0.0125));
        assert!(approx(trailing_distance(2.0, 0.09), 0.01));
    }

    #[test]
    fn risk_reward_examples() {
        let good = risk_reward(100.0, 98.0, 105.0);
        assert!(approx(good.ratio, 2.5));
        assert!(good.acceptable);

        let poor = risk_reward(100.0, 98.0, 102.0);
        assert!(approx(poor.ratio, 1.0));
        assert!(!poor.acceptable);
    }

    #[test]
    fn risk_reward_zero_risk() {
        assert_eq!(
            risk_reward(100.0, 100.0, 110.0),
            RiskReward {
                ratio: 0.0,
                acceptable: false
            }
        );
    }
}
