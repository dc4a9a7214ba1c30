//! Volume readings: spike detection and up/down volume profile.
//!
//! Spike: current volume / mean of prior volumes above 1e-6.
//! Fewer than 5 usable samples (or a negligible mean) → no spike, ratio 1.0.
//! Ratio capped at 10; spike when ratio > 2.
//!
//! Profile: over the last N candles, buy pressure = up-bar volume / total.
//! > 0.65 → Accumulation(pressure); < 0.35 → Distribution(1 - pressure);
//! otherwise, or with too few candles or zero volume → Neutral(0.5).

use serde::{Deserialize, Serialize};

use super::sma::mean;
use crate::domain::{Candle, VolumePhase};

const NOISE_FLOOR: f64 = 1e-6;
const MIN_VALID_SAMPLES: usize = 5;
const RATIO_CAP: f64 = 10.0;
const SPIKE_RATIO: f64 = 2.0;

pub const DEFAULT_PROFILE_PERIODS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpike {
    pub spike: bool,
    pub ratio: f64,
}

impl VolumeSpike {
    const NONE: VolumeSpike = VolumeSpike {
        spike: false,
        ratio: 1.0,
    };
}

pub fn volume_spike(prior: &[f64], current: f64) -> VolumeSpike {
    let valid: Vec<f64> = prior.iter().copied().filter(|v| *v > NOISE_FLOOR).collect();
    if valid.len() < MIN_VALID_SAMPLES {
        return VolumeSpike::NONE;
    }

    let average = mean(&valid);
    if average < NOISE_FLOOR {
        return VolumeSpike::NONE;
    }

    let ratio = (current / average).min(RATIO_CAP);
    VolumeSpike {
        spike: ratio > SPIKE_RATIO,
        ratio,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub phase: VolumePhase,
    pub strength: f64,
}

impl VolumeProfile {
    pub const NEUTRAL: VolumeProfile = VolumeProfile {
        phase: VolumePhase::Neutral,
        strength: 0.5,
    };
}

pub fn volume_profile(candles: &[Candle], periods: usize) -> VolumeProfile {
    if periods == 0 || candles.len() < periods {
        return VolumeProfile::NEUTRAL;
    }

    let (up, down) = candles[candles.len() - periods..]
        .iter()
        .fold((0.0, 0.0), |(up, down), c| {
            if c.is_up() {
                (up + c.volume, down)
            } else {
                (up, down + c.volume)
            }
        });

    let total = up + down;
    if total == 0.0 {
        return VolumeProfile::NEUTRAL;
    }

    let pressure = up / total;
    if pressure > 0.65 {
        VolumeProfile {
            phase: VolumePhase::Accumulation,
            strength: pressure,
        }
    } else if pressure < 0.35 {
        VolumeProfile {
            phase: VolumePhase::Distribution,
            strength: 1.0 - pressure,
        }
    } else {
        VolumeProfile::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn spike_detected() {
        let prior = [100.0; 10];
        let reading = volume_spike(&prior, 350.0);
        assert!(reading.spike);
        assert_approx(reading.ratio, 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ratio_capped() {
        let reading = volume_spike(&[1.0; 8], 1_000.0);
        assert_eq!(reading.ratio, 10.0);
        assert!(reading.spike);
    }

    #[test]
    fn near_zero_samples_ignored() {
        // Only four usable samples
        let prior = [0.0, 1e-9, 100.0, 100.0, 100.0, 100.0, 0.0];
        assert_eq!(volume_spike(&prior, 900.0), VolumeSpike::NONE);
    }

    #[test]
    fn ratio_two_is_not_a_spike() {
        let reading = volume_spike(&[50.0; 6], 100.0);
        assert!(!reading.spike);
        assert_approx(reading.ratio, 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rising_closes_accumulate() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let profile = volume_profile(&make_candles(&closes), 20);
        assert_eq!(profile.phase, VolumePhase::Accumulation);
        assert_approx(profile.strength, 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn falling_closes_distribute() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 - i as f64).collect();
        let profile = volume_profile(&make_candles(&closes), 20);
        assert_eq!(profile.phase, VolumePhase::Distribution);
    }

    #[test]
    fn profile_needs_enough_candles() {
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        assert_eq!(volume_profile(&candles, 20), VolumeProfile::NEUTRAL);
    }

    #[test]
    fn zero_volume_is_neutral() {
        let mut candles = make_candles(&[1.0, 2.0, 3.0, 4.0]);
        for c in &mut candles {
            c.volume = 0.0;
        }
        assert_eq!(volume_profile(&candles, 4), VolumeProfile::NEUTRAL);
    }
}
