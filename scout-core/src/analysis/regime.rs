//! Regime classifier with the regime-adaptive acceptance threshold.

use crate::domain::{Candle, Regime};
use crate::indicators::{classify_regime, RegimeReading};

/// Minimum signal strength required before a BUY is issued, by regime.
pub fn acceptance_threshold(regime: Regime) -> f64 {
    match regime {
        Regime::Volatile => 0.75,
        Regime::Trending => 0.55,
        Regime::Ranging => 0.70,
        Regime::Transitioning | Regime::Unknown => 0.60,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegimeClassifier;

impl RegimeClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, candles: &[Candle]) -> RegimeReading {
        classify_regime(candles)
    }

    pub fn threshold(&self, regime: Regime) -> f64 {
        acceptance_threshold(regime)
    }
}
