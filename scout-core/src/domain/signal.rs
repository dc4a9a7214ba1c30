//! Scoring output: the per-symbol trading signal and its timeframe breakdown.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::interval::Interval;
use super::market::{BandPosition, Regime, Trend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Buy => "BUY",
            Action::Hold => "HOLD",
        })
    }
}

/// Indicator readings for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeAnalysis {
    pub timeframe: Interval,
    pub trend: Trend,
    /// Trend strength in [0, 1].
    pub strength: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub atr: f64,
    pub momentum_score: f64,
    pub band_position: BandPosition,
}

/// Scorer verdict for one symbol at one point in time.
///
/// Only the scorer builds signals; everything else reads them through the
/// accessors. Carries ATR and regime so the risk manager can size and stop
/// without recomputing indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub(crate) symbol: String,
    pub(crate) action: Action,
    pub(crate) price: f64,
    pub(crate) strength: f64,
    pub(crate) mtf_score: f64,
    pub(crate) rsi: f64,
    pub(crate) atr: f64,
    pub(crate) regime: Regime,
    pub(crate) regime_confidence: f64,
    pub(crate) rationale: Vec<String>,
    pub(crate) timeframes: Vec<TimeframeAnalysis>,
    pub(crate) timestamp: DateTime<Utc>,
}

impl Signal {
    /// A HOLD with a single reason and neutral readings.
    pub(crate) fn hold(
        symbol: &str,
        price: f64,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            action: Action::Hold,
            price,
            strength: 0.0,
            mtf_score: 0.5,
            rsi: 50.0,
            atr: 0.0,
            regime: Regime::Unknown,
            regime_confidence: 0.5,
            rationale: vec![reason.into()],
            timeframes: Vec::new(),
            timestamp,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn is_buy(&self) -> bool {
        self.action == Action::Buy
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    /// Checklist score in [0, 1].
    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn mtf_score(&self) -> f64 {
        self.mtf_score
    }

    pub fn rsi(&self) -> f64 {
        self.rsi
    }

    pub fn atr(&self) -> f64 {
        self.atr
    }

    /// ATR as a percentage of price; 0 when either is unknown.
    pub fn atr_percent(&self) -> f64 {
        if self.price > 0.0 {
            self.atr / self.price * 100.0
        } else {
            0.0
        }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn regime_confidence(&self) -> f64 {
        self.regime_confidence
    }

    pub fn rationale(&self) -> &[String] {
        &self.rationale
    }

    pub fn timeframes(&self) -> &[TimeframeAnalysis] {
        &self.timeframes
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Rationale joined into one line.
    pub fn summary(&self) -> String {
        self.rationale.join("; ")
    }

    /// True when the rationale mentions `needle` (case-insensitive).
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.rationale
            .iter()
            .any(|r| r.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_has_neutral_readings() {
        let signal = Signal::hold("BTCUSDT", 100.0, "already positioned", Utc::now());
        assert_eq!(signal.action(), Action::Hold);
        assert_eq!(signal.strength(), 0.0);
        assert_eq!(signal.regime(), Regime::Unknown);
        assert!(signal.mentions("Already"));
        assert_eq!(signal.summary(), "already positioned");
    }

    #[test]
    fn atr_percent_guards_zero_price() {
        let mut signal = Signal::hold("BTCUSDT", 0.0, "x", Utc::now());
        signal.atr = 3.0;
        assert_eq!(signal.atr_percent(), 0.0);
        signal.price = 150.0;
        assert!((signal.atr_percent() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn signal_serializes_action_label() {
        let signal = Signal::hold("BTCUSDT", 1.0, "x", Utc::now());
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["action"], "HOLD");
        assert_eq!(json["regime"], "UNKNOWN");
    }
}
