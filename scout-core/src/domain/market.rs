//! Closed classifications produced by the indicator layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction reported by the trend detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

/// Market regime used to adapt the acceptance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Trending,
    Ranging,
    Volatile,
    Transitioning,
    Unknown,
}

/// Up-bar vs down-bar volume balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumePhase {
    Accumulation,
    Distribution,
    Neutral,
}

/// Where the last price sits relative to the Bollinger envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandPosition {
    Above,
    Inside,
    Below,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trend::Bullish => "BULLISH",
            Trend::Bearish => "BEARISH",
            Trend::Neutral => "NEUTRAL",
        })
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Regime::Trending => "TRENDING",
            Regime::Ranging => "RANGING",
            Regime::Volatile => "VOLATILE",
            Regime::Transitioning => "TRANSITIONING",
            Regime::Unknown => "UNKNOWN",
        })
    }
}

impl fmt::Display for VolumePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VolumePhase::Accumulation => "ACCUMULATION",
            VolumePhase::Distribution => "DISTRIBUTION",
            VolumePhase::Neutral => "NEUTRAL",
        })
    }
}

impl fmt::Display for BandPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BandPosition::Above => "ABOVE",
            BandPosition::Inside => "INSIDE",
            BandPosition::Below => "BELOW",
        })
    }
}
