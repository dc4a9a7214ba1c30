//! Entry checklist.
//!
//! | criterion                                   | points        |
//! |---------------------------------------------|---------------|
//! | 24h change ≥ min change                     | 15            |
//! | quote volume ≥ min volume (+5 spike > 1.5x) | 15 + 5        |
//! | accumulation phase                          | 5             |
//! | RSI 40–75 and not extreme (+5 within 45–65) | 10 + 5        |
//! | MTF > 0.50 (+10 above 0.65)                 | 10 + 10       |
//! | price > 0.98 × SMA20                        | 5             |
//! | EMA12 > EMA26                               | 5             |
//! | MACD > signal and histogram > 0             | 10            |
//! | inside Bollinger bands, above the midpoint  | 5             |
//! | Trending/Transitioning with confidence > 0.6| 10            |
//!
//! A Volatile regime costs 5 points and a Ranging one 3. The maximum is 110;
//! strength = points / 110 clamped to [0, 1].

use serde::{Deserialize, Serialize};

use crate::config::StrategyConfig;
use crate::domain::{Regime, VolumePhase};
use crate::indicators::{Bands, Macd, RegimeReading, VolumeProfile, VolumeSpike};

pub const MAX_POINTS: f64 = 110.0;

const SMA_TOLERANCE: f64 = 0.98;
const SPIKE_CONFIRMATION: f64 = 1.5;
const HIGH_REGIME_CONFIDENCE: f64 = 0.6;

/// Everything the checklist looks at, already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringInputs {
    pub price: f64,
    pub price_change_percent: f64,
    pub quote_volume: f64,
    pub volume_spike: VolumeSpike,
    pub volume_profile: VolumeProfile,
    pub rsi: f64,
    pub sma20: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub macd: Macd,
    pub bands: Bands,
    pub mtf_score: f64,
    pub regime: RegimeReading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub points: f64,
    pub strength: f64,
    pub satisfied: Vec<String>,
    pub unmet: Vec<String>,
}

impl ScoreCard {
    fn award(&mut self, points: f64, reason: String) {
        self.points += points;
        self.satisfied.push(reason);
    }

    fn miss(&mut self, reason: String) {
        self.unmet.push(reason);
    }
}

/// RSI at or beyond 5/95 vetoes a BUY whatever the score.
pub fn is_extreme_rsi(rsi: f64) -> bool {
    rsi <= 5.0 || rsi >= 95.0
}

pub fn evaluate(inputs: &ScoringInputs, config: &StrategyConfig) -> ScoreCard {
    let mut card = ScoreCard {
        points: 0.0,
        strength: 0.0,
        satisfied: Vec::new(),
        unmet: Vec::new(),
    };

    let change = inputs.price_change_percent;
    if change >= config.min_price_change {
        card.award(15.0, format!("momentum {change:+.2}%"));
    } else {
        card.miss(format!("weak momentum ({change:.2}%)"));
    }

    let volume = inputs.quote_volume;
    if volume >= config.min_volume {
        card.award(15.0, format!("volume ${volume:.0}"));
        let spike = inputs.volume_spike;
        if spike.spike && spike.ratio > SPIKE_CONFIRMATION {
            card.award(5.0, format!("{:.1}x volume spike", spike.ratio));
        }
    } else {
        card.miss(format!("low volume (${volume:.0})"));
    }

    if inputs.volume_profile.phase == VolumePhase::Accumulation {
        card.award(
            5.0,
            format!(
                "accumulation phase ({:.0}% buy pressure)",
                inputs.volume_profile.strength * 100.0
            ),
        );
    }

    let rsi = inputs.rsi;
    let healthy = (40.0..=75.0).contains(&rsi);
    if healthy && !is_extreme_rsi(rsi) {
        if (45.0..=65.0).contains(&rsi) {
            card.award(15.0, format!("optimal RSI ({rsi:.1})"));
        } else {
            card.award(10.0, format!("healthy RSI ({rsi:.1})"));
        }
    } else {
        card.miss(format!("poor RSI ({rsi:.1})"));
    }

    let mtf = inputs.mtf_score;
    if mtf > 0.65 {
        card.award(20.0, format!("strong multi-timeframe trend ({mtf:.2})"));
    } else if mtf > 0.50 {
        card.award(10.0, format!("bullish multi-timeframe trend ({mtf:.2})"));
    } else {
        card.miss(format!("multi-timeframe bearish ({mtf:.2})"));
    }

    if inputs.price > inputs.sma20 * SMA_TOLERANCE {
        card.award(5.0, "above SMA20".to_string());
    } else {
        card.miss("below SMA20".to_string());
    }

    if inputs.ema12 > inputs.ema26 {
        card.award(5.0, "bullish EMA crossover".to_string());
    } else {
        card.miss("EMA12 below EMA26".to_string());
    }

    if inputs.macd.is_bullish() {
        card.award(10.0, "MACD bullish".to_string());
    } else {
        card.miss("MACD not bullish".to_string());
    }

    let bands = inputs.bands;
    let inside = inputs.price > bands.lower && inputs.price < bands.upper;
    if inside && inputs.price > bands.middle {
        card.award(5.0, "upper half of Bollinger bands".to_string());
    }

    let regime = inputs.regime;
    let favorable = matches!(regime.regime, Regime::Trending | Regime::Transitioning);
    if favorable && regime.confidence > HIGH_REGIME_CONFIDENCE {
        card.award(
            10.0,
            format!("{} regime ({:.0}%)", regime.regime, regime.confidence * 100.0),
        );
    } else {
        match regime.regime {
            Regime::Volatile => {
                card.points -= 5.0;
                card.miss("volatile market (-5pts)".to_string());
            }
            Regime::Ranging => {
                card.points -= 3.0;
                card.miss("ranging market (-3pts)".to_string());
            }
            Regime::Trending | Regime::Transitioning => card.miss(format!(
                "low-confidence {} regime ({:.0}%)",
                regime.regime,
                regime.confidence * 100.0
            )),
            Regime::Unknown => card.miss("unfavorable regime (UNKNOWN)".to_string()),
        }
    }

    card.strength = (card.points / MAX_POINTS).clamp(0.0, 1.0);
    card
}
