//! Multi-timeframe aggregation.
//!
//! Timeframes and weights: 5m 0.5, 15m 1.0, 1h 2.0, 4h 3.0.
//!
//! Σ = Σ strength × weight, positive for Bullish, negative for Bearish,
//! 0.5 × weight for Neutral. score = (Σ + W) / (2W), where W is the weight of
//! the timeframes that produced an analysis. No valid timeframe → 0.5.
//!
//! Candle fetches run in parallel on the rayon pool. A failed fetch or a
//! short series drops that timeframe; a malformed series is a contract breach
//! and fails the whole call.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::timeframe::analyze_timeframe;
use crate::data::MarketData;
use crate::domain::{validate_series, Interval, TimeframeAnalysis, Trend};
use crate::error::EngineError;

pub const TIMEFRAMES: [(Interval, f64); 4] = [
    (Interval::FiveMinutes, 0.5),
    (Interval::FifteenMinutes, 1.0),
    (Interval::OneHour, 2.0),
    (Interval::FourHours, 3.0),
];

pub const MTF_CANDLE_LIMIT: usize = 100;

/// Score returned when multi-timeframe analysis is switched off.
pub const DISABLED_MTF_SCORE: f64 = 0.6;

const NEUTRAL_SCORE: f64 = 0.5;

/// Aggregated bullishness with its per-timeframe breakdown, in timeframe order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtfReading {
    pub score: f64,
    pub analyses: Vec<TimeframeAnalysis>,
}

impl MtfReading {
    pub fn disabled() -> Self {
        Self {
            score: DISABLED_MTF_SCORE,
            analyses: Vec::new(),
        }
    }

    /// e.g. `5m:BULLISH, 1h:NEUTRAL`, or `no timeframes` when empty.
    pub fn breakdown(&self) -> String {
        if self.analyses.is_empty() {
            return "no timeframes".to_string();
        }
        self.analyses
            .iter()
            .map(|a| format!("{}:{}", a.timeframe, a.trend))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn weight(timeframe: Interval) -> f64 {
    TIMEFRAMES
        .iter()
        .find(|(tf, _)| *tf == timeframe)
        .map_or(0.0, |(_, w)| *w)
}

/// Combine analyses into one score in [0, 1].
pub fn combine(analyses: &[TimeframeAnalysis]) -> f64 {
    let (sum, total_weight) = analyses.iter().fold((0.0, 0.0), |(sum, total), a| {
        let w = weight(a.timeframe);
        let contribution = match a.trend {
            Trend::Bullish => a.strength * w,
            Trend::Bearish => -a.strength * w,
            Trend::Neutral => NEUTRAL_SCORE * w,
        };
        (sum + contribution, total + w)
    });

    if total_weight == 0.0 {
        return NEUTRAL_SCORE;
    }
    ((sum + total_weight) / (2.0 * total_weight)).clamp(0.0, 1.0)
}

/// Fetch every timeframe for `symbol` and aggregate.
pub fn analyze_multi_timeframe(
    market: &dyn MarketData,
    symbol: &str,
) -> Result<MtfReading, EngineError> {
    let fetched: Vec<Result<Option<TimeframeAnalysis>, EngineError>> = TIMEFRAMES
        .par_iter()
        .map(|(timeframe, _)| {
            let candles = match market.candles(symbol, *timeframe, MTF_CANDLE_LIMIT) {
                Ok(candles) => candles,
                Err(err) => {
                    warn!(symbol, %timeframe, error = %err, "timeframe fetch failed");
                    return Ok(None);
                }
            };
            validate_series(symbol, &candles)?;
            let analysis = analyze_timeframe(*timeframe, &candles);
            if analysis.is_none() {
                warn!(symbol, %timeframe, got = candles.len(), "too few candles for timeframe");
            }
            Ok(analysis)
        })
        .collect();

    let mut analyses = Vec::with_capacity(TIMEFRAMES.len());
    for result in fetched {
        if let Some(analysis) = result? {
            debug!(
                symbol,
                timeframe = %analysis.timeframe,
                trend = %analysis.trend,
                strength = analysis.strength,
                rsi = analysis.rsi,
                macd_histogram = analysis.macd_histogram,
                "timeframe analysed"
            );
            analyses.push(analysis);
        }
    }

    Ok(MtfReading {
        score: combine(&analyses),
        analyses,
    })
}
