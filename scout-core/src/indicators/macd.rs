//! Moving Average Convergence Divergence (MACD).
//!
//! MACD line = EMA(12) - EMA(26).
//! Signal = EMA(9) of the MACD line, where the line is sampled at every
//! index from 26 onward. Histogram = MACD - signal.
//! Needs 26 + 9 samples; fewer → all three outputs 0.
//!
//! `macd` walks both EMA series once and feeds the line into a streaming
//! EMA(9). `macd_replay` recomputes both EMAs over every prefix and is kept
//! as the reference that `macd` is tested against.

use serde::{Deserialize, Serialize};

use super::ema::{ema, ema_series, EmaAccumulator};

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;
pub const MIN_SAMPLES: usize = SLOW_PERIOD + SIGNAL_PERIOD;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl Macd {
    /// MACD above its signal line with a positive histogram.
    pub fn is_bullish(&self) -> bool {
        self.macd > self.signal && self.histogram > 0.0
    }
}

/// Linear-time MACD.
pub fn macd(values: &[f64]) -> Macd {
    if values.len() < MIN_SAMPLES {
        return Macd::default();
    }

    let fast = ema_series(values, FAST_PERIOD);
    let slow = ema_series(values, SLOW_PERIOD);
    let mut signal = EmaAccumulator::new(SIGNAL_PERIOD);
    let mut line = 0.0;
    for i in SLOW_PERIOD..values.len() {
        line = fast[i] - slow[i];
        signal.push(line);
    }

    let signal = signal.value().unwrap_or(0.0);
    Macd {
        macd: line,
        signal,
        histogram: line - signal,
    }
}

/// Quadratic reference: rebuild the MACD line from every prefix.
pub fn macd_replay(values: &[f64]) -> Macd {
    if values.len() < MIN_SAMPLES {
        return Macd::default();
    }

    let line = ema(values, FAST_PERIOD) - ema(values, SLOW_PERIOD);
    let history: Vec<f64> = (SLOW_PERIOD..values.len())
        .map(|i| {
            let prefix = &values[..=i];
            ema(prefix, FAST_PERIOD) - ema(prefix, SLOW_PERIOD)
        })
        .collect();
    let signal = ema(&history, SIGNAL_PERIOD);

    Macd {
        macd: line,
        signal,
        histogram: line - signal,
    }
}
