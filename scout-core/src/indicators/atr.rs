//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR = SMA(period) of the true ranges that have a previous close.
//! Needs period+1 candles; fewer → 0.

use super::sma::sma;
use crate::domain::Candle;

pub const DEFAULT_ATR_PERIOD: usize = 14;

/// True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());
    if let Some(first) = candles.first() {
        tr.push(first.high - first.low);
    }
    for pair in candles.windows(2) {
        let (prev, bar) = (&pair[0], &pair[1]);
        let range = (bar.high - bar.low)
            .max((bar.high - prev.close).abs())
            .max((bar.low - prev.close).abs());
        tr.push(range);
    }
    tr
}

pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }
    let tr = true_range(candles);
    sma(&tr[1..], period)
}
