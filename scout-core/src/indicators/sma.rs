//! Simple Moving Average (SMA).
//!
//! SMA = mean of the last `period` samples.
//! Insufficient data (fewer than `period` samples, or period 0) → 0.

/// Mean of the trailing `period` values.
pub fn sma(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period {
        return 0.0;
    }
    let window = &values[values.len() - period..];
    window.iter().sum::<f64>() / period as f64
}

/// Mean of every value; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    sma(values, values.len())
}
