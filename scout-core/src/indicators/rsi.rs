//! Relative Strength Index (RSI).
//!
//! First average gain/loss: plain mean over the first `period` changes.
//! Then Wilder smoothing: avg = (avg * (period - 1) + new) / period.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: fewer than period+1 samples → 50; no movement → 50;
//! no losses → 100. Output clamped to [0, 100].

pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn rsi(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period + 1 {
        return 50.0;
    }

    let changes = values.windows(2).map(|w| w[1] - w[0]);
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let p = period as f64;

    for (i, change) in changes.enumerate() {
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        if i < period {
            avg_gain += gain / p;
            avg_loss += loss / p;
        } else {
            avg_gain = (avg_gain * (p - 1.0) + gain) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        }
    }

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}
