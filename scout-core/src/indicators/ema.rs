//! Exponential Moving Average (EMA).
//!
//! Seed: SMA of the first `period` samples.
//! Recurrence: ema = (price - ema) * k + ema, with k = 2 / (period + 1).
//! Insufficient data → 0 (`ema`) or an all-NaN series (`ema_series`).

use super::sma::sma;

fn smoothing(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// Final EMA value over the whole slice.
pub fn ema(values: &[f64], period: usize) -> f64 {
    if period == 0 || values.len() < period {
        return 0.0;
    }
    let k = smoothing(period);
    let seed = sma(&values[..period], period);
    values[period..]
        .iter()
        .fold(seed, |ema, &price| (price - ema) * k + ema)
}

/// Per-sample EMA. Indices before `period - 1` are NaN.
///
/// `ema_series(v, p)[i]` equals `ema(&v[..=i], p)` for every `i >= p - 1`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let k = smoothing(period);
    let mut prev = sma(&values[..period], period);
    result[period - 1] = prev;
    for i in period..n {
        prev = (values[i] - prev) * k + prev;
        result[i] = prev;
    }
    result
}

/// Streaming EMA: plain mean over the first `period` pushes, then the recurrence.
#[derive(Debug, Clone)]
pub struct EmaAccumulator {
    period: usize,
    k: f64,
    seed_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl EmaAccumulator {
    /// A period of 0 is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            k: smoothing(period),
            seed_sum: 0.0,
            count: 0,
            value: None,
        }
    }

    pub fn push(&mut self, sample: f64) -> Option<f64> {
        self.count += 1;
        match self.value {
            Some(ema) => {
                self.value = Some((sample - ema) * self.k + ema);
            }
            None => {
                self.seed_sum += sample;
                if self.count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.value
    }

    /// Current EMA, `None` until `period` samples have been pushed.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_with_exact_period_equals_sma() {
        let values = [10.0, 11.0, 12.5, 9.0, 14.0];
        assert_approx(ema(&values, 5), sma(&values, 5), DEFAULT_EPSILON);
    }

    #[test]
    fn ema_hand_computed() {
        // period 3: k = 0.5, seed = mean(1,2,3) = 2
        // 4 → (4-2)*0.5+2 = 3, 5 → (5-3)*0.5+3 = 4
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_approx(ema(&values, 3), 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_insufficient_is_zero() {
        assert_eq!(ema(&[1.0, 2.0], 3), 0.0);
    }

    #[test]
    fn series_matches_prefix_ema() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let series = ema_series(&values, 12);
        assert!(series[10].is_nan());
        for i in 11..values.len() {
            assert_approx(series[i], ema(&values[..=i], 12), DEFAULT_EPSILON);
        }
    }

    #[test]
    fn accumulator_matches_batch() {
        let values: Vec<f64> = (0..30).map(|i| 50.0 + i as f64 * 0.3).collect();
        let mut acc = EmaAccumulator::new(9);
        for (i, &v) in values.iter().enumerate() {
            let out = acc.push(v);
            if i < 8 {
                assert!(out.is_none());
            }
        }
        assert_eq!(acc.count(), 30);
        assert_approx(acc.value().unwrap(), ema(&values, 9), DEFAULT_EPSILON);
    }
}
