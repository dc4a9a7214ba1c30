//! Composite momentum score in [0, 100], centred on 50.
//!
//! price change  = % change over the last 20 samples
//! volume change = % change of mean(last 5 volumes) vs mean(the 15 before)
//! score = 50 + 0.7 * price change + 0.3 * volume change, clamped.
//! Fewer than 20 prices or volumes → 50.

use super::sma::mean;

const WINDOW: usize = 20;
const RECENT: usize = 5;

pub fn momentum_score(prices: &[f64], volumes: &[f64]) -> f64 {
    if prices.len() < WINDOW || volumes.len() < WINDOW {
        return 50.0;
    }

    let base = prices[prices.len() - WINDOW];
    if base == 0.0 {
        return 50.0;
    }
    let price_change = (prices[prices.len() - 1] - base) / base * 100.0;

    let tail = &volumes[volumes.len() - WINDOW..];
    let older = mean(&tail[..WINDOW - RECENT]);
    let recent = mean(&tail[WINDOW - RECENT..]);
    let volume_change = if older > 0.0 {
        (recent - older) / older * 100.0
    } else {
        0.0
    };

    (50.0 + price_change * 0.7 + volume_change * 0.3).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn short_input_is_neutral() {
        assert_eq!(momentum_score(&[1.0; 19], &[1.0; 30]), 50.0);
    }

    #[test]
    fn flat_market_is_neutral() {
        assert_approx(momentum_score(&[10.0; 25], &[5.0; 25]), 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn price_and_volume_both_count() {
        // price +10% over the window, recent volume doubles
        let mut prices = vec![100.0; 20];
        prices[19] = 110.0;
        let mut volumes = vec![1_000.0; 20];
        for v in &mut volumes[15..] {
            *v = 2_000.0;
        }
        // 50 + 0.7 * 10 + 0.3 * 100
        assert_approx(momentum_score(&prices, &volumes), 87.0, 1e-9);
    }

    #[test]
    fn crash_clamps_at_zero() {
        let mut prices = vec![100.0; 20];
        prices[19] = 10.0;
        assert_eq!(momentum_score(&prices, &[1.0; 20]), 0.0);
    }
}
