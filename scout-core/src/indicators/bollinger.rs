//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(period)
//! - Upper: middle + k * stddev(period)
//! - Lower: middle - k * stddev(period)
//!
//! Uses population stddev (divide by N).
//! Insufficient data → all three bands 0.

use serde::{Deserialize, Serialize};

use super::sma::sma;
use crate::domain::BandPosition;

pub const DEFAULT_BAND_PERIOD: usize = 20;
pub const DEFAULT_BAND_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    /// Bands could not be computed.
    pub fn is_empty(&self) -> bool {
        self.upper == 0.0 && self.middle == 0.0 && self.lower == 0.0
    }

    pub fn position(&self, price: f64) -> BandPosition {
        if price > self.upper {
            BandPosition::Above
        } else if price < self.lower {
            BandPosition::Below
        } else {
            BandPosition::Inside
        }
    }

    /// Midpoint of the outer bands.
    pub fn midpoint(&self) -> f64 {
        (self.upper + self.lower) / 2.0
    }
}

pub fn bollinger(values: &[f64], period: usize, k: f64) -> Bands {
    if period == 0 || values.len() < period {
        return Bands::default();
    }

    let middle = sma(values, period);
    let window = &values[values.len() - period..];
    let variance = window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / period as f64;
    let band = k * variance.sqrt();

    Bands {
        upper: middle + band,
        middle,
        lower: middle - band,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn bands_population_stddev() {
        // window [2,4,4,4,5,5,7,9]: mean 5, population stddev 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let bands = bollinger(&values, 8, 2.0);
        assert_approx(bands.middle, 5.0, DEFAULT_EPSILON);
        assert_approx(bands.upper, 9.0, DEFAULT_EPSILON);
        assert_approx(bands.lower, 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bands_insufficient_data() {
        let bands = bollinger(&[1.0, 2.0], 20, 2.0);
        assert!(bands.is_empty());
    }

    #[test]
    fn flat_series_collapses_bands() {
        let bands = bollinger(&[10.0; 20], 20, 2.0);
        assert_approx(bands.upper, 10.0, DEFAULT_EPSILON);
        assert_approx(bands.lower, 10.0, DEFAULT_EPSILON);
        assert_eq!(bands.position(10.0), BandPosition::Inside);
    }

    #[test]
    fn position_classification() {
        let bands = Bands {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
        };
        assert_eq!(bands.position(111.0), BandPosition::Above);
        assert_eq!(bands.position(89.0), BandPosition::Below);
        assert_eq!(bands.position(95.0), BandPosition::Inside);
        assert_eq!(bands.midpoint(), 100.0);
    }
}
