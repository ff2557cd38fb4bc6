//! Bollinger Bands — SMA(period) ± k standard deviations.
//!
//! Bandwidth-to-mid ratio classifies the regime: below the squeeze threshold
//! the bands are compressed (volatility contraction), above the expansion
//! threshold they are stretched.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

use super::sma::sma;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandRegime {
    Squeeze,
    Expansion,
    Normal,
}

impl BollingerSeries {
    /// (upper - lower) / middle at bar `i`, NaN during warmup.
    pub fn bandwidth(&self, i: usize) -> f64 {
        match (self.upper.get(i), self.lower.get(i), self.middle.get(i)) {
            (Some(&u), Some(&l), Some(&m)) if m != 0.0 => (u - l) / m,
            _ => f64::NAN,
        }
    }

    pub fn regime(&self, i: usize, squeeze_threshold: f64, expansion_threshold: f64) -> BandRegime {
        let bw = self.bandwidth(i);
        if bw.is_nan() {
            BandRegime::Normal
        } else if bw < squeeze_threshold {
            BandRegime::Squeeze
        } else if bw > expansion_threshold {
            BandRegime::Expansion
        } else {
            BandRegime::Normal
        }
    }
}

pub fn bollinger(closes: &[f64], period: usize, k: f64) -> AnalysisResult<BollingerSeries> {
    if !(k > 0.0 && k.is_finite()) {
        return Err(AnalysisError::InvalidConfig(
            "bollinger k must be positive and finite".into(),
        ));
    }
    if closes.len() < period {
        return Err(AnalysisError::insufficient(period, closes.len()));
    }

    let n = closes.len();
    let middle = sma(closes, period)?;
    let mut upper = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];

    for i in (period - 1)..n {
        let window = &closes[i + 1 - period..=i];
        let mean = middle[i];
        let variance =
            window.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / period as f64;
        let stddev = variance.sqrt();
        upper[i] = mean + k * stddev;
        lower[i] = mean - k * stddev;
    }

    Ok(BollingerSeries { middle, upper, lower })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn bands_bracket_the_mean() {
        let closes = [100.0, 102.0, 98.0, 101.0, 99.0, 103.0, 97.0, 100.0];
        let series = bollinger(&closes, 5, 2.0).unwrap();
        for i in 4..closes.len() {
            assert!(series.upper[i] > series.middle[i]);
            assert!(series.lower[i] < series.middle[i]);
        }
    }

    #[test]
    fn flat_series_collapses_bands() {
        let series = bollinger(&[100.0; 10], 5, 2.0).unwrap();
        assert_approx(series.upper[9], 100.0, DEFAULT_EPSILON);
        assert_approx(series.lower[9], 100.0, DEFAULT_EPSILON);
        assert_approx(series.bandwidth(9), 0.0, DEFAULT_EPSILON);
        assert_eq!(series.regime(9, 0.015, 0.05), BandRegime::Squeeze);
    }

    #[test]
    fn volatile_series_expands_bands() {
        let closes = [100.0, 110.0, 90.0, 112.0, 88.0, 115.0, 85.0, 118.0];
        let series = bollinger(&closes, 5, 2.0).unwrap();
        let last = closes.len() - 1;
        assert!(series.bandwidth(last) > 0.05);
        assert_eq!(series.regime(last, 0.015, 0.05), BandRegime::Expansion);
    }

    #[test]
    fn known_values() {
        // window [2, 4, 6]: mean 4, population stddev sqrt(8/3)
        let series = bollinger(&[2.0, 4.0, 6.0], 3, 2.0).unwrap();
        let stddev = (8.0f64 / 3.0).sqrt();
        assert_approx(series.middle[2], 4.0, DEFAULT_EPSILON);
        assert_approx(series.upper[2], 4.0 + 2.0 * stddev, DEFAULT_EPSILON);
        assert_approx(series.lower[2], 4.0 - 2.0 * stddev, DEFAULT_EPSILON);
    }

    #[test]
    fn too_short_series() {
        assert!(bollinger(&[1.0, 2.0], 20, 2.0).is_err());
    }

    #[test]
    fn warmup_is_nan() {
        let series = bollinger(&[1.0, 2.0, 3.0, 4.0], 3, 2.0).unwrap();
        assert!(series.upper[0].is_nan());
        assert!(series.upper[1].is_nan());
        assert!(!series.upper[2].is_nan());
        assert!(series.bandwidth(0).is_nan());
    }
}
