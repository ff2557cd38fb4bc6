//! Average True Range — the volatility unit every downstream buffer uses.
//!
//! True Range: max(high - low, |high - prev_close|, |low - prev_close|).
//! ATR is the Wilder-smoothed TR (alpha = 1/period), seeded with the mean of
//! the first `period` proper true ranges. Needs period + 1 bars because
//! TR requires a previous close.

use crate::domain::PriceBar;
use crate::error::{AnalysisError, AnalysisResult};

/// True Range series. TR[0] has no previous close and is NaN so downstream
/// smoothing seeds from proper true ranges only.
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    let n = bars.len();
    let mut tr = vec![f64::NAN; n];

    for i in 1..n {
        let h = bars[i].high;
        let l = bars[i].low;
        let pc = bars[i - 1].close;
        tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
    }

    tr
}

pub fn atr(bars: &[PriceBar], period: usize) -> AnalysisResult<Vec<f64>> {
    if period == 0 {
        return Err(AnalysisError::InvalidConfig("atr period must be >= 1".into()));
    }
    if bars.len() < period + 1 {
        return Err(AnalysisError::insufficient(period + 1, bars.len()));
    }

    let tr = true_range(bars);
    let n = bars.len();
    let mut result = vec![f64::NAN; n];

    // Seed: mean of TR[1..=period]
    let seed: f64 = tr[1..=period].iter().sum::<f64>() / period as f64;
    result[period] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;
    for i in (period + 1)..n {
        let smoothed = alpha * tr[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_includes_gaps() {
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // gap up: TR = max(7, 15, 8) = 15
        ]);
        let tr = true_range(&bars);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = atr(&bars, 3).unwrap();
        assert!(result[2].is_nan());
        // Seed: mean(8, 9, 6) = 23/3; next: (1/3)*6 + (2/3)*(23/3) = 64/9
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_is_nonnegative() {
        let bars = make_ohlc_bars(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 100.0, 100.0, 100.0),
        ]);
        let result = atr(&bars, 2).unwrap();
        assert_approx(result[2], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_positive_when_any_bar_has_range() {
        let bars = make_ohlc_bars(&[
            (100.0, 100.0, 100.0, 100.0),
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 100.5, 100.5, 100.5),
        ]);
        let result = atr(&bars, 2).unwrap();
        assert!(result[2] > 0.0);
    }

    #[test]
    fn atr_needs_period_plus_one_bars() {
        let bars = make_ohlc_bars(&[(100.0, 101.0, 99.0, 100.0); 3]);
        let err = atr(&bars, 3).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData { required: 4, got: 3 }
        );
    }
}
