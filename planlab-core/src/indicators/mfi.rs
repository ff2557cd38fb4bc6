//! Money Flow Index — volume-weighted RSI over typical price.
//!
//! Raw money flow = typical_price * volume, classified positive or negative
//! by the typical-price change. MFI = 100 - 100 / (1 + positive / negative)
//! over a rolling `period` window. Needs period + 1 bars.

use crate::domain::PriceBar;
use crate::error::{AnalysisError, AnalysisResult};

pub fn mfi(bars: &[PriceBar], period: usize) -> AnalysisResult<Vec<f64>> {
    if period == 0 {
        return Err(AnalysisError::InvalidConfig("mfi period must be >= 1".into()));
    }
    if bars.len() < period + 1 {
        return Err(AnalysisError::insufficient(period + 1, bars.len()));
    }

    let n = bars.len();
    let typical: Vec<f64> = bars.iter().map(|b| b.typical_price()).collect();

    // Signed raw money flow per bar (index 0 has no change)
    let mut flows = vec![0.0; n];
    for i in 1..n {
        let raw = typical[i] * bars[i].volume;
        flows[i] = if typical[i] > typical[i - 1] {
            raw
        } else if typical[i] < typical[i - 1] {
            -raw
        } else {
            0.0
        };
    }

    let mut result = vec![f64::NAN; n];
    for i in period..n {
        let window = &flows[i + 1 - period..=i];
        let positive: f64 = window.iter().filter(|&&f| f > 0.0).sum();
        let negative: f64 = -window.iter().filter(|&&f| f < 0.0).sum::<f64>();

        result[i] = if positive == 0.0 && negative == 0.0 {
            50.0
        } else if negative == 0.0 {
            100.0
        } else if positive == 0.0 {
            0.0
        } else {
            100.0 - 100.0 / (1.0 + positive / negative)
        };
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars_with_volume, DEFAULT_EPSILON};

    #[test]
    fn mfi_all_inflow_is_100() {
        let bars = make_bars_with_volume(&[
            (100.0, 1000.0),
            (101.0, 1200.0),
            (102.0, 1100.0),
            (103.0, 1300.0),
            (104.0, 1250.0),
        ]);
        let result = mfi(&bars, 3).unwrap();
        assert_approx(result[3], 100.0, 1e-6);
    }

    #[test]
    fn mfi_all_outflow_is_0() {
        let bars = make_bars_with_volume(&[
            (104.0, 1000.0),
            (103.0, 1200.0),
            (102.0, 1100.0),
            (101.0, 1300.0),
            (100.0, 1250.0),
        ]);
        let result = mfi(&bars, 3).unwrap();
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn mfi_in_bounds() {
        let bars = make_bars_with_volume(&[
            (100.0, 1000.0),
            (102.0, 1500.0),
            (101.0, 900.0),
            (103.0, 2000.0),
            (100.5, 1800.0),
            (104.0, 2200.0),
        ]);
        let result = mfi(&bars, 3).unwrap();
        for &v in &result[3..] {
            assert!((0.0..=100.0).contains(&v), "MFI out of bounds: {v}");
        }
    }

    #[test]
    fn mfi_length_check() {
        let bars = make_bars_with_volume(&[(100.0, 1000.0); 14]);
        let err = mfi(&bars, 14).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                required: 15,
                got: 14
            }
        );
    }
}
