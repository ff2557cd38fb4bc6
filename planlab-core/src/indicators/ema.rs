//! Exponential moving average.
//!
//! Seeded with the SMA of the first `period` values, then
//! EMA[t] = alpha * value[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).

use crate::error::{AnalysisError, AnalysisResult};

pub fn ema(values: &[f64], period: usize) -> AnalysisResult<Vec<f64>> {
    if period == 0 {
        return Err(AnalysisError::InvalidConfig("ema period must be >= 1".into()));
    }
    if values.len() < period {
        return Err(AnalysisError::insufficient(period, values.len()));
    }

    let mut result = vec![f64::NAN; values.len()];
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in period..values.len() {
        let smoothed = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    Ok(result)
}
