//! Relative Strength Index.
//!
//! Wilder smoothing of average gains and average losses over `period` changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Needs period + 1 values (one extra for the first change).
//! Edge cases: avg_loss == 0 → 100; avg_gain == 0 → 0; no movement → 50.

use crate::error::{AnalysisError, AnalysisResult};

pub fn rsi(closes: &[f64], period: usize) -> AnalysisResult<Vec<f64>> {
    if period == 0 {
        return Err(AnalysisError::InvalidConfig("rsi period must be >= 1".into()));
    }
    if closes.len() < period + 1 {
        return Err(AnalysisError::insufficient(period + 1, closes.len()));
    }

    let n = closes.len();
    let mut result = vec![f64::NAN; n];

    // Seed: average gain/loss over the first `period` changes
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    result[period] = rsi_value(avg_gain, avg_loss);

    // Wilder smoothing for subsequent values
    let alpha = 1.0 / period as f64;
    for i in (period + 1)..n {
        let change = closes[i] - closes[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;

        result[i] = rsi_value(avg_gain, avg_loss);
    }

    Ok(result)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
