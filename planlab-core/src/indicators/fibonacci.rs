//! Fibonacci retracement and extension levels from a swing high/low pair.
//!
//! Deterministic: the same swing pair always produces the same level set.
//! Retracements measure down from the swing high (for an up move);
//! extensions project beyond it.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

pub const RETRACEMENT_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];
pub const EXTENSION_RATIOS: [f64; 4] = [1.272, 1.618, 2.618, 4.236];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevels {
    pub swing_high: f64,
    pub swing_low: f64,
    pub retracements: Vec<FibLevel>,
    pub extensions: Vec<FibLevel>,
}

/// Levels for the move from `swing_low` up to `swing_high`. Retracement r
/// sits at `high - r * range`; extension e projects to `low + e * range`.
pub fn fibonacci(swing_high: f64, swing_low: f64) -> AnalysisResult<FibLevels> {
    if !(swing_high.is_finite() && swing_low.is_finite()) || swing_high <= swing_low {
        return Err(AnalysisError::InvalidConfig(format!(
            "fibonacci needs swing_high > swing_low, got {swing_high} / {swing_low}"
        )));
    }

    let range = swing_high - swing_low;
    let retracements = RETRACEMENT_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: swing_high - ratio * range,
        })
        .collect();
    let extensions = EXTENSION_RATIOS
        .iter()
        .map(|&ratio| FibLevel {
            ratio,
            price: swing_low + ratio * range,
        })
        .collect();

    Ok(FibLevels {
        swing_high,
        swing_low,
        retracements,
        extensions,
    })
}

impl FibLevels {
    /// Distance from `price` to the nearest retracement level, as a fraction
    /// of the swing range. 0 means sitting exactly on a level.
    pub fn proximity(&self, price: f64) -> f64 {
        let range = self.swing_high - self.swing_low;
        self.retracements
            .iter()
            .map(|l| (price - l.price).abs() / range)
            .fold(f64::INFINITY, f64::min)
    }
}
