//! MACD — moving average convergence/divergence.
//!
//! MACD line = EMA(fast) - EMA(slow); signal line = EMA(signal) of the MACD
//! line; histogram = MACD - signal. A histogram sign change between the last
//! two bars is a crossover flip.

use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::error::{AnalysisError, AnalysisResult};

use super::ema::ema;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Crossover state at the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdCross {
    BullishFlip,
    BearishFlip,
    None,
}

impl MacdSeries {
    /// Histogram sign change between the last two valid bars.
    pub fn crossover(&self) -> MacdCross {
        let n = self.histogram.len();
        if n < 2 {
            return MacdCross::None;
        }
        let prev = self.histogram[n - 2];
        let curr = self.histogram[n - 1];
        if prev.is_nan() || curr.is_nan() {
            return MacdCross::None;
        }
        if prev <= 0.0 && curr > 0.0 {
            MacdCross::BullishFlip
        } else if prev >= 0.0 && curr < 0.0 {
            MacdCross::BearishFlip
        } else {
            MacdCross::None
        }
    }

    /// Bias of the latest histogram value.
    pub fn bias(&self) -> Direction {
        match self.histogram.last() {
            Some(&h) if h.is_finite() => Direction::from_sign(h),
            _ => Direction::Neutral,
        }
    }
}

pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> AnalysisResult<MacdSeries> {
    if fast == 0 || slow == 0 || signal_period == 0 {
        return Err(AnalysisError::InvalidConfig(
            "macd periods must be >= 1".into(),
        ));
    }
    if fast >= slow {
        return Err(AnalysisError::InvalidConfig(format!(
            "macd fast period ({fast}) must be < slow period ({slow})"
        )));
    }
    let required = slow + signal_period;
    if closes.len() < required {
        return Err(AnalysisError::insufficient(required, closes.len()));
    }

    let n = closes.len();
    let fast_ema = ema(closes, fast)?;
    let slow_ema = ema(closes, slow)?;

    let mut macd_line = vec![f64::NAN; n];
    for i in (slow - 1)..n {
        macd_line[i] = fast_ema[i] - slow_ema[i];
    }

    // Signal line: EMA of the valid MACD region, re-aligned to input indices.
    let valid_start = slow - 1;
    let signal_tail = ema(&macd_line[valid_start..], signal_period)?;
    let mut signal_line = vec![f64::NAN; n];
    for (offset, &v) in signal_tail.iter().enumerate() {
        signal_line[valid_start + offset] = v;
    }

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(&m, &s)| m - s)
        .collect();

    Ok(MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    })
}
