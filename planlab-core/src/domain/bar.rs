//! PriceBar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// OHLCV bar for a single instrument over one timeframe interval.
///
/// Immutable once closed. A rolling, time-ordered slice of these is the unit
/// of analysis everywhere in the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// OHLCV sanity check: low <= open,close <= high, positive prices, finite
    /// fields, close_time after open_time.
    pub fn is_sane(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > 0.0
            && self.volume >= 0.0
            && self.close_time > self.open_time
    }

    /// Full bar range.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Candle body (signed: positive when close > open).
    pub fn body(&self) -> f64 {
        self.close - self.open
    }

    /// Position of the close within the bar's range, in [0, 1].
    /// A doji bar (high == low) reports 0.5.
    pub fn close_position(&self) -> f64 {
        let range = self.range();
        if range <= 0.0 {
            0.5
        } else {
            (self.close - self.low) / range
        }
    }

    /// Typical price (HLC/3) used by money-flow style indicators.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Validate an ordered bar series: every bar sane, open times strictly
/// increasing. Returns the first violation.
pub(crate) fn validate_series(bars: &[PriceBar]) -> AnalysisResult<()> {
    for (i, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(AnalysisError::InvalidBar {
                index: i,
                reason: "OHLCV invariant violated".into(),
            });
        }
        if i > 0 && bar.open_time <= bars[i - 1].open_time {
            return Err(AnalysisError::InvalidBar {
                index: i,
                reason: "bars out of time order".into(),
            });
        }
    }
    Ok(())
}
