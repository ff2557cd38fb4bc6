//! Error taxonomy for the analysis core.
//!
//! Everything that can fail an analysis call is listed here. "No trade plan"
//! outcomes (no signal, conflicting consensus, gate rejection) are NOT errors —
//! they are valid results carried by `pipeline::PlanOutcome`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Series shorter than the required lookback. Never padded or guessed.
    #[error("insufficient data: need {required} bars, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// Best bid at or above best ask — the snapshot is rejected outright.
    #[error("crossed book: best bid {bid} >= best ask {ask}")]
    CrossedBook { bid: f64, ask: f64 },

    /// A bar violated the OHLC invariant (low <= open,close <= high, positive
    /// prices, close_time > open_time).
    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An optimizer output failed plan-ordering validation. Plans violating
    /// stop < entry < targets (long, mirrored for short) are rejected, never
    /// emitted.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Shorthand used by every lookback check in the indicator library.
    pub fn insufficient(required: usize, got: usize) -> Self {
        Self::InsufficientData { required, got }
    }
}
