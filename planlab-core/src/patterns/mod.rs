//! Heuristic pattern detector.
//!
//! A fixed-weight, deterministic scorer — not a trained model. Pattern types
//! are a closed set so scoring stays exhaustive; each carries a hand-set
//! weight table over the same 12-feature vector. Running per-pattern
//! statistics (success rate, realized moves, risk/reward, best timeframes)
//! re-rank candidates and are the only mutable state in the core, updated
//! through a serialized `add_training_example` and read as a snapshot.

mod detector;
mod features;
mod stats;
mod weights;

pub use detector::{PatternDetector, PatternPrediction};
pub use features::{extract_features, FeatureVector};
pub use stats::{PatternStats, StatsTable, TimeframeStats};

use serde::{Deserialize, Serialize};

use crate::domain::Direction;

/// Closed set of recognized pattern families.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    BullFlag,
    BearFlag,
    Breakout,
    Breakdown,
    DoubleTop,
    DoubleBottom,
    RangeConsolidation,
    TrendContinuation,
}

impl PatternType {
    pub const ALL: [PatternType; 8] = [
        PatternType::BullFlag,
        PatternType::BearFlag,
        PatternType::Breakout,
        PatternType::Breakdown,
        PatternType::DoubleTop,
        PatternType::DoubleBottom,
        PatternType::RangeConsolidation,
        PatternType::TrendContinuation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PatternType::BullFlag => "bull_flag",
            PatternType::BearFlag => "bear_flag",
            PatternType::Breakout => "breakout",
            PatternType::Breakdown => "breakdown",
            PatternType::DoubleTop => "double_top",
            PatternType::DoubleBottom => "double_bottom",
            PatternType::RangeConsolidation => "range_consolidation",
            PatternType::TrendContinuation => "trend_continuation",
        }
    }

    /// Directional implication. Continuation and consolidation patterns take
    /// their side from the window's trend slope.
    pub fn direction(&self, features: &FeatureVector) -> Direction {
        match self {
            PatternType::BullFlag | PatternType::Breakout | PatternType::DoubleBottom => {
                Direction::Bullish
            }
            PatternType::BearFlag | PatternType::Breakdown | PatternType::DoubleTop => {
                Direction::Bearish
            }
            PatternType::RangeConsolidation => Direction::Neutral,
            PatternType::TrendContinuation => Direction::from_sign(features.trend_strength),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_variant() {
        // the closed set and the scoring loop must agree on cardinality
        assert_eq!(PatternType::ALL.len(), 8);
        for pattern in PatternType::ALL {
            assert!(!pattern.name().is_empty());
        }
    }

    #[test]
    fn serde_names_are_snake_case() {
        let json = serde_json::to_string(&PatternType::BullFlag).unwrap();
        assert_eq!(json, "\"bull_flag\"");
    }
}
