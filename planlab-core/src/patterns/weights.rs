//! Per-pattern weight tables.
//!
//! Weight order matches `FeatureVector::as_array`:
//! [price_range, volatility, momentum, trend_strength, volume_trend,
//!  volume_confirmation, fib_proximity, sr_touch_density, higher_highs,
//!  lower_lows, structure_break, liquidity_proximity]
//!
//! Scoring centers each normalized feature around zero, takes the weighted
//! sum plus bias, and squashes through a sigmoid, so a pattern whose
//! favorite features all read strongly positive approaches 1.0.

use super::features::{FeatureVector, FEATURE_COUNT};
use super::PatternType;

/// (weights, bias) for one pattern family.
pub(crate) fn table(pattern: PatternType) -> ([f64; FEATURE_COUNT], f64) {
    match pattern {
        // Flags: strong trend with volume confirming the impulse leg.
        PatternType::BullFlag => (
            [0.2, -0.4, 1.2, 2.0, 0.6, 1.8, 0.8, 0.4, 1.2, -1.4, -1.0, 0.4],
            -1.2,
        ),
        PatternType::BearFlag => (
            [0.2, -0.4, -1.2, -2.0, 0.6, -1.8, 0.8, 0.4, -1.4, 1.2, -1.0, 0.4],
            -1.2,
        ),
        // Breakouts: wide range, rising volume, momentum through a level.
        PatternType::Breakout => (
            [1.2, 0.8, 1.6, 1.0, 1.4, 1.0, 0.2, 1.0, 1.6, -1.2, -0.6, -0.4],
            -2.0,
        ),
        PatternType::Breakdown => (
            [1.2, 0.8, -1.6, -1.0, 1.4, -1.0, 0.2, 1.0, -1.2, 1.6, -0.6, -0.4],
            -2.0,
        ),
        // Double tops/bottoms: momentum stalling into a touched level after
        // the trend cracked.
        PatternType::DoubleTop => (
            [0.6, 0.4, -0.6, -0.4, -0.6, -1.0, 1.0, 1.8, -0.6, 0.8, 1.4, 0.6],
            -2.2,
        ),
        PatternType::DoubleBottom => (
            [0.6, 0.4, 0.6, 0.4, -0.6, 1.0, 1.0, 1.8, 0.8, -0.6, 1.4, 0.6],
            -2.2,
        ),
        // Consolidation: tight quiet range hugging liquidity.
        PatternType::RangeConsolidation => (
            [-1.8, -1.6, -0.8, -0.8, -0.4, 0.0, 0.6, 1.2, -0.8, -0.8, -0.6, 1.6],
            0.4,
        ),
        // Continuation: trend persists with healthy participation and an
        // intact structure. Direction comes from the slope sign, so the
        // trend weights are magnitude-oriented here.
        PatternType::TrendContinuation => (
            [0.4, -0.6, 0.8, 1.2, 0.8, 0.6, 0.6, 0.2, 0.4, 0.4, -1.8, 0.6],
            -1.0,
        ),
    }
}

/// Base expected move (unsigned fraction of price) when the pattern plays
/// out, before confidence scaling.
pub(crate) fn base_move(pattern: PatternType) -> f64 {
    match pattern {
        PatternType::BullFlag | PatternType::BearFlag => 0.035,
        PatternType::Breakout | PatternType::Breakdown => 0.050,
        PatternType::DoubleTop | PatternType::DoubleBottom => 0.040,
        PatternType::RangeConsolidation => 0.010,
        PatternType::TrendContinuation => 0.030,
    }
}

/// Confidence in [0, 1] for one pattern given a feature vector.
pub(crate) fn score(pattern: PatternType, features: &FeatureVector) -> f64 {
    let (weights, bias) = table(pattern);
    let normalized = features.normalized();
    let mut acc = bias;
    for (w, t) in weights.iter().zip(normalized) {
        acc += w * (2.0 * t - 1.0);
    }
    super::features::sigmoid(acc)
}
