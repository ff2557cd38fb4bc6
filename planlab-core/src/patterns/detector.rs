//! Pattern detection and the training-feedback loop.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::config::PatternConfig;
use crate::domain::{Direction, PriceBar, Timeframe};
use crate::error::AnalysisResult;
use crate::indicators::SupportResistance;
use crate::structure::MarketStructure;

use super::features::{extract_features, FeatureVector};
use super::stats::StatsTable;
use super::{weights, PatternType};

/// One emitted pattern candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPrediction {
    pub pattern: PatternType,
    /// Scorer output in [0, 1]; only values above the configured cutoff are
    /// emitted.
    pub confidence: f64,
    /// Running success rate for this pattern family (0.5 prior).
    pub historical_success_rate: f64,
    /// Signed expected move as a fraction of price.
    pub expected_move: f64,
    /// Agreement between the expected move and the family's historical
    /// realized average, in [0, 1]. 0.5 until history exists.
    pub similarity: f64,
    pub features: FeatureVector,
}

impl PatternPrediction {
    /// Re-ranking key: confidence discounted by the historical record.
    pub fn rank_score(&self) -> f64 {
        self.confidence * self.historical_success_rate
    }
}

/// Deterministic weighted-feature scorer with a running statistics table.
///
/// Scoring reads a cloned snapshot of the statistics, so a concurrent
/// `add_training_example` never tears a read. Training updates are
/// serialized by the write lock.
#[derive(Debug)]
pub struct PatternDetector {
    config: PatternConfig,
    stats: RwLock<StatsTable>,
}

impl PatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self::with_stats(config, StatsTable::default())
    }

    /// Start from a persisted statistics table.
    pub fn with_stats(config: PatternConfig, stats: StatsTable) -> Self {
        Self {
            config,
            stats: RwLock::new(stats),
        }
    }

    /// Score every pattern family against the window and emit those above
    /// the confidence cutoff, ranked by confidence x historical success.
    pub fn detect(
        &self,
        bars: &[PriceBar],
        structure: &MarketStructure,
        sr: &SupportResistance,
    ) -> AnalysisResult<Vec<PatternPrediction>> {
        let features = extract_features(bars, structure, sr, self.config.feature_window)?;
        let stats = self.stats_snapshot();

        let mut predictions: Vec<PatternPrediction> = PatternType::ALL
            .iter()
            .filter_map(|&pattern| {
                let confidence = weights::score(pattern, &features);
                if confidence < self.config.min_confidence {
                    return None;
                }
                let expected_move = expected_move(pattern, &features, confidence);
                let pattern_stats = stats.get(pattern);
                let historical_success_rate =
                    pattern_stats.map_or(0.5, |s| s.success_rate());
                let similarity = pattern_stats
                    .filter(|s| s.samples > 0)
                    .map_or(0.5, |s| move_similarity(expected_move, s.avg_move()));
                Some(PatternPrediction {
                    pattern,
                    confidence,
                    historical_success_rate,
                    expected_move,
                    similarity,
                    features: features.clone(),
                })
            })
            .collect();

        predictions.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
        tracing::debug!(
            candidates = predictions.len(),
            cutoff = self.config.min_confidence,
            "pattern scan complete"
        );
        Ok(predictions)
    }

    /// Record a resolved setup. The single write path for the statistics
    /// table; concurrent scoring keeps reading the previous snapshot.
    pub fn add_training_example(
        &self,
        pattern: PatternType,
        timeframe: Timeframe,
        success: bool,
        realized_move: f64,
        risk_reward: f64,
    ) {
        let mut stats = self
            .stats
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        stats
            .patterns
            .entry(pattern)
            .or_default()
            .record(timeframe, success, realized_move, risk_reward);
    }

    /// Consistent copy of the statistics table (persist this).
    pub fn stats_snapshot(&self) -> StatsTable {
        self.stats
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

/// Signed expected move: pattern base magnitude scaled by conviction, with
/// the sign from the pattern's directional implication.
fn expected_move(pattern: PatternType, features: &FeatureVector, confidence: f64) -> f64 {
    let magnitude = weights::base_move(pattern) * (0.5 + 0.5 * confidence);
    match pattern.direction(features) {
        Direction::Bullish => magnitude,
        Direction::Bearish => -magnitude,
        Direction::Neutral => 0.0,
    }
}

/// How well the scorer's expected move matches the historical realized
/// average for the family.
fn move_similarity(expected: f64, avg_realized: f64) -> f64 {
    if expected == 0.0 {
        return 0.5;
    }
    1.0 / (1.0 + (expected - avg_realized).abs() / expected.abs())
}
