//! Consensus builder — one directional verdict from many voters.
//!
//! Every contributing source casts at most one vote (direction + confidence).
//! Weights are confidence sums per side; the winner needs a relative margin,
//! otherwise the verdict is neutral. Conflict flags raised here propagate to
//! the final report and are never dropped.

use serde::{Deserialize, Serialize};

use crate::config::ConsensusConfig;
use crate::domain::Direction;

/// A single source's directional opinion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalVote {
    /// Stable source name ("patterns", "volume_profile", "smart_money", ...).
    pub source: String,
    pub direction: Direction,
    /// Voter's own confidence in [0, 1]; acts as the vote weight.
    pub confidence: f64,
    /// Short human-readable grounds for the vote.
    pub note: String,
}

impl SignalVote {
    pub fn new(
        source: impl Into<String>,
        direction: Direction,
        confidence: f64,
        note: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            direction,
            confidence: confidence.clamp(0.0, 1.0),
            note: note.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub overall_direction: Direction,
    /// 0-100.
    pub confidence: f64,
    /// Share of votes agreeing with the overall direction, 0-100.
    pub agreement_score: f64,
    /// Never silently dropped — these ride along to the final report.
    pub conflicting_signals: Vec<String>,
    pub votes: Vec<SignalVote>,
}

/// Deterministic: identical vote sets always produce identical results.
pub fn build(votes: Vec<SignalVote>, config: &ConsensusConfig) -> ConsensusResult {
    let bull_weight: f64 = side_weight(&votes, Direction::Bullish);
    let bear_weight: f64 = side_weight(&votes, Direction::Bearish);
    let directional_weight = bull_weight + bear_weight;

    let mut conflicting_signals = Vec::new();

    let overall_direction = if directional_weight <= 0.0 {
        Direction::Neutral
    } else if bull_weight >= bear_weight * (1.0 + config.direction_margin) && bull_weight > 0.0 {
        Direction::Bullish
    } else if bear_weight >= bull_weight * (1.0 + config.direction_margin) && bear_weight > 0.0 {
        Direction::Bearish
    } else {
        Direction::Neutral
    };

    let confidence = match overall_direction {
        Direction::Neutral => {
            if directional_weight > 0.0 {
                100.0 * (bull_weight - bear_weight).abs() / directional_weight
            } else {
                0.0
            }
        }
        Direction::Bullish => 100.0 * bull_weight / directional_weight,
        Direction::Bearish => 100.0 * bear_weight / directional_weight,
    };

    let agreement_score = if votes.is_empty() {
        0.0
    } else {
        let matching = votes
            .iter()
            .filter(|v| v.direction == overall_direction)
            .count();
        100.0 * matching as f64 / votes.len() as f64
    };

    if !votes.is_empty() && agreement_score < config.conflict_agreement_threshold {
        conflicting_signals.push(format!(
            "only {agreement_score:.0}% of sources agree on {overall_direction:?}"
        ));
    }
    let (stronger, weaker) = if bull_weight >= bear_weight {
        (bull_weight, bear_weight)
    } else {
        (bear_weight, bull_weight)
    };
    if stronger > 0.0 && weaker >= stronger * (1.0 - config.conflict_weight_ratio) {
        conflicting_signals.push(format!(
            "bullish and bearish weight nearly balanced ({bull_weight:.2} vs {bear_weight:.2})"
        ));
    }

    // Voters flagging opposite extremes deserve a named callout.
    for vote in votes.iter().filter(|v| {
        v.direction != Direction::Neutral
            && overall_direction != Direction::Neutral
            && v.direction == overall_direction.opposite()
            && v.confidence >= 0.6
    }) {
        conflicting_signals.push(format!(
            "{} dissents with {:.0}% confidence: {}",
            vote.source,
            vote.confidence * 100.0,
            vote.note
        ));
    }

    ConsensusResult {
        overall_direction,
        confidence,
        agreement_score,
        conflicting_signals,
        votes,
    }
}

fn side_weight(votes: &[SignalVote], side: Direction) -> f64 {
    votes
        .iter()
        .filter(|v| v.direction == side)
        .map(|v| v.confidence)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(source: &str, direction: Direction, confidence: f64) -> SignalVote {
        SignalVote::new(source, direction, confidence, "test vote")
    }

    #[test]
    fn unanimous_bulls_win() {
        let result = build(
            vec![
                vote("patterns", Direction::Bullish, 0.8),
                vote("volume_profile", Direction::Bullish, 0.6),
                vote("smart_money", Direction::Bullish, 0.7),
            ],
            &ConsensusConfig::default(),
        );
        assert_eq!(result.overall_direction, Direction::Bullish);
        assert_eq!(result.confidence, 100.0);
        assert_eq!(result.agreement_score, 100.0);
        assert!(result.conflicting_signals.is_empty());
    }

    #[test]
    fn margin_rule_blocks_thin_leads() {
        // 0.55 vs 0.5: the lead is under the 20% relative margin
        let result = build(
            vec![
                vote("patterns", Direction::Bullish, 0.55),
                vote("smart_money", Direction::Bearish, 0.5),
            ],
            &ConsensusConfig::default(),
        );
        assert_eq!(result.overall_direction, Direction::Neutral);
        // neutral confidence = normalized weight difference
        assert!((result.confidence - 100.0 * 0.05 / 1.05).abs() < 1e-9);
        assert!(!result.conflicting_signals.is_empty());
    }

    #[test]
    fn near_balance_raises_conflict_even_with_winner() {
        // 1.0 vs 0.75: bulls clear the 20% margin, but the sides are within
        // 30% of each other → conflict flag rides along
        let result = build(
            vec![
                vote("patterns", Direction::Bullish, 1.0),
                vote("smart_money", Direction::Bearish, 0.75),
            ],
            &ConsensusConfig::default(),
        );
        assert_eq!(result.overall_direction, Direction::Bullish);
        assert!(result
            .conflicting_signals
            .iter()
            .any(|c| c.contains("nearly balanced")));
    }

    #[test]
    fn strong_dissenter_is_named() {
        let result = build(
            vec![
                vote("patterns", Direction::Bullish, 0.9),
                vote("volume_profile", Direction::Bullish, 0.8),
                vote("micro", Direction::Bullish, 0.8),
                vote("smart_money", Direction::Bearish, 0.7),
            ],
            &ConsensusConfig::default(),
        );
        assert_eq!(result.overall_direction, Direction::Bullish);
        assert!(result
            .conflicting_signals
            .iter()
            .any(|c| c.contains("smart_money dissents")));
    }

    #[test]
    fn no_votes_is_neutral_zero() {
        let result = build(vec![], &ConsensusConfig::default());
        assert_eq!(result.overall_direction, Direction::Neutral);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.agreement_score, 0.0);
    }

    #[test]
    fn neutral_votes_dilute_agreement_only() {
        let result = build(
            vec![
                vote("patterns", Direction::Bullish, 0.9),
                vote("volume_profile", Direction::Neutral, 0.5),
                vote("micro", Direction::Neutral, 0.5),
            ],
            &ConsensusConfig::default(),
        );
        assert_eq!(result.overall_direction, Direction::Bullish);
        // 1 of 3 votes match the winner
        assert!((result.agreement_score - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn determinism() {
        let votes = vec![
            vote("patterns", Direction::Bullish, 0.62),
            vote("volume_profile", Direction::Bearish, 0.41),
            vote("smart_money", Direction::Neutral, 0.3),
        ];
        let config = ConsensusConfig::default();
        let a = build(votes.clone(), &config);
        let b = build(votes, &config);
        assert_eq!(a, b);
    }
}
