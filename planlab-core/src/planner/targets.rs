//! Take-profit ladder and the blended risk/reward number.

use serde::{Deserialize, Serialize};

use super::{EntryZone, PlannerInput, StopLoss};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub price: f64,
    /// Estimated hit probability, decreasing with distance.
    pub probability: f64,
    /// Percent of the position to close here.
    pub partial_exit_pct: f64,
    pub rationale: String,
}

/// Rungs at the style's risk multiples. Two-target styles exit fully;
/// three-target styles (swing, position) keep a 10% runner past the ladder.
pub(crate) fn ladder(
    input: &PlannerInput<'_>,
    entry: &EntryZone,
    stop: &StopLoss,
) -> Vec<Target> {
    let risk = (entry.optimal - stop.price).abs();
    let sign = input.direction.sign();
    let multiples = input.style.target_multiples();
    let exits: &[f64] = match multiples.len() {
        2 => &[60.0, 40.0],
        _ => &[40.0, 30.0, 20.0],
    };

    multiples
        .iter()
        .zip(exits)
        .map(|(&multiple, &exit_pct)| Target {
            price: entry.optimal + sign * multiple * risk,
            probability: hit_probability(multiple),
            partial_exit_pct: exit_pct,
            rationale: format!("{multiple:.1}R objective"),
        })
        .collect()
}

/// Decays with the risk multiple; clamped so far targets keep a floor and
/// near targets never read as certainties.
fn hit_probability(multiple: f64) -> f64 {
    (0.85 / (1.0 + 0.25 * (multiple - 1.0))).clamp(0.15, 0.85)
}

/// Probability-and-size-weighted expected reward divided by risk.
pub(crate) fn weighted_risk_reward(targets: &[Target], entry: f64, risk: f64) -> f64 {
    if risk <= 0.0 {
        return 0.0;
    }
    targets
        .iter()
        .map(|t| t.probability * (t.partial_exit_pct / 100.0) * (t.price - entry).abs())
        .sum::<f64>()
        / risk
}
