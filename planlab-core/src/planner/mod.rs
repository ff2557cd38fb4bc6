//! Trade-plan optimizer — entry zone, stop, target ladder, size.
//!
//! Pure synthesis from current price, ATR, nearby structure, and the
//! style/risk parameters. Every emitted plan passes `validate()`; a plan
//! violating the price ordering is a bug upstream and is rejected, never
//! returned.

mod entry;
mod stop;
mod targets;

pub use entry::EntryZone;
pub use stop::StopLoss;
pub use targets::Target;

use serde::{Deserialize, Serialize};

use crate::domain::{RiskTolerance, TradeDirection, TradingStyle};
use crate::error::{AnalysisError, AnalysisResult};
use crate::indicators::SupportResistance;

/// Everything the optimizer needs to shape a plan.
#[derive(Debug, Clone)]
pub struct PlannerInput<'a> {
    pub current_price: f64,
    pub direction: TradeDirection,
    pub atr: f64,
    pub sr: &'a SupportResistance,
    pub style: TradingStyle,
    pub risk: RiskTolerance,
    /// Best pattern confidence in [0, 1]; scales the size recommendation.
    pub pattern_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub direction: TradeDirection,
    pub entry: EntryZone,
    pub stop: StopLoss,
    /// Ordered away from entry; 2-3 rungs depending on style.
    pub targets: Vec<Target>,
    /// Probability-and-size-weighted expected reward over risk.
    pub risk_reward: f64,
    /// Percent of account to commit.
    pub position_size_pct: f64,
}

impl TradePlan {
    /// Price-ordering and exit-budget invariants. A long plan must satisfy
    /// stop < optimal entry < target1 < target2 < ...; shorts mirror.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.targets.is_empty() {
            return Err(AnalysisError::InvalidPlan("no targets".into()));
        }
        let sign = self.direction.sign();
        let entry = self.entry.optimal;

        if sign * (entry - self.stop.price) <= 0.0 {
            return Err(AnalysisError::InvalidPlan(format!(
                "stop {} does not protect entry {} for {:?}",
                self.stop.price, entry, self.direction
            )));
        }
        let mut previous = entry;
        for (i, target) in self.targets.iter().enumerate() {
            if sign * (target.price - previous) <= 0.0 {
                return Err(AnalysisError::InvalidPlan(format!(
                    "target {} at {} is not beyond {}",
                    i + 1,
                    target.price,
                    previous
                )));
            }
            if !(0.0..=1.0).contains(&target.probability) {
                return Err(AnalysisError::InvalidPlan(format!(
                    "target {} probability {} outside [0, 1]",
                    i + 1,
                    target.probability
                )));
            }
            previous = target.price;
        }
        for pair in self.targets.windows(2) {
            if pair[1].probability > pair[0].probability {
                return Err(AnalysisError::InvalidPlan(
                    "target probabilities must not increase with distance".into(),
                ));
            }
        }
        let exit_total: f64 = self.targets.iter().map(|t| t.partial_exit_pct).sum();
        if exit_total > 100.0 + 1e-9 {
            return Err(AnalysisError::InvalidPlan(format!(
                "partial exits sum to {exit_total}%"
            )));
        }
        let entry_ordered = if self.direction == TradeDirection::Long {
            self.entry.conservative <= self.entry.optimal
                && self.entry.optimal <= self.entry.aggressive
        } else {
            self.entry.aggressive <= self.entry.optimal
                && self.entry.optimal <= self.entry.conservative
        };
        if !entry_ordered {
            return Err(AnalysisError::InvalidPlan("entry zone out of order".into()));
        }
        Ok(())
    }
}

pub fn build_plan(input: &PlannerInput<'_>) -> AnalysisResult<TradePlan> {
    if !(input.current_price > 0.0 && input.current_price.is_finite()) {
        return Err(AnalysisError::InvalidPlan(format!(
            "current price {} unusable",
            input.current_price
        )));
    }
    if !(input.atr > 0.0 && input.atr.is_finite()) {
        return Err(AnalysisError::InvalidPlan(format!(
            "ATR {} unusable — a flat window cannot size buffers",
            input.atr
        )));
    }

    let entry = entry::entry_zone(input);
    let stop = stop::stop_loss(input, &entry);
    let targets = targets::ladder(input, &entry, &stop);
    let risk = (entry.optimal - stop.price).abs();
    let risk_reward = targets::weighted_risk_reward(&targets, entry.optimal, risk);
    let position_size_pct = position_size(input, risk_reward);

    let plan = TradePlan {
        direction: input.direction,
        entry,
        stop,
        targets,
        risk_reward,
        position_size_pct,
    };
    plan.validate()?;
    tracing::debug!(
        direction = ?plan.direction,
        entry = plan.entry.optimal,
        stop = plan.stop.price,
        targets = plan.targets.len(),
        rr = plan.risk_reward,
        "plan built"
    );
    Ok(plan)
}

/// Plain first-target arithmetic: reward over risk.
pub fn risk_reward_ratio(entry: f64, target: f64, stop: f64) -> f64 {
    let risk = (entry - stop).abs();
    if risk <= 0.0 {
        return 0.0;
    }
    (target - entry).abs() / risk
}

/// "1.87" renders as "1.9:1".
pub fn format_risk_reward(ratio: f64) -> String {
    format!("{ratio:.1}:1")
}

/// Base percentage from risk tolerance, scaled up when the setup earns it
/// and down when it does not; bounded to [0.5, 1.5] x base with an absolute
/// 2 x base ceiling.
fn position_size(input: &PlannerInput<'_>, risk_reward: f64) -> f64 {
    let base = input.risk.base_position_pct();
    let mut factor: f64 = 1.0;
    if risk_reward >= 2.0 {
        factor += 0.25;
    }
    if risk_reward >= 3.0 {
        factor += 0.25;
    }
    if risk_reward < 1.5 {
        factor -= 0.25;
    }
    if input.pattern_confidence >= 0.7 {
        factor += 0.25;
    }
    if input.pattern_confidence < 0.4 {
        factor -= 0.25;
    }
    (base * factor.clamp(0.5, 1.5)).min(2.0 * base)
}
