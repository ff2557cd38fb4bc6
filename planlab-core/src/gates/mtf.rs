//! Multi-timeframe confirmation gate.
//!
//! Decides when higher-timeframe corroboration is mandatory, emits a
//! `ConfirmationRequest` naming the missing timeframes, and aggregates the
//! answers by confidence-weighted strict majority once they arrive.
//!
//! Note the deliberate asymmetry: a very strong signal in a strong trend
//! requires MORE confirmation, not less. Strong-and-obvious setups are
//! exactly where crowded entries get trapped, so the gate treats them as
//! high-impact rather than waving them through.

use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::domain::{Direction, Timeframe, TradingStyle};

/// Condition flags the pipeline derives from its analyzers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketConditions {
    /// ATR as a fraction of price on the working timeframe.
    pub atr_pct: f64,
    /// Sideways or structure-broken tape.
    pub choppy: bool,
    /// Clean directional trend on the working timeframe.
    pub strong_trend: bool,
    /// Conflict flags carried over from the consensus builder.
    pub conflicting_signals: Vec<String>,
}

/// The single round-trip token: created when the gate withholds a plan,
/// consumed by `resolve_confirmations`, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub required: Vec<Timeframe>,
    pub reasons: Vec<String>,
}

/// One higher-timeframe analysis result supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeConfirmation {
    pub timeframe: Timeframe,
    pub bias: Direction,
    /// 0-100.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationDecision {
    pub can_proceed: bool,
    /// The aggregated higher-timeframe bias; `None` when the vote is mixed
    /// or evidence is still missing.
    pub overall_bias: Option<Direction>,
    pub missing: Vec<Timeframe>,
    pub reasons: Vec<String>,
}

/// Decide whether the setup may release immediately. `None` means no
/// higher-timeframe evidence is needed; otherwise the request names every
/// timeframe that must weigh in.
pub fn confirmation_request(
    working: Timeframe,
    signal_strength: f64,
    style: TradingStyle,
    conditions: &MarketConditions,
    config: &GateConfig,
) -> Option<ConfirmationRequest> {
    let mut reasons = Vec::new();

    if signal_strength < config.mtf_strength_floor {
        reasons.push(format!(
            "signal strength {signal_strength:.0} under the {:.0} floor",
            config.mtf_strength_floor
        ));
    }
    if !conditions.conflicting_signals.is_empty() {
        reasons.push(format!(
            "{} unresolved signal conflict(s)",
            conditions.conflicting_signals.len()
        ));
    }
    if working.minutes() <= config.mtf_fast_timeframe_minutes {
        reasons.push(format!(
            "{working} is fast enough to need higher-timeframe context"
        ));
    }
    if style.requires_htf_alignment() {
        reasons.push(format!("{style:?} style always requires alignment"));
    }
    if signal_strength > config.mtf_high_impact_threshold && conditions.strong_trend {
        reasons.push(format!(
            "high-impact setup: strength {signal_strength:.0} in a strong trend draws crowded entries"
        ));
    }

    if reasons.is_empty() {
        return None;
    }
    let required = working.higher();
    if required.is_empty() {
        // Nothing above the daily in the supported ladder.
        return None;
    }
    Some(ConfirmationRequest { required, reasons })
}

/// Aggregate supplied confirmations against a pending request.
///
/// Releases only when every required timeframe answered, the
/// confidence-weighted vote has a strict majority (a 3-way split is mixed,
/// not a plurality win), and that majority matches the desired direction.
pub fn resolve_confirmations(
    request: &ConfirmationRequest,
    confirmations: &[TimeframeConfirmation],
    desired: Direction,
) -> ConfirmationDecision {
    let missing: Vec<Timeframe> = request
        .required
        .iter()
        .copied()
        .filter(|tf| !confirmations.iter().any(|c| c.timeframe == *tf))
        .collect();
    if !missing.is_empty() {
        let reasons = missing
            .iter()
            .map(|tf| format!("still waiting on {tf} analysis"))
            .collect();
        return ConfirmationDecision {
            can_proceed: false,
            overall_bias: None,
            missing,
            reasons,
        };
    }

    let weight_of = |side: Direction| -> f64 {
        confirmations
            .iter()
            .filter(|c| c.bias == side)
            .map(|c| c.confidence.max(0.0))
            .sum()
    };
    let bull = weight_of(Direction::Bullish);
    let bear = weight_of(Direction::Bearish);
    let neutral = weight_of(Direction::Neutral);
    let total = bull + bear + neutral;

    let (winner, winner_weight) = if bull >= bear && bull >= neutral {
        (Direction::Bullish, bull)
    } else if bear >= bull && bear >= neutral {
        (Direction::Bearish, bear)
    } else {
        (Direction::Neutral, neutral)
    };

    if total <= 0.0 || winner_weight <= total / 2.0 {
        return ConfirmationDecision {
            can_proceed: false,
            overall_bias: None,
            missing: Vec::new(),
            reasons: vec![format!(
                "higher timeframes are mixed (bull {bull:.0} / bear {bear:.0} / neutral {neutral:.0})"
            )],
        };
    }

    if winner != desired {
        return ConfirmationDecision {
            can_proceed: false,
            overall_bias: Some(winner),
            missing: Vec::new(),
            reasons: vec![format!(
                "higher timeframes lean {winner:?} against the requested {desired:?}"
            )],
        };
    }

    ConfirmationDecision {
        can_proceed: true,
        overall_bias: Some(winner),
        missing: Vec::new(),
        reasons: vec![format!(
            "higher timeframes back {winner:?} with {:.0}% of the weight",
            100.0 * winner_weight / total
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_conditions() -> MarketConditions {
        MarketConditions::default()
    }

    fn confirm(tf: Timeframe, bias: Direction, confidence: f64) -> TimeframeConfirmation {
        TimeframeConfirmation {
            timeframe: tf,
            bias,
            confidence,
        }
    }

    #[test]
    fn clean_strong_h1_day_trade_needs_nothing() {
        let request = confirmation_request(
            Timeframe::H1,
            80.0,
            TradingStyle::DayTrading,
            &quiet_conditions(),
            &GateConfig::default(),
        );
        assert!(request.is_none());
    }

    #[test]
    fn weak_signal_triggers_a_request() {
        let request = confirmation_request(
            Timeframe::H1,
            55.0,
            TradingStyle::DayTrading,
            &quiet_conditions(),
            &GateConfig::default(),
        )
        .unwrap();
        assert_eq!(request.required, vec![Timeframe::H4, Timeframe::D1]);
        assert!(request.reasons[0].contains("strength"));
    }

    #[test]
    fn fast_timeframes_always_trigger() {
        let request = confirmation_request(
            Timeframe::M15,
            90.0,
            TradingStyle::DayTrading,
            &quiet_conditions(),
            &GateConfig::default(),
        )
        .unwrap();
        assert!(request.reasons.iter().any(|r| r.contains("15m")));
    }

    #[test]
    fn swing_style_always_triggers() {
        let request = confirmation_request(
            Timeframe::H4,
            80.0,
            TradingStyle::Swing,
            &quiet_conditions(),
            &GateConfig::default(),
        )
        .unwrap();
        assert_eq!(request.required, vec![Timeframe::D1]);
    }

    #[test]
    fn high_impact_rule_demands_more_not_less() {
        let conditions = MarketConditions {
            strong_trend: true,
            ..quiet_conditions()
        };
        let request = confirmation_request(
            Timeframe::H1,
            92.0,
            TradingStyle::DayTrading,
            &conditions,
            &GateConfig::default(),
        )
        .unwrap();
        assert!(request.reasons.iter().any(|r| r.contains("high-impact")));
    }

    #[test]
    fn missing_timeframe_blocks_release() {
        let request = ConfirmationRequest {
            required: vec![Timeframe::H4, Timeframe::D1],
            reasons: vec!["test".into()],
        };
        let decision = resolve_confirmations(
            &request,
            &[confirm(Timeframe::H4, Direction::Bullish, 90.0)],
            Direction::Bullish,
        );
        assert!(!decision.can_proceed);
        assert_eq!(decision.missing, vec![Timeframe::D1]);
    }

    #[test]
    fn aligned_majority_releases() {
        let request = ConfirmationRequest {
            required: vec![Timeframe::H4, Timeframe::D1],
            reasons: vec!["test".into()],
        };
        let decision = resolve_confirmations(
            &request,
            &[
                confirm(Timeframe::H4, Direction::Bullish, 80.0),
                confirm(Timeframe::D1, Direction::Bullish, 70.0),
            ],
            Direction::Bullish,
        );
        assert!(decision.can_proceed);
        assert_eq!(decision.overall_bias, Some(Direction::Bullish));
    }

    #[test]
    fn three_way_split_is_mixed_not_plurality() {
        let request = ConfirmationRequest {
            required: vec![Timeframe::M30, Timeframe::H1],
            reasons: vec!["test".into()],
        };
        let decision = resolve_confirmations(
            &request,
            &[
                confirm(Timeframe::M30, Direction::Bullish, 50.0),
                confirm(Timeframe::H1, Direction::Bearish, 40.0),
                confirm(Timeframe::H4, Direction::Neutral, 30.0),
            ],
            Direction::Bullish,
        );
        // bull 50 of 120 total: a plurality, not a strict majority
        assert!(!decision.can_proceed);
        assert_eq!(decision.overall_bias, None);
        assert!(decision.reasons[0].contains("mixed"));
    }

    #[test]
    fn opposing_majority_blocks() {
        let request = ConfirmationRequest {
            required: vec![Timeframe::H4],
            reasons: vec!["test".into()],
        };
        let decision = resolve_confirmations(
            &request,
            &[confirm(Timeframe::H4, Direction::Bearish, 90.0)],
            Direction::Bullish,
        );
        assert!(!decision.can_proceed);
        assert_eq!(decision.overall_bias, Some(Direction::Bearish));
    }

    #[test]
    fn conflicts_from_consensus_trigger() {
        let conditions = MarketConditions {
            conflicting_signals: vec!["smart money dissents".into()],
            ..quiet_conditions()
        };
        let request = confirmation_request(
            Timeframe::H1,
            80.0,
            TradingStyle::DayTrading,
            &conditions,
            &GateConfig::default(),
        )
        .unwrap();
        assert!(request.reasons.iter().any(|r| r.contains("conflict")));
    }
}
