//! Stop-loss placement — beyond the invalidation structure, never too tight.

use serde::{Deserialize, Serialize};

use crate::domain::TradeDirection;

use super::{EntryZone, PlannerInput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopLoss {
    pub price: f64,
    /// Distance added beyond the structural level, or the full volatility
    /// distance when no structure anchors the stop.
    pub buffer: f64,
    pub rationale: String,
}

/// Structural stop when a level exists beyond the entry, else a volatility
/// stop at `volatility_multiplier x ATR`. Either way the final distance is
/// clamped to the style's minimum percentage floor.
pub(crate) fn stop_loss(input: &PlannerInput<'_>, entry: &EntryZone) -> StopLoss {
    let atr = input.atr;
    let anchor_entry = entry.optimal;
    // Buffer beyond structure: a slice of ATR, but never thinner than the
    // percentage floor.
    let buffer = (0.3 * atr).max(input.style.min_stop_pct() * input.current_price);
    let volatility_distance =
        input.risk.volatility_multiplier() * input.style.stop_factor() * atr;
    let floor_distance = input.style.min_stop_pct() * input.current_price;

    let (mut price, buffer_used, rationale) = match input.direction {
        TradeDirection::Long => match input.sr.nearest_support(anchor_entry) {
            Some(level) => (
                level.price - buffer,
                buffer,
                format!("below {:.4} support plus {:.4} buffer", level.price, buffer),
            ),
            None => (
                anchor_entry - volatility_distance,
                volatility_distance,
                format!("{volatility_distance:.4} volatility stop, no structure below"),
            ),
        },
        TradeDirection::Short => match input.sr.nearest_resistance(anchor_entry) {
            Some(level) => (
                level.price + buffer,
                buffer,
                format!("above {:.4} resistance plus {:.4} buffer", level.price, buffer),
            ),
            None => (
                anchor_entry + volatility_distance,
                volatility_distance,
                format!("{volatility_distance:.4} volatility stop, no structure above"),
            ),
        },
    };

    // Clamp: a stop closer than the floor is noise, not protection.
    match input.direction {
        TradeDirection::Long => {
            if anchor_entry - price < floor_distance {
                price = anchor_entry - floor_distance;
            }
        }
        TradeDirection::Short => {
            if price - anchor_entry < floor_distance {
                price = anchor_entry + floor_distance;
            }
        }
    }

    StopLoss {
        price,
        buffer: buffer_used,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::super::entry::entry_zone;
    use super::super::testutil::sr_with;
    use super::*;
    use crate::domain::{RiskTolerance, TradingStyle};

    fn input<'a>(
        direction: TradeDirection,
        risk: RiskTolerance,
        sr: &'a crate::indicators::SupportResistance,
    ) -> PlannerInput<'a> {
        PlannerInput {
            current_price: 100.0,
            direction,
            atr: 2.0,
            sr,
            style: TradingStyle::DayTrading,
            risk,
            pattern_confidence: 0.7,
        }
    }

    #[test]
    fn structural_stop_sits_below_support() {
        let sr = sr_with(&[97.0], &[105.0]);
        let input = input(TradeDirection::Long, RiskTolerance::Moderate, &sr);
        let entry = entry_zone(&input);
        let stop = stop_loss(&input, &entry);
        // buffer = max(0.6, 0.3) = 0.6 → 96.4
        assert!((stop.price - 96.4).abs() < 1e-9);
        assert!(stop.rationale.contains("support"));
    }

    #[test]
    fn volatility_stop_without_structure() {
        let sr = sr_with(&[], &[]);
        let conservative = input(TradeDirection::Long, RiskTolerance::Conservative, &sr);
        let aggressive = input(TradeDirection::Long, RiskTolerance::Aggressive, &sr);
        let entry_c = entry_zone(&conservative);
        let entry_a = entry_zone(&aggressive);
        let stop_c = stop_loss(&conservative, &entry_c);
        let stop_a = stop_loss(&aggressive, &entry_a);
        // conservative multiplier 2.0 vs aggressive 1.2 → wider stop
        assert!(stop_c.price < stop_a.price);
        assert!(stop_c.rationale.contains("volatility"));
    }

    #[test]
    fn floor_clamp_rejects_hairline_stops() {
        // support almost touching the entry: raw stop would be ~0.06% away
        let sr = sr_with(&[99.9], &[105.0]);
        let mut planner_input = input(TradeDirection::Long, RiskTolerance::Moderate, &sr);
        planner_input.atr = 0.1;
        let entry = entry_zone(&planner_input);
        let stop = stop_loss(&planner_input, &entry);
        let distance = entry.optimal - stop.price;
        assert!(distance >= TradingStyle::DayTrading.min_stop_pct() * 100.0 - 1e-9);
    }

    #[test]
    fn short_stop_sits_above_resistance() {
        let sr = sr_with(&[95.0], &[103.0]);
        let input = input(TradeDirection::Short, RiskTolerance::Moderate, &sr);
        let entry = entry_zone(&input);
        let stop = stop_loss(&input, &entry);
        assert!(stop.price > entry.optimal);
        assert!((stop.price - 103.6).abs() < 1e-9);
    }
}
