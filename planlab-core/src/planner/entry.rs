//! Entry zone — where to join, at three levels of patience.

use serde::{Deserialize, Serialize};

use crate::domain::TradeDirection;

use super::PlannerInput;

/// For a long: `aggressive` is at the market, `optimal` waits for the
/// style's pullback, `conservative` waits for a deeper one. Shorts mirror
/// (pullbacks are bounces up into resistance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryZone {
    pub optimal: f64,
    pub conservative: f64,
    pub aggressive: f64,
    pub rationale: String,
}

pub(crate) fn entry_zone(input: &PlannerInput<'_>) -> EntryZone {
    let price = input.current_price;
    let pullback = input.style.entry_atr_fraction() * input.atr;

    match input.direction {
        TradeDirection::Long => {
            let anchor = input.sr.nearest_support(price);
            // Entries never chase below a support's retest zone.
            let floor = anchor.map(|s| s.price + 0.1 * input.atr);
            let clamp = |p: f64| match floor {
                Some(f) => p.max(f).min(price),
                None => p.min(price),
            };
            let optimal = clamp(price - pullback);
            let conservative = clamp(price - 2.0 * pullback).min(optimal);
            let rationale = match anchor {
                Some(s) => format!(
                    "pullback toward {:.4} support ({} touches)",
                    s.price, s.touches
                ),
                None => "pullback from current price, no structure below".into(),
            };
            EntryZone {
                optimal,
                conservative,
                aggressive: price,
                rationale,
            }
        }
        TradeDirection::Short => {
            let anchor = input.sr.nearest_resistance(price);
            let ceiling = anchor.map(|r| r.price - 0.1 * input.atr);
            let clamp = |p: f64| match ceiling {
                Some(c) => p.min(c).max(price),
                None => p.max(price),
            };
            let optimal = clamp(price + pullback);
            let conservative = clamp(price + 2.0 * pullback).max(optimal);
            let rationale = match anchor {
                Some(r) => format!(
                    "bounce toward {:.4} resistance ({} touches)",
                    r.price, r.touches
                ),
                None => "bounce from current price, no structure above".into(),
            };
            EntryZone {
                optimal,
                conservative,
                aggressive: price,
                rationale,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::sr_with;
    use super::*;
    use crate::domain::{RiskTolerance, TradingStyle};

    fn input<'a>(
        direction: TradeDirection,
        style: TradingStyle,
        sr: &'a crate::indicators::SupportResistance,
    ) -> PlannerInput<'a> {
        PlannerInput {
            current_price: 100.0,
            direction,
            atr: 2.0,
            sr,
            style,
            risk: RiskTolerance::Moderate,
            pattern_confidence: 0.7,
        }
    }

    #[test]
    fn scalping_enters_near_price() {
        let sr = sr_with(&[95.0], &[105.0]);
        let scalp = entry_zone(&input(TradeDirection::Long, TradingStyle::Scalping, &sr));
        let swing = entry_zone(&input(TradeDirection::Long, TradingStyle::Swing, &sr));
        // scalping pullback 0.1 * 2.0 = 0.2 vs swing 0.5 * 2.0 = 1.0
        assert!((scalp.optimal - 99.8).abs() < 1e-9);
        assert!((swing.optimal - 99.0).abs() < 1e-9);
        assert!(scalp.optimal > swing.optimal);
        assert_eq!(scalp.aggressive, 100.0);
    }

    #[test]
    fn long_zone_is_ordered() {
        let sr = sr_with(&[95.0], &[105.0]);
        let zone = entry_zone(&input(TradeDirection::Long, TradingStyle::DayTrading, &sr));
        assert!(zone.conservative <= zone.optimal);
        assert!(zone.optimal <= zone.aggressive);
        assert!(zone.rationale.contains("95"));
    }

    #[test]
    fn support_floor_caps_the_pullback() {
        // support at 99.5: even a deep style cannot plan below its retest zone
        let sr = sr_with(&[99.5], &[105.0]);
        let zone = entry_zone(&input(TradeDirection::Long, TradingStyle::Position, &sr));
        assert!(zone.conservative >= 99.5 + 0.2 - 1e-9);
        assert!(zone.optimal <= 100.0);
    }

    #[test]
    fn short_zone_mirrors() {
        let sr = sr_with(&[95.0], &[105.0]);
        let zone = entry_zone(&input(TradeDirection::Short, TradingStyle::DayTrading, &sr));
        assert!(zone.aggressive <= zone.optimal);
        assert!(zone.optimal <= zone.conservative);
        assert!((zone.optimal - 100.5).abs() < 1e-9);
    }

    #[test]
    fn no_structure_still_yields_a_zone() {
        let sr = sr_with(&[], &[]);
        let zone = entry_zone(&input(TradeDirection::Long, TradingStyle::DayTrading, &sr));
        assert!(zone.conservative <= zone.optimal && zone.optimal <= zone.aggressive);
        assert!(zone.rationale.contains("no structure"));
    }
}
