//! Swing point detection via 3-bar pivots.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub kind: SwingKind,
}

/// Local swing highs and lows: bar `i` is a swing high when
/// `high[i] > high[i-1]` and `high[i] > high[i+1]` (symmetric for lows).
/// Returned in bar order. The first and last bar can never be pivots.
pub fn find_swings(bars: &[PriceBar]) -> Vec<SwingPoint> {
    let mut swings = Vec::new();
    if bars.len() < 3 {
        return swings;
    }

    for i in 1..bars.len() - 1 {
        if bars[i].high > bars[i - 1].high && bars[i].high > bars[i + 1].high {
            swings.push(SwingPoint {
                index: i,
                price: bars[i].high,
                kind: SwingKind::High,
            });
        }
        if bars[i].low < bars[i - 1].low && bars[i].low < bars[i + 1].low {
            swings.push(SwingPoint {
                index: i,
                price: bars[i].low,
                kind: SwingKind::Low,
            });
        }
    }

    swings
}
