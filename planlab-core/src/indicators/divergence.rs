//! RSI/price divergence via swing comparison.
//!
//! Bullish: price prints a lower swing low while RSI prints a higher low at
//! those bars. Bearish: price prints a higher swing high while RSI prints a
//! lower high. Compared on actual pivots, not raw extremes, so one spiky bar
//! cannot fake a divergence.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::error::AnalysisResult;
use crate::structure::{find_swings, SwingKind, SwingPoint};

use super::rsi::rsi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceKind {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub kind: DivergenceKind,
    /// (earlier, later) swing prices.
    pub price_points: (f64, f64),
    /// RSI values at the same two bars.
    pub rsi_points: (f64, f64),
    /// Bar index of the later swing.
    pub at_index: usize,
}

/// Check the two most recent swing pairs for divergence. `Ok(None)` means
/// the window is clean — not an error.
pub fn detect_divergence(bars: &[PriceBar], period: usize) -> AnalysisResult<Option<Divergence>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let rsi_series = rsi(&closes, period)?;

    let swings = find_swings(bars);
    let lows: Vec<&SwingPoint> = swings.iter().filter(|s| s.kind == SwingKind::Low).collect();
    let highs: Vec<&SwingPoint> = swings.iter().filter(|s| s.kind == SwingKind::High).collect();

    let bullish = divergence_at(&lows, &rsi_series, |price_falls, rsi_rises| {
        price_falls && rsi_rises
    })
    .map(|(a, b)| Divergence {
        kind: DivergenceKind::Bullish,
        price_points: (a.price, b.price),
        rsi_points: (rsi_series[a.index], rsi_series[b.index]),
        at_index: b.index,
    });

    let bearish = divergence_at(&highs, &rsi_series, |price_falls, rsi_rises| {
        !price_falls && !rsi_rises
    })
    .map(|(a, b)| Divergence {
        kind: DivergenceKind::Bearish,
        price_points: (a.price, b.price),
        rsi_points: (rsi_series[a.index], rsi_series[b.index]),
        at_index: b.index,
    });

    // When both sides diverge, report the more recent one.
    Ok(match (bullish, bearish) {
        (Some(bull), Some(bear)) => {
            if bull.at_index >= bear.at_index {
                Some(bull)
            } else {
                Some(bear)
            }
        }
        (bull, bear) => bull.or(bear),
    })
}

/// The last two swings of one kind, when both have valid RSI and the
/// (price_falls, rsi_rises) combination matches.
fn divergence_at<'a>(
    swings: &[&'a SwingPoint],
    rsi_series: &[f64],
    matches: impl Fn(bool, bool) -> bool,
) -> Option<(&'a SwingPoint, &'a SwingPoint)> {
    if swings.len() < 2 {
        return None;
    }
    let earlier = swings[swings.len() - 2];
    let later = swings[swings.len() - 1];
    let rsi_a = rsi_series[earlier.index];
    let rsi_b = rsi_series[later.index];
    if rsi_a.is_nan() || rsi_b.is_nan() {
        return None;
    }
    let price_falls = later.price < earlier.price;
    let rsi_rises = rsi_b > rsi_a;
    if matches(price_falls, rsi_rises) {
        Some((earlier, later))
    } else {
        None
    }
}
