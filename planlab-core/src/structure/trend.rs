//! Trend classification and structure-break detection.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::error::{AnalysisError, AnalysisResult};

use super::swings::{find_swings, SwingKind, SwingPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStructure {
    pub swings: Vec<SwingPoint>,
    pub trend: Trend,
    /// True when the most recent swing violated the prevailing trend:
    /// an uptrend printing a lower low, or a downtrend a higher high.
    pub structure_break: bool,
    pub last_swing_high: Option<f64>,
    pub last_swing_low: Option<f64>,
}

const MIN_BARS: usize = 5;

/// Classify the window's structure.
///
/// With two swing highs and two swing lows available, the trend is read off
/// the most recent pairs (both rising → uptrend, both falling → downtrend,
/// else sideways). A window too smooth to print pivots — e.g. a straight
/// monotone run — falls back to comparing the first-half and second-half
/// means of highs and lows, so a clean 10-bar climb still reads as an
/// uptrend rather than "no swings, no opinion".
pub fn classify(bars: &[PriceBar]) -> AnalysisResult<MarketStructure> {
    if bars.len() < MIN_BARS {
        return Err(AnalysisError::insufficient(MIN_BARS, bars.len()));
    }

    let swings = find_swings(bars);
    let highs: Vec<&SwingPoint> = swings.iter().filter(|s| s.kind == SwingKind::High).collect();
    let lows: Vec<&SwingPoint> = swings.iter().filter(|s| s.kind == SwingKind::Low).collect();

    let trend = trend_from_swings(&highs, &lows).unwrap_or_else(|| trend_from_halves(bars));

    // The break check asks: what did the trend look like before the latest
    // swing, and did that swing violate it?
    let structure_break = match swings.last() {
        Some(last) => {
            let prior_highs: Vec<&SwingPoint> = highs
                .iter()
                .copied()
                .filter(|s| s.index < last.index || s.kind != last.kind)
                .collect();
            let prior_lows: Vec<&SwingPoint> = lows
                .iter()
                .copied()
                .filter(|s| s.index < last.index || s.kind != last.kind)
                .collect();
            let prior_trend =
                trend_from_swings(&prior_highs, &prior_lows).unwrap_or_else(|| trend_from_halves(bars));
            match (prior_trend, last.kind) {
                (Trend::Uptrend, SwingKind::Low) => {
                    lows.len() >= 2 && lows[lows.len() - 1].price < lows[lows.len() - 2].price
                }
                (Trend::Downtrend, SwingKind::High) => {
                    highs.len() >= 2 && highs[highs.len() - 1].price > highs[highs.len() - 2].price
                }
                _ => false,
            }
        }
        None => false,
    };

    Ok(MarketStructure {
        last_swing_high: highs.last().map(|s| s.price),
        last_swing_low: lows.last().map(|s| s.price),
        swings,
        trend,
        structure_break,
    })
}

fn trend_from_swings(highs: &[&SwingPoint], lows: &[&SwingPoint]) -> Option<Trend> {
    if highs.len() < 2 || lows.len() < 2 {
        return None;
    }
    let (h1, h2) = (highs[highs.len() - 2].price, highs[highs.len() - 1].price);
    let (l1, l2) = (lows[lows.len() - 2].price, lows[lows.len() - 1].price);
    Some(if h2 > h1 && l2 > l1 {
        Trend::Uptrend
    } else if h2 < h1 && l2 < l1 {
        Trend::Downtrend
    } else {
        Trend::Sideways
    })
}

/// Pivot-free fallback: compare first-half vs second-half mean highs/lows.
fn trend_from_halves(bars: &[PriceBar]) -> Trend {
    let mid = bars.len() / 2;
    let mean = |slice: &[PriceBar], f: fn(&PriceBar) -> f64| {
        slice.iter().map(f).sum::<f64>() / slice.len() as f64
    };
    let high_rising = mean(&bars[mid..], |b| b.high) > mean(&bars[..mid], |b| b.high);
    let low_rising = mean(&bars[mid..], |b| b.low) > mean(&bars[..mid], |b| b.low);
    match (high_rising, low_rising) {
        (true, true) => Trend::Uptrend,
        (false, false) => Trend::Downtrend,
        _ => Trend::Sideways,
    }
}
