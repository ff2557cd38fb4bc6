//! Support and resistance extraction from swing pivots.
//!
//! Swing lows cluster into supports, swing highs into resistances. Pivots
//! within `cluster_tolerance_pct` of each other merge into one level whose
//! strength grows with touch count.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::error::{AnalysisError, AnalysisResult};
use crate::structure::{find_swings, SwingKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub touches: usize,
    /// 0-100, saturating with touch count.
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    /// Sorted ascending by price.
    pub supports: Vec<PriceLevel>,
    /// Sorted ascending by price.
    pub resistances: Vec<PriceLevel>,
}

impl SupportResistance {
    /// Closest support strictly below `price`.
    pub fn nearest_support(&self, price: f64) -> Option<&PriceLevel> {
        self.supports
            .iter()
            .filter(|l| l.price < price)
            .max_by(|a, b| a.price.total_cmp(&b.price))
    }

    /// Closest resistance strictly above `price`.
    pub fn nearest_resistance(&self, price: f64) -> Option<&PriceLevel> {
        self.resistances
            .iter()
            .filter(|l| l.price > price)
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    /// Touch density near `price`: total touches of levels within
    /// `tolerance_pct` of it, on either side.
    pub fn touch_density(&self, price: f64, tolerance_pct: f64) -> usize {
        self.supports
            .iter()
            .chain(&self.resistances)
            .filter(|l| (l.price - price).abs() / price <= tolerance_pct)
            .map(|l| l.touches)
            .sum()
    }
}

const MIN_BARS: usize = 5;

pub fn support_resistance(
    bars: &[PriceBar],
    cluster_tolerance_pct: f64,
) -> AnalysisResult<SupportResistance> {
    if bars.len() < MIN_BARS {
        return Err(AnalysisError::insufficient(MIN_BARS, bars.len()));
    }
    if !(cluster_tolerance_pct > 0.0 && cluster_tolerance_pct.is_finite()) {
        return Err(AnalysisError::InvalidConfig(
            "cluster_tolerance_pct must be positive and finite".into(),
        ));
    }

    let swings = find_swings(bars);
    let mut low_prices: Vec<f64> = swings
        .iter()
        .filter(|s| s.kind == SwingKind::Low)
        .map(|s| s.price)
        .collect();
    let mut high_prices: Vec<f64> = swings
        .iter()
        .filter(|s| s.kind == SwingKind::High)
        .map(|s| s.price)
        .collect();

    // A window too smooth to pivot still has a floor and a ceiling.
    if low_prices.is_empty() {
        low_prices.push(bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min));
    }
    if high_prices.is_empty() {
        high_prices.push(bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max));
    }

    Ok(SupportResistance {
        supports: cluster(low_prices, cluster_tolerance_pct),
        resistances: cluster(high_prices, cluster_tolerance_pct),
    })
}

/// Merge sorted pivot prices into levels: a pivot joins the current cluster
/// while it stays within tolerance of the cluster mean.
fn cluster(mut prices: Vec<f64>, tolerance_pct: f64) -> Vec<PriceLevel> {
    prices.sort_by(f64::total_cmp);
    let mut levels: Vec<PriceLevel> = Vec::new();
    let mut cluster: Vec<f64> = Vec::new();

    let flush = |cluster: &mut Vec<f64>, levels: &mut Vec<PriceLevel>| {
        if cluster.is_empty() {
            return;
        }
        let mean = cluster.iter().sum::<f64>() / cluster.len() as f64;
        let touches = cluster.len();
        levels.push(PriceLevel {
            price: mean,
            touches,
            strength: (touches as f64 * 30.0).min(100.0),
        });
        cluster.clear();
    };

    for price in prices {
        match cluster.last() {
            Some(_) => {
                let mean = cluster.iter().sum::<f64>() / cluster.len() as f64;
                if (price - mean).abs() / mean <= tolerance_pct {
                    cluster.push(price);
                } else {
                    flush(&mut cluster, &mut levels);
                    cluster.push(price);
                }
            }
            None => cluster.push(price),
        }
    }
    flush(&mut cluster, &mut levels);
    levels
}
