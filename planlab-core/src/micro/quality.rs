//! Market-quality scoring: efficiency, fairness, transparency.

use serde::{Deserialize, Serialize};

use crate::config::MicroConfig;
use crate::domain::OrderBookSnapshot;
use crate::error::AnalysisResult;

use super::{BookMetrics, LiquidityLevel, OrderFlow};

/// All components on a 0-100 scale; `overall` is their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuality {
    /// Tight spread and strong liquidity.
    pub efficiency: f64,
    /// Low flow and book imbalance.
    pub fairness: f64,
    /// Book depth plus liquidity resiliency (inverse of rolling depth
    /// volatility).
    pub transparency: f64,
    pub overall: f64,
}

impl MarketQuality {
    pub fn neutral() -> Self {
        Self {
            efficiency: 50.0,
            fairness: 50.0,
            transparency: 50.0,
            overall: 50.0,
        }
    }
}

pub(crate) fn score(
    books: &[OrderBookSnapshot],
    book: &BookMetrics,
    flow: &OrderFlow,
    config: &MicroConfig,
) -> AnalysisResult<MarketQuality> {
    if books.is_empty() {
        return Ok(MarketQuality::neutral());
    }

    // Efficiency: spread tightness blended with the liquidity class.
    let spread_component = (1.0 - book.spread_pct / 0.002).clamp(0.0, 1.0);
    let liquidity_component = match book.liquidity {
        LiquidityLevel::High => 1.0,
        LiquidityLevel::Medium => 0.6,
        LiquidityLevel::Low => 0.2,
    };
    let efficiency = 100.0 * (0.5 * spread_component + 0.5 * liquidity_component);

    // Fairness: neither the tape nor the resting book leans hard one way.
    let depth_total = book.bid_depth + book.ask_depth;
    let book_imbalance = if depth_total > 0.0 {
        ((book.bid_depth - book.ask_depth) / depth_total).abs()
    } else {
        0.0
    };
    let fairness = 100.0 * (1.0 - 0.5 * (flow.imbalance + book_imbalance)).clamp(0.0, 1.0);

    // Transparency: visible depth levels plus resiliency of total depth over
    // the rolling window.
    let window = &books[books.len().saturating_sub(config.spread_window)..];
    let depths: Vec<f64> = window
        .iter()
        .map(|s| {
            let (bid, ask) = s.total_depth();
            bid + ask
        })
        .collect();
    let mean_depth = depths.iter().sum::<f64>() / depths.len() as f64;
    let resiliency = if mean_depth > 0.0 {
        let variance = depths
            .iter()
            .map(|d| (d - mean_depth) * (d - mean_depth))
            .sum::<f64>()
            / depths.len() as f64;
        (1.0 - variance.sqrt() / mean_depth).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let level_count = window
        .last()
        .map(|snap| snap.bids.len().min(snap.asks.len()))
        .unwrap_or(0);
    let depth_component = (level_count as f64 / 10.0).clamp(0.0, 1.0);
    let transparency = 100.0 * (0.5 * depth_component + 0.5 * resiliency);

    let overall = (efficiency + fairness + transparency) / 3.0;
    Ok(MarketQuality {
        efficiency,
        fairness,
        transparency,
        overall,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::micro::testutil::snapshot;
    use crate::micro::SpreadTrend;

    fn tight_book() -> BookMetrics {
        BookMetrics {
            spread: 0.02,
            spread_pct: 0.0002,
            spread_trend: SpreadTrend::Stable,
            bid_depth: 25.0,
            ask_depth: 25.0,
            liquidity: LiquidityLevel::High,
        }
    }

    #[test]
    fn steady_tight_market_scores_high() {
        let books: Vec<_> = (0..10).map(|i| snapshot(i, 99.99, 100.01, 50.0)).collect();
        let quality = score(&books, &tight_book(), &OrderFlow::neutral(), &MicroConfig::default())
            .unwrap();
        assert!(quality.efficiency > 90.0);
        assert!(quality.fairness > 95.0);
        // steady depth → full resiliency
        assert!(quality.transparency > 45.0);
        assert!(quality.overall > 75.0);
    }

    #[test]
    fn erratic_depth_hurts_transparency() {
        let books: Vec<_> = (0..10)
            .map(|i| snapshot(i, 99.99, 100.01, if i % 2 == 0 { 10.0 } else { 90.0 }))
            .collect();
        let steady: Vec<_> = (0..10).map(|i| snapshot(i, 99.99, 100.01, 50.0)).collect();
        let flow = OrderFlow::neutral();
        let config = MicroConfig::default();
        let erratic_q = score(&books, &tight_book(), &flow, &config).unwrap();
        let steady_q = score(&steady, &tight_book(), &flow, &config).unwrap();
        assert!(erratic_q.transparency < steady_q.transparency);
    }

    #[test]
    fn one_sided_flow_hurts_fairness() {
        let books: Vec<_> = (0..10).map(|i| snapshot(i, 99.99, 100.01, 50.0)).collect();
        let skewed = OrderFlow {
            buy_volume: 90.0,
            sell_volume: 10.0,
            net_flow: 80.0,
            imbalance: 0.8,
            pressure: 0.9,
        };
        let config = MicroConfig::default();
        let fair = score(&books, &tight_book(), &OrderFlow::neutral(), &config).unwrap();
        let unfair = score(&books, &tight_book(), &skewed, &config).unwrap();
        assert!(unfair.fairness < fair.fairness);
    }

    #[test]
    fn no_books_is_neutral() {
        let quality = score(&[], &BookMetrics::neutral(), &OrderFlow::neutral(), &MicroConfig::default())
            .unwrap();
        assert_eq!(quality.overall, 50.0);
    }
}
