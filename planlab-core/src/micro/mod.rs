//! Microstructure — spread, liquidity, order flow, and smart-money metrics
//! from order-book snapshots and the trade tape.
//!
//! Both inputs are optional. Missing data degrades the report to documented
//! neutral defaults (`MicrostructureReport::neutral()` pieces) with the
//! `data_quality` field saying what was absent; only corrupt data (a crossed
//! book) is an error.

mod flow;
mod quality;

pub use flow::{OrderFlow, SmartMoney};
pub use quality::MarketQuality;

use serde::{Deserialize, Serialize};

use crate::config::MicroConfig;
use crate::domain::{OrderBookSnapshot, Trade};
use crate::error::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadTrend {
    Widening,
    Narrowing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityLevel {
    High,
    Medium,
    Low,
}

/// What the analyzer actually had to work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    Full,
    BookOnly,
    TradesOnly,
    Missing,
}

/// Spread/depth metrics from the latest snapshot plus the rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMetrics {
    pub spread: f64,
    /// Spread as a fraction of the mid price.
    pub spread_pct: f64,
    pub spread_trend: SpreadTrend,
    pub bid_depth: f64,
    pub ask_depth: f64,
    pub liquidity: LiquidityLevel,
}

impl BookMetrics {
    fn neutral() -> Self {
        Self {
            spread: 0.0,
            spread_pct: 0.0,
            spread_trend: SpreadTrend::Stable,
            bid_depth: 0.0,
            ask_depth: 0.0,
            liquidity: LiquidityLevel::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrostructureReport {
    pub book: BookMetrics,
    pub flow: OrderFlow,
    pub smart_money: SmartMoney,
    pub quality: MarketQuality,
    pub data_quality: DataQuality,
}

impl MicrostructureReport {
    /// The documented degraded default: contributes no directional vote and
    /// no risk flags downstream.
    pub fn neutral() -> Self {
        Self {
            book: BookMetrics::neutral(),
            flow: OrderFlow::neutral(),
            smart_money: SmartMoney::neutral(),
            quality: MarketQuality::neutral(),
            data_quality: DataQuality::Missing,
        }
    }
}

pub fn analyze(
    books: &[OrderBookSnapshot],
    trades: &[Trade],
    config: &MicroConfig,
) -> AnalysisResult<MicrostructureReport> {
    let data_quality = match (books.is_empty(), trades.is_empty()) {
        (true, true) => return Ok(MicrostructureReport::neutral()),
        (false, false) => DataQuality::Full,
        (false, true) => DataQuality::BookOnly,
        (true, false) => DataQuality::TradesOnly,
    };

    let book = if books.is_empty() {
        BookMetrics::neutral()
    } else {
        book_metrics(books, config)?
    };

    let flow = flow::order_flow(trades);
    let smart_money = flow::smart_money(trades, config);
    let quality = quality::score(books, &book, &flow, config)?;

    Ok(MicrostructureReport {
        book,
        flow,
        smart_money,
        quality,
        data_quality,
    })
}

/// Spread and depth from the latest snapshot; trend from the rolling window.
/// Any crossed snapshot in the window rejects the whole call.
fn book_metrics(books: &[OrderBookSnapshot], config: &MicroConfig) -> AnalysisResult<BookMetrics> {
    let window = &books[books.len().saturating_sub(config.spread_window)..];
    let mut spreads = Vec::with_capacity(window.len());
    let mut depths = Vec::with_capacity(window.len());
    for snap in window {
        spreads.push(snap.spread()?);
        let (bid, ask) = snap.total_depth();
        depths.push(bid + ask);
    }

    let Some(latest) = window.last() else {
        return Ok(BookMetrics::neutral());
    };
    let spread = latest.spread()?;
    let mid = latest.mid_price()?;
    let spread_pct = spread / mid;
    let (bid_depth, ask_depth) = latest.total_depth();

    let spread_trend = spread_trend(&spreads, config.spread_trend_threshold);

    let mean_depth = depths.iter().sum::<f64>() / depths.len() as f64;
    let depth_ratio = if mean_depth > 0.0 {
        (bid_depth + ask_depth) / mean_depth
    } else {
        0.0
    };
    let liquidity = if spread_pct <= 0.0005 && depth_ratio >= 1.0 {
        LiquidityLevel::High
    } else if spread_pct >= 0.002 || depth_ratio <= 0.5 {
        LiquidityLevel::Low
    } else {
        LiquidityLevel::Medium
    };

    Ok(BookMetrics {
        spread,
        spread_pct,
        spread_trend,
        bid_depth,
        ask_depth,
        liquidity,
    })
}

/// First-half vs last-half mean spread; a relative change beyond the
/// threshold counts as a trend.
fn spread_trend(spreads: &[f64], threshold: f64) -> SpreadTrend {
    let mid = spreads.len() / 2;
    if mid == 0 {
        return SpreadTrend::Stable;
    }
    let first = spreads[..mid].iter().sum::<f64>() / mid as f64;
    let last = spreads[mid..].iter().sum::<f64>() / (spreads.len() - mid) as f64;
    if first <= 0.0 {
        return SpreadTrend::Stable;
    }
    let change = (last - first) / first;
    if change > threshold {
        SpreadTrend::Widening
    } else if change < -threshold {
        SpreadTrend::Narrowing
    } else {
        SpreadTrend::Stable
    }
}
