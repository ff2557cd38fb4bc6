//! Order-book snapshots and the trade tape.
//!
//! Optional inputs: their absence degrades the microstructure analyzer to a
//! neutral default instead of failing the pipeline. A crossed snapshot
//! (best bid >= best ask) is corrupt, not missing, and is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// One resting level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Point-in-time order book: bids ordered price-descending, asks ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub timestamp: DateTime<Utc>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBookSnapshot {
    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }

    /// Best-ask minus best-bid. Errors on a crossed book — no spread is
    /// computed from corrupt data.
    pub fn spread(&self) -> AnalysisResult<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid >= ask => {
                Err(AnalysisError::CrossedBook { bid, ask })
            }
            (Some(bid), Some(ask)) => Ok(ask - bid),
            _ => Err(AnalysisError::insufficient(1, 0)),
        }
    }

    /// Midpoint of the best bid/ask. Same crossed-book rejection as `spread`.
    pub fn mid_price(&self) -> AnalysisResult<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if bid >= ask => {
                Err(AnalysisError::CrossedBook { bid, ask })
            }
            (Some(bid), Some(ask)) => Ok((bid + ask) / 2.0),
            _ => Err(AnalysisError::insufficient(1, 0)),
        }
    }

    /// Total resting size on both sides.
    pub fn total_depth(&self) -> (f64, f64) {
        let bid_size = self.bids.iter().map(|l| l.size).sum();
        let ask_size = self.asks.iter().map(|l| l.size).sum();
        (bid_size, ask_size)
    }
}

/// Taker aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One print on the trade tape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub size: f64,
    pub side: TradeSide,
    pub id: u64,
}
