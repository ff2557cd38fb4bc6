//! Order-flow pressure and smart-money classification from the trade tape.

use serde::{Deserialize, Serialize};

use crate::config::MicroConfig;
use crate::domain::{Direction, Trade, TradeSide};

/// Aggregate taker flow over the tape window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFlow {
    pub buy_volume: f64,
    pub sell_volume: f64,
    /// buy_volume - sell_volume.
    pub net_flow: f64,
    /// |net_flow| / total volume, in [0, 1].
    pub imbalance: f64,
    /// Buy share of total volume, in [0, 1]. 0.5 when there is no tape.
    pub pressure: f64,
}

impl OrderFlow {
    pub fn neutral() -> Self {
        Self {
            buy_volume: 0.0,
            sell_volume: 0.0,
            net_flow: 0.0,
            imbalance: 0.0,
            pressure: 0.5,
        }
    }
}

/// Large-trade (institutional) flow split out from retail flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMoney {
    pub direction: Direction,
    /// Share of institutional volume explained by its net flow, in [0, 1].
    pub confidence: f64,
    /// Net flow of trades at or above the large-trade threshold.
    pub institutional_flow: f64,
    /// Net flow of everything below the threshold.
    pub retail_flow: f64,
    pub institutional_volume: f64,
    pub large_trade_threshold: f64,
}

impl SmartMoney {
    pub fn neutral() -> Self {
        Self {
            direction: Direction::Neutral,
            confidence: 0.0,
            institutional_flow: 0.0,
            retail_flow: 0.0,
            institutional_volume: 0.0,
            large_trade_threshold: 0.0,
        }
    }
}

pub(crate) fn order_flow(trades: &[Trade]) -> OrderFlow {
    if trades.is_empty() {
        return OrderFlow::neutral();
    }
    let buy_volume: f64 = trades
        .iter()
        .filter(|t| t.side == TradeSide::Buy)
        .map(|t| t.size)
        .sum();
    let sell_volume: f64 = trades
        .iter()
        .filter(|t| t.side == TradeSide::Sell)
        .map(|t| t.size)
        .sum();
    let total = buy_volume + sell_volume;
    let net_flow = buy_volume - sell_volume;
    OrderFlow {
        buy_volume,
        sell_volume,
        net_flow,
        imbalance: if total > 0.0 { net_flow.abs() / total } else { 0.0 },
        pressure: if total > 0.0 { buy_volume / total } else { 0.5 },
    }
}

/// Split the tape at the size percentile and compare institutional vs retail
/// net flow. Direction fires only when the institutional side's magnitude
/// exceeds half the retail side's.
pub(crate) fn smart_money(trades: &[Trade], config: &MicroConfig) -> SmartMoney {
    if trades.is_empty() {
        return SmartMoney::neutral();
    }

    let threshold = size_percentile(trades, config.large_trade_percentile);

    let mut institutional_flow = 0.0;
    let mut institutional_volume = 0.0;
    let mut retail_flow = 0.0;
    for trade in trades {
        let signed = match trade.side {
            TradeSide::Buy => trade.size,
            TradeSide::Sell => -trade.size,
        };
        if trade.size >= threshold {
            institutional_flow += signed;
            institutional_volume += trade.size;
        } else {
            retail_flow += signed;
        }
    }

    let direction = if institutional_flow.abs() > retail_flow.abs() / 2.0 {
        Direction::from_sign(institutional_flow)
    } else {
        Direction::Neutral
    };
    let confidence = if institutional_volume > 0.0 {
        (institutional_flow.abs() / institutional_volume).clamp(0.0, 1.0)
    } else {
        0.0
    };

    SmartMoney {
        direction,
        confidence,
        institutional_flow,
        retail_flow,
        institutional_volume,
        large_trade_threshold: threshold,
    }
}

/// Percentile of trade sizes: the value at index floor(n * p) of the sorted
/// tape, so roughly the top (1 - p) share of prints counts as large.
fn size_percentile(trades: &[Trade], percentile: f64) -> f64 {
    let mut sizes: Vec<f64> = trades.iter().map(|t| t.size).collect();
    sizes.sort_by(f64::total_cmp);
    let idx = ((sizes.len() as f64) * percentile).floor() as usize;
    sizes[idx.min(sizes.len() - 1)]
}
