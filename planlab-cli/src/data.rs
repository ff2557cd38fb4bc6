//! Local file ingestion: CSV bars, JSON book snapshots and trades.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use planlab_core::domain::{OrderBookSnapshot, PriceBar, Trade};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BarRecord {
    open_time: DateTime<Utc>,
    close_time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<BarRecord> for PriceBar {
    fn from(record: BarRecord) -> Self {
        PriceBar {
            open_time: record.open_time,
            close_time: record.close_time,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        }
    }
}

/// CSV with headers: open_time, close_time, open, high, low, close, volume.
/// Timestamps are RFC 3339.
pub fn load_bars(path: &Path) -> Result<Vec<PriceBar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening bar file {}", path.display()))?;
    let mut bars = Vec::new();
    for (line, record) in reader.deserialize::<BarRecord>().enumerate() {
        let record = record.with_context(|| format!("bar record {}", line + 1))?;
        bars.push(record.into());
    }
    Ok(bars)
}

/// JSON array of order-book snapshots in the core's serde shape.
pub fn load_books(path: &Path) -> Result<Vec<OrderBookSnapshot>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))
}

/// JSON array of trades in the core's serde shape.
pub fn load_trades(path: &Path) -> Result<Vec<Trade>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing {}", path.display()))
}
