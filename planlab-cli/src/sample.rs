//! Synthetic market feed for the `demo` command.
//!
//! Deterministic per seed. This module is the workspace's only source of
//! generated data — the core never fabricates input.

use chrono::{DateTime, TimeZone, Utc};
use planlab_core::domain::{BookLevel, OrderBookSnapshot, PriceBar, Trade, TradeSide};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct DemoFeed {
    pub bars: Vec<PriceBar>,
    pub books: Vec<OrderBookSnapshot>,
    pub trades: Vec<Trade>,
}

pub fn generate(seed: u64, bar_count: usize) -> DemoFeed {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

    let mut price = 100.0 + rng.gen_range(0.0..50.0);
    // drift flips occasionally so demos show both trends and chop
    let mut drift: f64 = rng.gen_range(-0.2..0.3);
    let mut bars = Vec::with_capacity(bar_count);
    for i in 0..bar_count {
        if rng.gen_bool(0.03) {
            drift = rng.gen_range(-0.3..0.3);
        }
        let open = price;
        let close = (open + drift + rng.gen_range(-1.0..1.0)).max(1.0);
        let high = open.max(close) + rng.gen_range(0.0..0.8);
        let low = (open.min(close) - rng.gen_range(0.0..0.8)).max(0.5);
        let open_time = bar_time(base, i);
        bars.push(PriceBar {
            open_time,
            close_time: bar_time(base, i + 1),
            open,
            high,
            low,
            close,
            volume: rng.gen_range(500.0..3000.0) * if drift.abs() > 0.15 { 1.5 } else { 1.0 },
        });
        price = close;
    }

    let last = bars.last().map(|b| b.close).unwrap_or(100.0);
    let spread = last * 0.0002;
    let book_time = bars.last().map(|b| b.close_time).unwrap_or(base);
    let books = (0..10)
        .map(|i| OrderBookSnapshot {
            timestamp: book_time + chrono::Duration::seconds(i),
            bids: ladder(&mut rng, last - spread / 2.0, -1.0),
            asks: ladder(&mut rng, last + spread / 2.0, 1.0),
        })
        .collect();

    let trades = (0..150)
        .map(|i| {
            // a thin tail of large prints stands in for institutional flow
            let size = if rng.gen_bool(0.05) {
                rng.gen_range(20.0..60.0)
            } else {
                rng.gen_range(0.5..3.0)
            };
            Trade {
                timestamp: book_time + chrono::Duration::seconds(i),
                price: last + rng.gen_range(-spread..spread),
                size,
                side: if rng.gen_bool(if drift > 0.0 { 0.6 } else { 0.4 }) {
                    TradeSide::Buy
                } else {
                    TradeSide::Sell
                },
                id: i as u64,
            }
        })
        .collect();

    DemoFeed { bars, books, trades }
}

fn bar_time(base: DateTime<Utc>, i: usize) -> DateTime<Utc> {
    base + chrono::Duration::minutes(15 * i as i64)
}

fn ladder(rng: &mut StdRng, start: f64, direction: f64) -> Vec<BookLevel> {
    (0..5)
        .map(|depth| BookLevel {
            price: start + direction * start * 0.0001 * depth as f64,
            size: rng.gen_range(5.0..40.0),
        })
        .collect()
}
