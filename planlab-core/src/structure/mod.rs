//! Market structure — swing detection and trend classification.
//!
//! Swings come from 3-bar pivot comparison; the trend is read off the two
//! most recent swing highs and lows. A structure break (an uptrend printing a
//! lower swing low, or a downtrend printing a higher swing high) is the
//! invalidation signal the consensus builder listens for.

mod swings;
mod trend;

pub use swings::{find_swings, SwingKind, SwingPoint};
pub use trend::{classify, MarketStructure, Trend};
