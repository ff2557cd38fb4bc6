//! Value area — the smallest contiguous band around the POC holding the
//! target share of total volume.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    /// Lower price edge of the band.
    pub low: f64,
    /// Upper price edge of the band.
    pub high: f64,
    /// Share of total volume actually captured (>= the configured target
    /// unless the whole profile holds less).
    pub volume_fraction: f64,
}

/// Greedy two-sided expansion from the POC: at each step annex whichever
/// neighboring bin carries more volume. Ties expand downward.
pub(crate) fn expand(
    volume: &[f64],
    poc: usize,
    total: f64,
    fraction: f64,
    min_low: f64,
    bin_width: f64,
) -> ValueArea {
    let n = volume.len();
    let mut lo = poc;
    let mut hi = poc;
    let mut captured = volume[poc];

    while captured / total < fraction && (lo > 0 || hi + 1 < n) {
        let below = if lo > 0 { Some(volume[lo - 1]) } else { None };
        let above = if hi + 1 < n { Some(volume[hi + 1]) } else { None };
        match (below, above) {
            (Some(b), Some(a)) if a > b => {
                hi += 1;
                captured += a;
            }
            (Some(b), _) => {
                lo -= 1;
                captured += b;
            }
            (None, Some(a)) => {
                hi += 1;
                captured += a;
            }
            (None, None) => break,
        }
    }

    ValueArea {
        low: min_low + lo as f64 * bin_width,
        high: min_low + (hi + 1) as f64 * bin_width,
        volume_fraction: captured / total,
    }
}
