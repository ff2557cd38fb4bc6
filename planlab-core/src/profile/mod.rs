//! Volume profile — volume-at-price histogram over a lookback window.
//!
//! Each bar's volume is spread across the bins its [low, high] range touches,
//! proportional to overlap. The buy/sell split per bar is estimated from the
//! close's position within the bar's range. Every call produces a fresh,
//! immutable profile; nothing is mutated in place.

mod institutional;
mod value_area;

pub use institutional::{InstitutionalLevel, LevelKind, Significance};
pub use value_area::ValueArea;

use serde::{Deserialize, Serialize};

use crate::config::ProfileConfig;
use crate::domain::{Direction, PriceBar};
use crate::error::{AnalysisError, AnalysisResult};

/// One price bin of the histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeNode {
    /// Bin center price.
    pub price_level: f64,
    pub volume: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub volume_pct: f64,
}

/// Histogram silhouette, read from POC position and value-area width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileShape {
    Balanced,
    PShaped,
    BShaped,
    DShaped,
}

/// Phase inference: who is in control of the window's volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketPhase {
    Accumulation,
    Distribution,
    Balance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub nodes: Vec<VolumeNode>,
    pub total_volume: f64,
    pub poc_index: usize,
    /// Price level with the highest traded volume.
    pub poc_price: f64,
    pub value_area: ValueArea,
    pub shape: ProfileShape,
    pub phase: MarketPhase,
    /// Overall buy share of the window's volume.
    pub buy_fraction: f64,
    pub institutional_levels: Vec<InstitutionalLevel>,
}

impl VolumeProfile {
    /// Directional vote: accumulation is bullish, distribution bearish.
    pub fn bias(&self) -> Direction {
        match self.phase {
            MarketPhase::Accumulation => Direction::Bullish,
            MarketPhase::Distribution => Direction::Bearish,
            MarketPhase::Balance => Direction::Neutral,
        }
    }
}

pub fn build_profile(bars: &[PriceBar], config: &ProfileConfig) -> AnalysisResult<VolumeProfile> {
    if bars.is_empty() {
        return Err(AnalysisError::insufficient(1, 0));
    }

    let min_low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let max_high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let range = max_high - min_low;

    // A window that never moved collapses to a single bin.
    let bins = if range > 0.0 { config.bins } else { 1 };
    let bin_width = if range > 0.0 { range / bins as f64 } else { 1.0 };

    let mut volume = vec![0.0; bins];
    let mut buy_volume = vec![0.0; bins];

    for bar in bars {
        let close_position = bar.close_position();
        if bar.range() <= 0.0 || range <= 0.0 {
            // All of a doji's volume lands in its single price bin.
            let idx = bin_index(bar.close, min_low, bin_width, bins);
            volume[idx] += bar.volume;
            buy_volume[idx] += bar.volume * close_position;
            continue;
        }
        // Overlap-proportional distribution across the touched bins.
        let first = bin_index(bar.low, min_low, bin_width, bins);
        let last = bin_index(bar.high, min_low, bin_width, bins);
        for idx in first..=last {
            let bin_low = min_low + idx as f64 * bin_width;
            let bin_high = bin_low + bin_width;
            let overlap = bar.high.min(bin_high) - bar.low.max(bin_low);
            if overlap <= 0.0 {
                continue;
            }
            let share = bar.volume * overlap / bar.range();
            volume[idx] += share;
            buy_volume[idx] += share * close_position;
        }
    }

    let total_volume: f64 = volume.iter().sum();
    if total_volume <= 0.0 {
        return Err(AnalysisError::InvalidBar {
            index: 0,
            reason: "window carries no volume".into(),
        });
    }

    let nodes: Vec<VolumeNode> = volume
        .iter()
        .zip(&buy_volume)
        .enumerate()
        .map(|(i, (&vol, &buy))| VolumeNode {
            price_level: min_low + (i as f64 + 0.5) * bin_width,
            volume: vol,
            buy_volume: buy,
            sell_volume: vol - buy,
            volume_pct: 100.0 * vol / total_volume,
        })
        .collect();

    let poc_index = volume
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let value_area = value_area::expand(
        &volume,
        poc_index,
        total_volume,
        config.value_area_fraction,
        min_low,
        bin_width,
    );

    let buy_fraction = buy_volume.iter().sum::<f64>() / total_volume;
    let shape = classify_shape(poc_index, bins, &value_area, min_low, max_high);
    let phase = infer_phase(shape, buy_fraction);
    let institutional_levels = institutional::find_levels(&nodes, config);

    Ok(VolumeProfile {
        poc_price: nodes[poc_index].price_level,
        nodes,
        total_volume,
        poc_index,
        value_area,
        shape,
        phase,
        buy_fraction,
        institutional_levels,
    })
}

fn bin_index(price: f64, min_low: f64, bin_width: f64, bins: usize) -> usize {
    let idx = ((price - min_low) / bin_width).floor() as isize;
    idx.clamp(0, bins as isize - 1) as usize
}

/// POC in the upper third → p-shape, lower third → b-shape. A central POC is
/// d-shaped when the value area is tight, balanced when volume is spread out.
fn classify_shape(
    poc_index: usize,
    bins: usize,
    value_area: &ValueArea,
    min_low: f64,
    max_high: f64,
) -> ProfileShape {
    let position = (poc_index as f64 + 0.5) / bins as f64;
    if position >= 0.66 {
        ProfileShape::PShaped
    } else if position <= 0.33 {
        ProfileShape::BShaped
    } else {
        let range = max_high - min_low;
        let va_width = value_area.high - value_area.low;
        if range > 0.0 && va_width / range < 0.5 {
            ProfileShape::DShaped
        } else {
            ProfileShape::Balanced
        }
    }
}

fn infer_phase(shape: ProfileShape, buy_fraction: f64) -> MarketPhase {
    if buy_fraction >= 0.55 {
        MarketPhase::Accumulation
    } else if buy_fraction <= 0.45 {
        MarketPhase::Distribution
    } else {
        // Volume split is ambiguous — let the silhouette decide.
        match shape {
            ProfileShape::PShaped => MarketPhase::Distribution,
            ProfileShape::BShaped => MarketPhase::Accumulation,
            ProfileShape::Balanced | ProfileShape::DShaped => MarketPhase::Balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars_with_volume, make_ohlc_bars};

    fn default_config() -> ProfileConfig {
        ProfileConfig::default()
    }

    #[test]
    fn volume_is_conserved() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
        ]);
        let profile = build_profile(&bars, &default_config()).unwrap();
        let node_sum: f64 = profile.nodes.iter().map(|n| n.volume).sum();
        assert!((node_sum - profile.total_volume).abs() < 1e-9);
        assert!((profile.total_volume - 4000.0).abs() < 1e-9);
        let pct_sum: f64 = profile.nodes.iter().map(|n| n.volume_pct).sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn buy_sell_split_follows_close_position() {
        // close at the high → all volume counted as buying
        let bars = make_ohlc_bars(&[(100.0, 110.0, 100.0, 110.0)]);
        let profile = build_profile(&bars, &default_config()).unwrap();
        assert!((profile.buy_fraction - 1.0).abs() < 1e-9);
        assert_eq!(profile.phase, MarketPhase::Accumulation);
        assert_eq!(profile.bias(), Direction::Bullish);
    }

    #[test]
    fn poc_lands_on_heaviest_price() {
        // Three bars overlap near 100; one outlier trades high volume at 120.
        let bars = make_bars_with_volume(&[
            (100.0, 1000.0),
            (100.5, 1200.0),
            (100.2, 1100.0),
            (120.0, 300.0),
        ]);
        let profile = build_profile(&bars, &default_config()).unwrap();
        assert!(
            profile.poc_price < 110.0,
            "POC {} should sit in the heavy cluster",
            profile.poc_price
        );
    }

    #[test]
    fn value_area_holds_target_fraction() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
        ]);
        let profile = build_profile(&bars, &default_config()).unwrap();
        assert!(profile.value_area.volume_fraction >= 0.70);
        assert!(profile.value_area.low <= profile.poc_price);
        assert!(profile.value_area.high >= profile.poc_price);
    }

    #[test]
    fn flat_window_collapses_to_one_bin() {
        let bars = make_ohlc_bars(&[(100.0, 100.0, 100.0, 100.0); 3]);
        let profile = build_profile(&bars, &default_config()).unwrap();
        assert_eq!(profile.nodes.len(), 1);
        assert!((profile.nodes[0].volume - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn empty_window_is_insufficient() {
        assert!(matches!(
            build_profile(&[], &default_config()),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn sell_heavy_window_is_distribution() {
        // closes pinned to the lows → sell volume dominates
        let bars = make_ohlc_bars(&[
            (110.0, 110.0, 100.0, 100.0),
            (100.0, 100.0, 92.0, 92.0),
            (92.0, 92.0, 85.0, 85.0),
        ]);
        let profile = build_profile(&bars, &default_config()).unwrap();
        assert!(profile.buy_fraction < 0.45);
        assert_eq!(profile.phase, MarketPhase::Distribution);
        assert_eq!(profile.bias(), Direction::Bearish);
    }
}
