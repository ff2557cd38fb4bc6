//! Institutional levels — bins where outsized volume changed hands.
//!
//! A bin qualifies when its volume exceeds the configured multiple of the
//! average non-empty bin. The buy/sell imbalance then classifies what that
//! volume was doing there.

use serde::{Deserialize, Serialize};

use crate::config::ProfileConfig;

use super::VolumeNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    Accumulation,
    Distribution,
    LiquidityZone,
    HighVolumeNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionalLevel {
    pub price: f64,
    pub volume: f64,
    pub kind: LevelKind,
    /// 0-100, relative to the heaviest bin in the profile.
    pub strength: f64,
    pub significance: Significance,
}

pub(crate) fn find_levels(nodes: &[VolumeNode], config: &ProfileConfig) -> Vec<InstitutionalLevel> {
    let active: Vec<&VolumeNode> = nodes.iter().filter(|n| n.volume > 0.0).collect();
    if active.is_empty() {
        return Vec::new();
    }

    let average = active.iter().map(|n| n.volume).sum::<f64>() / active.len() as f64;
    let max_volume = active
        .iter()
        .map(|n| n.volume)
        .fold(f64::NEG_INFINITY, f64::max);

    active
        .iter()
        .filter(|n| n.volume > config.institutional_volume_multiplier * average)
        .map(|n| {
            let buy_share = if n.volume > 0.0 {
                n.buy_volume / n.volume
            } else {
                0.5
            };
            let ratio = n.volume / average;
            InstitutionalLevel {
                price: n.price_level,
                volume: n.volume,
                kind: classify(buy_share, ratio, config),
                strength: (100.0 * n.volume / max_volume).min(100.0),
                significance: if ratio >= 3.0 {
                    Significance::Critical
                } else if ratio >= 2.0 {
                    Significance::Major
                } else {
                    Significance::Minor
                },
            }
        })
        .collect()
}

fn classify(buy_share: f64, volume_ratio: f64, config: &ProfileConfig) -> LevelKind {
    if buy_share > config.accumulation_threshold {
        LevelKind::Accumulation
    } else if buy_share < config.distribution_threshold {
        LevelKind::Distribution
    } else if (0.4..=0.6).contains(&buy_share) && volume_ratio >= 2.0 {
        // Heavy two-sided trade: both sides willingly transacting here.
        LevelKind::LiquidityZone
    } else {
        LevelKind::HighVolumeNode
    }
}
