//! Running per-pattern historical statistics.
//!
//! The only state the core keeps between calls: sample counts, success
//! rates, realized moves and risk/reward, broken down by timeframe. The
//! table is a plain keyed value — serialize it to persist, hand it back at
//! startup to reload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Timeframe;

use super::PatternType;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeframeStats {
    pub samples: u64,
    pub successes: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternStats {
    pub samples: u64,
    pub successes: u64,
    /// Sum of realized moves (signed fractions), for the running average.
    pub total_move: f64,
    /// Sum of realized risk/reward ratios.
    pub total_risk_reward: f64,
    pub by_timeframe: BTreeMap<Timeframe, TimeframeStats>,
}

impl PatternStats {
    /// Success rate with a neutral 0.5 prior until evidence arrives.
    pub fn success_rate(&self) -> f64 {
        if self.samples == 0 {
            0.5
        } else {
            self.successes as f64 / self.samples as f64
        }
    }

    pub fn avg_move(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_move / self.samples as f64
        }
    }

    pub fn avg_risk_reward(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.total_risk_reward / self.samples as f64
        }
    }

    /// Timeframes ranked by success rate; only those with at least
    /// `min_samples` observations qualify.
    pub fn best_timeframes(&self, min_samples: u64) -> Vec<Timeframe> {
        let mut ranked: Vec<(Timeframe, f64)> = self
            .by_timeframe
            .iter()
            .filter(|(_, s)| s.samples >= min_samples)
            .map(|(tf, s)| (*tf, s.successes as f64 / s.samples as f64))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().map(|(tf, _)| tf).collect()
    }

    pub fn record(&mut self, timeframe: Timeframe, success: bool, realized_move: f64, rr: f64) {
        self.samples += 1;
        if success {
            self.successes += 1;
        }
        self.total_move += realized_move;
        self.total_risk_reward += rr;
        let slot = self.by_timeframe.entry(timeframe).or_default();
        slot.samples += 1;
        if success {
            slot.successes += 1;
        }
    }
}

/// Keyed table of every pattern's statistics. Serializable as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatsTable {
    pub patterns: BTreeMap<PatternType, PatternStats>,
}

impl StatsTable {
    pub fn get(&self, pattern: PatternType) -> Option<&PatternStats> {
        self.patterns.get(&pattern)
    }

    pub fn success_rate(&self, pattern: PatternType) -> f64 {
        self.get(pattern).map_or(0.5, PatternStats::success_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_pattern_has_neutral_prior() {
        let table = StatsTable::default();
        assert_eq!(table.success_rate(PatternType::BullFlag), 0.5);
    }

    #[test]
    fn record_updates_running_stats() {
        let mut stats = PatternStats::default();
        stats.record(Timeframe::M15, true, 0.04, 2.0);
        stats.record(Timeframe::M15, false, -0.02, 2.0);
        stats.record(Timeframe::H1, true, 0.06, 3.0);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.successes, 2);
        assert!((stats.success_rate() - 2.0 / 3.0).abs() < 1e-12);
        assert!((stats.avg_move() - 0.08 / 3.0).abs() < 1e-12);
        assert!((stats.avg_risk_reward() - 7.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn best_timeframes_rank_by_success() {
        let mut stats = PatternStats::default();
        stats.record(Timeframe::M15, false, -0.01, 1.0);
        stats.record(Timeframe::M15, true, 0.02, 1.0);
        stats.record(Timeframe::H1, true, 0.05, 2.0);
        stats.record(Timeframe::H1, true, 0.04, 2.0);
        assert_eq!(
            stats.best_timeframes(1),
            vec![Timeframe::H1, Timeframe::M15]
        );
        // a higher floor drops sparse timeframes
        assert_eq!(stats.best_timeframes(3), Vec::<Timeframe>::new());
    }

    #[test]
    fn table_serialization_roundtrip() {
        let mut table = StatsTable::default();
        table
            .patterns
            .entry(PatternType::Breakout)
            .or_default()
            .record(Timeframe::H4, true, 0.05, 2.5);
        let json = serde_json::to_string(&table).unwrap();
        let deser: StatsTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, deser);
    }
}
