//! Analysis configuration — every tunable threshold in one place.
//!
//! Loadable from TOML with per-field defaults, so a config file only needs to
//! name the values it overrides. `validate()` rejects nonsensical settings
//! before they reach an analyzer.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub indicators: IndicatorConfig,
    pub profile: ProfileConfig,
    pub micro: MicroConfig,
    pub patterns: PatternConfig,
    pub consensus: ConsensusConfig,
    pub gates: GateConfig,
    pub memo: MemoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_k: f64,
    /// Bandwidth-to-mid ratio below which the bands are "squeezed".
    pub squeeze_threshold: f64,
    /// Bandwidth-to-mid ratio above which the bands are "expanding".
    pub expansion_threshold: f64,
    pub atr_period: usize,
    pub mfi_period: usize,
    /// Swing pivots within this fraction of each other merge into one
    /// support/resistance level.
    pub sr_cluster_pct: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_k: 2.0,
            squeeze_threshold: 0.015,
            expansion_threshold: 0.05,
            atr_period: 14,
            mfi_period: 14,
            sr_cluster_pct: 0.005,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Number of price bins the lookback window is partitioned into.
    pub bins: usize,
    /// Fraction of total volume the value area must contain.
    pub value_area_fraction: f64,
    /// A bin is institutional when its volume exceeds this multiple of the
    /// average bin volume.
    pub institutional_volume_multiplier: f64,
    /// Buy-volume share above which an institutional level is accumulation.
    pub accumulation_threshold: f64,
    /// Buy-volume share below which an institutional level is distribution.
    pub distribution_threshold: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            bins: 50,
            value_area_fraction: 0.70,
            institutional_volume_multiplier: 1.5,
            accumulation_threshold: 0.8,
            distribution_threshold: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroConfig {
    /// Rolling snapshot window for the spread trend comparison.
    pub spread_window: usize,
    /// Relative change between window halves that counts as widening/narrowing.
    pub spread_trend_threshold: f64,
    /// Percentile of trade size above which a trade is "large" (smart money).
    pub large_trade_percentile: f64,
}

impl Default for MicroConfig {
    fn default() -> Self {
        Self {
            spread_window: 10,
            spread_trend_threshold: 0.10,
            large_trade_percentile: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Patterns scoring below this confidence are not emitted.
    pub min_confidence: f64,
    /// Bars of history the feature extractor looks at.
    pub feature_window: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            feature_window: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Relative margin one side's weight must hold over the other.
    pub direction_margin: f64,
    /// Agreement score below which a conflict flag is raised.
    pub conflict_agreement_threshold: f64,
    /// Sides within this relative distance of each other raise a conflict flag.
    pub conflict_weight_ratio: f64,
    /// Agreement score below which the plan is withheld as conflicted.
    pub min_agreement_score: f64,
    /// Consensus confidence below which no plan is attempted.
    pub min_plan_confidence: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            direction_margin: 0.20,
            conflict_agreement_threshold: 70.0,
            conflict_weight_ratio: 0.30,
            min_agreement_score: 50.0,
            min_plan_confidence: 55.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Candle strength a scalping entry needs.
    pub scalping_strength_threshold: f64,
    /// Candle strength every other style needs (plus the at-level check).
    pub default_strength_threshold: f64,
    /// How close (fraction of price) the close must be to the key level.
    pub key_level_tolerance_pct: f64,
    /// Volume below this multiple of the rolling average is a hard veto.
    pub low_volume_ratio: f64,
    /// Range below this multiple of the rolling average is a hard veto.
    pub low_range_ratio: f64,
    /// Bars in the rolling volume/range average.
    pub rolling_window: usize,
    /// Signal strength below which higher-timeframe confirmation is mandatory.
    pub mtf_strength_floor: f64,
    /// Signal strength above which the high-impact rule demands confirmation.
    pub mtf_high_impact_threshold: f64,
    /// Working timeframes at or below this many minutes always need
    /// higher-timeframe confirmation.
    pub mtf_fast_timeframe_minutes: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            scalping_strength_threshold: 50.0,
            default_strength_threshold: 70.0,
            key_level_tolerance_pct: 0.005,
            low_volume_ratio: 0.5,
            low_range_ratio: 0.4,
            rolling_window: 5,
            mtf_strength_floor: 70.0,
            mtf_high_impact_threshold: 85.0,
            mtf_fast_timeframe_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// Seconds a memoized report stays fresh.
    pub ttl_secs: u64,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self { ttl_secs: 60 }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> AnalysisResult<Self> {
        let config: AnalysisConfig = toml::from_str(text)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        let ind = &self.indicators;
        if ind.macd_fast >= ind.macd_slow {
            return Err(AnalysisError::InvalidConfig(format!(
                "macd_fast ({}) must be < macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            )));
        }
        if ind.rsi_period == 0 || ind.atr_period == 0 || ind.mfi_period == 0 {
            return Err(AnalysisError::InvalidConfig(
                "indicator periods must be >= 1".into(),
            ));
        }
        if ind.bollinger_k <= 0.0 || !ind.bollinger_k.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "bollinger_k must be positive and finite".into(),
            ));
        }
        if !(ind.sr_cluster_pct > 0.0 && ind.sr_cluster_pct.is_finite()) {
            return Err(AnalysisError::InvalidConfig(
                "sr_cluster_pct must be positive and finite".into(),
            ));
        }
        if self.profile.bins < 2 {
            return Err(AnalysisError::InvalidConfig(
                "profile.bins must be >= 2".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.profile.value_area_fraction) {
            return Err(AnalysisError::InvalidConfig(
                "profile.value_area_fraction must be in [0, 1]".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.micro.large_trade_percentile) {
            return Err(AnalysisError::InvalidConfig(
                "micro.large_trade_percentile must be in [0, 1)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.patterns.min_confidence) {
            return Err(AnalysisError::InvalidConfig(
                "patterns.min_confidence must be in [0, 1]".into(),
            ));
        }
        if self.patterns.feature_window < 10 {
            return Err(AnalysisError::InvalidConfig(
                "patterns.feature_window must be >= 10".into(),
            ));
        }
        if self.consensus.direction_margin < 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "consensus.direction_margin must be >= 0".into(),
            ));
        }
        if self.gates.rolling_window == 0 {
            return Err(AnalysisError::InvalidConfig(
                "gates.rolling_window must be >= 1".into(),
            ));
        }
        Ok(())
    }

    /// Longest indicator lookback — the minimum bar count `analyze` accepts.
    pub fn min_bars(&self) -> usize {
        let ind = &self.indicators;
        let macd = ind.macd_slow + ind.macd_signal;
        let longest = [
            ind.rsi_period + 1,
            macd,
            ind.bollinger_period,
            ind.atr_period + 1,
            ind.mfi_period + 1,
            self.patterns.feature_window,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);
        longest.max(self.gates.rolling_window + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.indicators.rsi_period, 14);
        assert_eq!(config.profile.bins, 50);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [profile]
            bins = 100

            [gates]
            rolling_window = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.profile.bins, 100);
        assert_eq!(config.gates.rolling_window, 8);
        // untouched sections keep defaults
        assert_eq!(config.indicators.macd_slow, 26);
        assert_eq!(config.profile.value_area_fraction, 0.70);
    }

    #[test]
    fn rejects_inverted_macd_periods() {
        let err = AnalysisConfig::from_toml_str(
            r#"
            [indicators]
            macd_fast = 30
            macd_slow = 10
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_bad_value_area() {
        let mut config = AnalysisConfig::default();
        config.profile.value_area_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_bars_covers_macd_warmup() {
        let config = AnalysisConfig::default();
        // macd_slow + macd_signal = 35 dominates the defaults
        assert_eq!(config.min_bars(), 35);
    }
}
