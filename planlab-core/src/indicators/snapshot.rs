//! Per-window indicator summary.
//!
//! One pass over the window produces the latest value and signal label of
//! each indicator. The pattern detector and consensus builder read this
//! instead of recomputing series.

use serde::{Deserialize, Serialize};

use crate::config::IndicatorConfig;
use crate::domain::{Direction, PriceBar};
use crate::error::AnalysisResult;

use super::atr::atr;
use super::bollinger::{bollinger, BandRegime};
use super::divergence::{detect_divergence, Divergence};
use super::macd::{macd, MacdCross};
use super::mfi::mfi;
use super::rsi::rsi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub rsi_zone: RsiZone,
    pub macd_cross: MacdCross,
    pub macd_bias: Direction,
    pub band_regime: BandRegime,
    pub atr: f64,
    /// ATR as a fraction of the last close — the volatility number the
    /// gates and planner compare against thresholds.
    pub atr_pct: f64,
    pub mfi: f64,
    pub volume_trend: VolumeTrend,
    pub divergence: Option<Divergence>,
}

impl IndicatorSnapshot {
    pub fn compute(bars: &[PriceBar], config: &IndicatorConfig) -> AnalysisResult<Self> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let rsi_series = rsi(&closes, config.rsi_period)?;
        let rsi_last = last_value(&rsi_series);
        let rsi_zone = if rsi_last > 70.0 {
            RsiZone::Overbought
        } else if rsi_last < 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        };

        let macd_series = macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal)?;
        let bands = bollinger(&closes, config.bollinger_period, config.bollinger_k)?;
        let band_regime = bands.regime(
            closes.len() - 1,
            config.squeeze_threshold,
            config.expansion_threshold,
        );

        let atr_series = atr(bars, config.atr_period)?;
        let atr_last = last_value(&atr_series);
        let last_close = last_value(&closes);

        let mfi_series = mfi(bars, config.mfi_period)?;
        let mfi_last = last_value(&mfi_series);

        let divergence = detect_divergence(bars, config.rsi_period)?;

        Ok(Self {
            rsi: rsi_last,
            rsi_zone,
            macd_cross: macd_series.crossover(),
            macd_bias: macd_series.bias(),
            band_regime,
            atr: atr_last,
            atr_pct: atr_last / last_close,
            mfi: mfi_last,
            volume_trend: volume_trend(bars),
            divergence,
        })
    }
}

fn last_value(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(f64::NAN)
}

/// Mean volume of the window's second half vs its first half,
/// with a ±10% dead band.
fn volume_trend(bars: &[PriceBar]) -> VolumeTrend {
    let window = &bars[bars.len().saturating_sub(20)..];
    let mid = window.len() / 2;
    if mid == 0 {
        return VolumeTrend::Flat;
    }
    let first: f64 = window[..mid].iter().map(|b| b.volume).sum::<f64>() / mid as f64;
    let second: f64 =
        window[mid..].iter().map(|b| b.volume).sum::<f64>() / (window.len() - mid) as f64;
    if first <= 0.0 {
        return VolumeTrend::Flat;
    }
    let ratio = second / first;
    if ratio > 1.1 {
        VolumeTrend::Rising
    } else if ratio < 0.9 {
        VolumeTrend::Falling
    } else {
        VolumeTrend::Flat
    }
}
