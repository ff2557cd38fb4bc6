//! Candle confirmation gate — a state machine over the last closed bar.

use serde::{Deserialize, Serialize};

use crate::config::GateConfig;
use crate::domain::{PriceBar, TradeDirection, TradingStyle};
use crate::error::{AnalysisError, AnalysisResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleVerdict {
    ReadyToEnter,
    WaitNextCandle,
    WaitForSetup,
    AvoidTrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleClass {
    BullishConfirmation,
    BearishConfirmation,
    Indecision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleDecision {
    pub verdict: CandleVerdict,
    pub class: CandleClass,
    /// Candle quality 0-100 (body dominance, range, participation).
    pub strength: f64,
    pub reason: String,
    /// Rough wait horizon in bars for the wait verdicts.
    pub wait_bars: Option<u32>,
}

/// Evaluate the most recent closed bar against the desired direction.
///
/// The low-volume / low-range veto fires before any directional logic: a
/// dead tape overrides even a textbook confirmation candle.
pub fn evaluate_candle(
    bars: &[PriceBar],
    direction: TradeDirection,
    style: TradingStyle,
    key_level: f64,
    config: &GateConfig,
) -> AnalysisResult<CandleDecision> {
    let required = config.rolling_window + 1;
    if bars.len() < required {
        return Err(AnalysisError::insufficient(required, bars.len()));
    }

    let last = &bars[bars.len() - 1];
    let window = &bars[bars.len() - 1 - config.rolling_window..bars.len() - 1];
    let avg_volume =
        window.iter().map(|b| b.volume).sum::<f64>() / config.rolling_window as f64;
    let avg_range = window.iter().map(|b| b.range()).sum::<f64>() / config.rolling_window as f64;

    let class = classify(last);
    let strength = strength(last, avg_range, avg_volume);

    // Hard veto: dead volume or dead range, regardless of candle quality.
    if avg_volume > 0.0 && last.volume < config.low_volume_ratio * avg_volume {
        return Ok(CandleDecision {
            verdict: CandleVerdict::AvoidTrade,
            class,
            strength,
            reason: format!(
                "volume {:.0} is under {:.0}% of the recent average",
                last.volume,
                config.low_volume_ratio * 100.0
            ),
            wait_bars: None,
        });
    }
    if avg_range > 0.0 && last.range() < config.low_range_ratio * avg_range {
        return Ok(CandleDecision {
            verdict: CandleVerdict::AvoidTrade,
            class,
            strength,
            reason: format!(
                "range {:.4} is under {:.0}% of the recent average",
                last.range(),
                config.low_range_ratio * 100.0
            ),
            wait_bars: None,
        });
    }

    let wanted = match direction {
        TradeDirection::Long => CandleClass::BullishConfirmation,
        TradeDirection::Short => CandleClass::BearishConfirmation,
    };

    if class == CandleClass::Indecision {
        return Ok(CandleDecision {
            verdict: CandleVerdict::WaitNextCandle,
            class,
            strength,
            reason: "indecision bar, no side in control".into(),
            wait_bars: Some(1),
        });
    }
    if class != wanted {
        return Ok(CandleDecision {
            verdict: CandleVerdict::WaitForSetup,
            class,
            strength,
            reason: format!("bar confirms the opposite side of a {direction:?} entry"),
            wait_bars: Some(3),
        });
    }

    let threshold = if style == TradingStyle::Scalping {
        config.scalping_strength_threshold
    } else {
        config.default_strength_threshold
    };
    if strength < threshold {
        return Ok(CandleDecision {
            verdict: CandleVerdict::WaitNextCandle,
            class,
            strength,
            reason: format!("confirmation strength {strength:.0} under the {threshold:.0} bar"),
            wait_bars: Some(1),
        });
    }

    // Everything but scalping also demands the bar close at the key level.
    if style != TradingStyle::Scalping {
        let distance = (last.close - key_level).abs() / last.close;
        if distance > config.key_level_tolerance_pct {
            return Ok(CandleDecision {
                verdict: CandleVerdict::WaitNextCandle,
                class,
                strength,
                reason: format!(
                    "close {:.4} is {:.2}% from the key level {:.4}",
                    last.close,
                    distance * 100.0,
                    key_level
                ),
                wait_bars: Some(1),
            });
        }
    }

    Ok(CandleDecision {
        verdict: CandleVerdict::ReadyToEnter,
        class,
        strength,
        reason: format!("{class:?} at strength {strength:.0}"),
        wait_bars: None,
    })
}

/// Body/wick anatomy. A decisive body (or a hard close into one end of the
/// range) confirms that side; everything else is indecision.
fn classify(bar: &PriceBar) -> CandleClass {
    let range = bar.range();
    if range <= 0.0 {
        return CandleClass::Indecision;
    }
    let body_frac = bar.body().abs() / range;
    let close_pos = bar.close_position();

    if bar.close > bar.open && (body_frac >= 0.6 || (body_frac >= 0.3 && close_pos >= 0.7)) {
        CandleClass::BullishConfirmation
    } else if bar.close < bar.open && (body_frac >= 0.6 || (body_frac >= 0.3 && close_pos <= 0.3))
    {
        CandleClass::BearishConfirmation
    } else {
        CandleClass::Indecision
    }
}

/// 0-100: body dominance half, relative range 30%, relative volume 20%.
fn strength(bar: &PriceBar, avg_range: f64, avg_volume: f64) -> f64 {
    let range = bar.range();
    let body_score = if range > 0.0 { bar.body().abs() / range } else { 0.0 };
    let range_score = if avg_range > 0.0 {
        (range / avg_range / 2.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let volume_score = if avg_volume > 0.0 {
        (bar.volume / avg_volume / 2.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    100.0 * (0.5 * body_score + 0.3 * range_score + 0.2 * volume_score)
}
