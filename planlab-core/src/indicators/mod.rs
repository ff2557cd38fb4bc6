//! Indicator library — pure functions over price/volume series.
//!
//! Every function checks its minimum lookback first and returns
//! `InsufficientData` when the series is too short; nothing is padded or
//! guessed. Output series match the input length with a `f64::NAN` warmup
//! prefix, so bar indices line up across indicators.

pub mod atr;
pub mod bollinger;
pub mod divergence;
pub mod ema;
pub mod fibonacci;
pub mod levels;
pub mod macd;
pub mod mfi;
pub mod rsi;
pub mod sma;
pub mod snapshot;

pub use atr::{atr, true_range};
pub use bollinger::{bollinger, BandRegime, BollingerSeries};
pub use divergence::{detect_divergence, Divergence, DivergenceKind};
pub use ema::ema;
pub use fibonacci::{fibonacci, FibLevel, FibLevels};
pub use levels::{support_resistance, PriceLevel, SupportResistance};
pub use macd::{macd, MacdCross, MacdSeries};
pub use mfi::mfi;
pub use rsi::rsi;
pub use sma::sma;
pub use snapshot::{IndicatorSnapshot, RsiZone, VolumeTrend};

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLCV: open = prev_close (or close for the first bar),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::PriceBar> {
    make_bars_with_volume(&closes.iter().map(|&c| (c, 1000.0)).collect::<Vec<_>>())
}

/// Like `make_bars` but with explicit per-bar volume.
#[cfg(test)]
pub fn make_bars_with_volume(data: &[(f64, f64)]) -> Vec<crate::domain::PriceBar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(close, volume))| {
            let open = if i == 0 { close } else { data[i - 1].0 };
            let open_time = base + chrono::Duration::minutes(15 * i as i64);
            crate::domain::PriceBar {
                open_time,
                close_time: open_time + chrono::Duration::minutes(15),
                open,
                high: open.max(close) + 1.0,
                low: (open.min(close) - 1.0).max(0.01),
                close,
                volume,
            }
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples, volume 1000.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::PriceBar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            let open_time = base + chrono::Duration::minutes(15 * i as i64);
            crate::domain::PriceBar {
                open_time,
                close_time: open_time + chrono::Duration::minutes(15),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
