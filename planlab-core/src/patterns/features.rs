//! Feature extraction — one fixed vector per price/volume window.
//!
//! Every feature is a plain number derived from the window; the same window
//! always produces the same vector. Scales differ per feature, so scoring
//! squashes them through per-feature sigmoids (see `normalized`).

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::error::{AnalysisError, AnalysisResult};
use crate::indicators::SupportResistance;
use crate::structure::MarketStructure;

pub const FEATURE_COUNT: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Window range as a fraction of the last close.
    pub price_range: f64,
    /// Standard deviation of log returns.
    pub volatility: f64,
    /// Full-window return.
    pub momentum: f64,
    /// Linear-regression slope of closes, per bar, as a fraction of price.
    pub trend_strength: f64,
    /// Second-half vs first-half mean volume, as a relative change.
    pub volume_trend: f64,
    /// Volume on up bars vs down bars, in [-1, 1].
    pub volume_confirmation: f64,
    /// Closeness of the last close to a Fibonacci retracement, in [0, 1].
    pub fib_proximity: f64,
    /// Support/resistance touches near the last close, normalized.
    pub sr_touch_density: f64,
    /// Fraction of bars printing a higher high.
    pub higher_highs: f64,
    /// Fraction of bars printing a lower low.
    pub lower_lows: f64,
    /// 1.0 when the window broke its own structure.
    pub structure_break: f64,
    /// Closeness of the last close to the window's VWAP, in [0, 1].
    pub liquidity_proximity: f64,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.price_range,
            self.volatility,
            self.momentum,
            self.trend_strength,
            self.volume_trend,
            self.volume_confirmation,
            self.fib_proximity,
            self.sr_touch_density,
            self.higher_highs,
            self.lower_lows,
            self.structure_break,
            self.liquidity_proximity,
        ]
    }

    /// Per-feature sigmoid squashing into (0, 1). The scales put a "typical"
    /// magnitude near the sigmoid's linear region; bounded ratios pass
    /// through unchanged.
    pub fn normalized(&self) -> [f64; FEATURE_COUNT] {
        [
            sigmoid((self.price_range - 0.05) * 40.0),
            sigmoid((self.volatility - 0.02) * 150.0),
            sigmoid(self.momentum * 40.0),
            sigmoid(self.trend_strength * 800.0),
            sigmoid(self.volume_trend * 5.0),
            0.5 + 0.5 * self.volume_confirmation.clamp(-1.0, 1.0),
            self.fib_proximity.clamp(0.0, 1.0),
            self.sr_touch_density.clamp(0.0, 1.0),
            self.higher_highs.clamp(0.0, 1.0),
            self.lower_lows.clamp(0.0, 1.0),
            self.structure_break.clamp(0.0, 1.0),
            self.liquidity_proximity.clamp(0.0, 1.0),
        ]
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

const MIN_WINDOW: usize = 10;

/// Extract the feature vector from the last `window` bars.
pub fn extract_features(
    bars: &[PriceBar],
    structure: &MarketStructure,
    sr: &SupportResistance,
    window: usize,
) -> AnalysisResult<FeatureVector> {
    if bars.len() < MIN_WINDOW {
        return Err(AnalysisError::insufficient(MIN_WINDOW, bars.len()));
    }
    let bars = &bars[bars.len().saturating_sub(window)..];
    let n = bars.len();
    let last_close = bars[n - 1].close;

    let max_high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let min_low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let price_range = (max_high - min_low) / last_close;

    // Volatility: stdev of log returns
    let log_returns: Vec<f64> = bars
        .windows(2)
        .map(|w| (w[1].close / w[0].close).ln())
        .collect();
    let mean_lr = log_returns.iter().sum::<f64>() / log_returns.len() as f64;
    let volatility = (log_returns
        .iter()
        .map(|r| (r - mean_lr) * (r - mean_lr))
        .sum::<f64>()
        / log_returns.len() as f64)
        .sqrt();

    let momentum = last_close / bars[0].close - 1.0;

    // Least-squares slope of closes vs bar index, as a fraction of mean price
    let mean_x = (n as f64 - 1.0) / 2.0;
    let mean_close = bars.iter().map(|b| b.close).sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        let dx = i as f64 - mean_x;
        cov += dx * (bar.close - mean_close);
        var += dx * dx;
    }
    let trend_strength = if var > 0.0 && mean_close > 0.0 {
        (cov / var) / mean_close
    } else {
        0.0
    };

    // Volume trend: second half vs first half
    let mid = n / 2;
    let first_vol = bars[..mid].iter().map(|b| b.volume).sum::<f64>() / mid.max(1) as f64;
    let second_vol = bars[mid..].iter().map(|b| b.volume).sum::<f64>() / (n - mid) as f64;
    let volume_trend = if first_vol > 0.0 {
        second_vol / first_vol - 1.0
    } else {
        0.0
    };

    // Volume confirmation: do up bars carry the volume?
    let (mut up_vol, mut up_count, mut down_vol, mut down_count) = (0.0, 0usize, 0.0, 0usize);
    for bar in bars {
        if bar.close > bar.open {
            up_vol += bar.volume;
            up_count += 1;
        } else if bar.close < bar.open {
            down_vol += bar.volume;
            down_count += 1;
        }
    }
    let up_avg = if up_count > 0 { up_vol / up_count as f64 } else { 0.0 };
    let down_avg = if down_count > 0 { down_vol / down_count as f64 } else { 0.0 };
    let volume_confirmation = if up_avg + down_avg > 0.0 {
        (up_avg - down_avg) / (up_avg + down_avg)
    } else {
        0.0
    };

    // Fibonacci proximity over the window's own swing
    let fib_proximity = match crate::indicators::fibonacci(max_high, min_low) {
        Ok(levels) => (1.0 - levels.proximity(last_close) / 0.05).clamp(0.0, 1.0),
        Err(_) => 0.5, // flat window: no swing to measure against
    };

    let sr_touch_density = (sr.touch_density(last_close, 0.01) as f64 / 4.0).clamp(0.0, 1.0);

    let higher_highs = bars
        .windows(2)
        .filter(|w| w[1].high > w[0].high)
        .count() as f64
        / (n - 1) as f64;
    let lower_lows = bars
        .windows(2)
        .filter(|w| w[1].low < w[0].low)
        .count() as f64
        / (n - 1) as f64;

    let structure_break = if structure.structure_break { 1.0 } else { 0.0 };

    // Liquidity proximity: closeness to the volume-weighted mean price
    let total_volume: f64 = bars.iter().map(|b| b.volume).sum();
    let liquidity_proximity = if total_volume > 0.0 && max_high > min_low {
        let vwap = bars
            .iter()
            .map(|b| b.typical_price() * b.volume)
            .sum::<f64>()
            / total_volume;
        (1.0 - (last_close - vwap).abs() / (max_high - min_low)).clamp(0.0, 1.0)
    } else {
        0.5
    };

    Ok(FeatureVector {
        price_range,
        volatility,
        momentum,
        trend_strength,
        volume_trend,
        volume_confirmation,
        fib_proximity,
        sr_touch_density,
        higher_highs,
        lower_lows,
        structure_break,
        liquidity_proximity,
    })
}
