//! Timeframes and the style/risk parameters that shape a plan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of supported bar intervals, ordered shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// The confirmation ladder: up to two timeframes above this one.
    /// D1 has no higher timeframe in the supported set.
    pub fn higher(&self) -> Vec<Timeframe> {
        Self::ALL
            .iter()
            .copied()
            .skip_while(|tf| tf != self)
            .skip(1)
            .take(2)
            .collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1m" | "m1" => Ok(Timeframe::M1),
            "5m" | "m5" => Ok(Timeframe::M5),
            "15m" | "m15" => Ok(Timeframe::M15),
            "30m" | "m30" => Ok(Timeframe::M30),
            "1h" | "h1" => Ok(Timeframe::H1),
            "4h" | "h4" => Ok(Timeframe::H4),
            "1d" | "d1" => Ok(Timeframe::D1),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// Trading style — sets entry patience, stop width, and the target ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingStyle {
    Scalping,
    DayTrading,
    Swing,
    Position,
}

impl TradingStyle {
    /// Fraction of ATR the entry zone sits back from the reference level.
    /// Faster styles enter closer to the current price.
    pub fn entry_atr_fraction(&self) -> f64 {
        match self {
            TradingStyle::Scalping => 0.10,
            TradingStyle::DayTrading => 0.25,
            TradingStyle::Swing => 0.50,
            TradingStyle::Position => 0.75,
        }
    }

    /// Reward multiples for the take-profit ladder.
    pub fn target_multiples(&self) -> &'static [f64] {
        match self {
            TradingStyle::Scalping => &[1.0, 1.5],
            TradingStyle::DayTrading => &[1.5, 2.5],
            TradingStyle::Swing => &[2.0, 3.5, 5.0],
            TradingStyle::Position => &[3.0, 5.0, 8.0],
        }
    }

    /// Stop-width scaling relative to the risk-tolerance base multiplier.
    pub fn stop_factor(&self) -> f64 {
        match self {
            TradingStyle::Scalping => 0.75,
            TradingStyle::DayTrading => 1.0,
            TradingStyle::Swing => 1.25,
            TradingStyle::Position => 1.5,
        }
    }

    /// Minimum stop distance as a fraction of price.
    pub fn min_stop_pct(&self) -> f64 {
        match self {
            TradingStyle::Scalping => 0.002,
            TradingStyle::DayTrading => 0.003,
            TradingStyle::Swing => 0.005,
            TradingStyle::Position => 0.005,
        }
    }

    /// Swing and position styles always require higher-timeframe alignment.
    pub fn requires_htf_alignment(&self) -> bool {
        matches!(self, TradingStyle::Swing | TradingStyle::Position)
    }
}

impl FromStr for TradingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scalping" | "scalp" => Ok(TradingStyle::Scalping),
            "daytrading" | "day" => Ok(TradingStyle::DayTrading),
            "swing" => Ok(TradingStyle::Swing),
            "position" => Ok(TradingStyle::Position),
            other => Err(format!("unknown trading style: {other}")),
        }
    }
}

/// Risk tolerance — sets the base position size and stop-width multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    /// Base percent of account risked per trade.
    pub fn base_position_pct(&self) -> f64 {
        match self {
            RiskTolerance::Conservative => 1.0,
            RiskTolerance::Moderate => 2.0,
            RiskTolerance::Aggressive => 3.0,
        }
    }

    /// ATR multiplier for volatility stops. Wider for conservative traders —
    /// fewer stop-outs at the cost of larger per-unit risk.
    pub fn volatility_multiplier(&self) -> f64 {
        match self {
            RiskTolerance::Conservative => 2.0,
            RiskTolerance::Moderate => 1.5,
            RiskTolerance::Aggressive => 1.2,
        }
    }
}

impl FromStr for RiskTolerance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conservative" => Ok(RiskTolerance::Conservative),
            "moderate" => Ok(RiskTolerance::Moderate),
            "aggressive" => Ok(RiskTolerance::Aggressive),
            other => Err(format!("unknown risk tolerance: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframes_are_ordered() {
        assert!(Timeframe::M15 < Timeframe::H1);
        assert!(Timeframe::H4 < Timeframe::D1);
    }

    #[test]
    fn higher_ladder() {
        assert_eq!(Timeframe::M15.higher(), vec![Timeframe::M30, Timeframe::H1]);
        assert_eq!(Timeframe::H4.higher(), vec![Timeframe::D1]);
        assert!(Timeframe::D1.higher().is_empty());
    }

    #[test]
    fn parse_labels() {
        assert_eq!("15m".parse::<Timeframe>().unwrap(), Timeframe::M15);
        assert_eq!("H4".parse::<Timeframe>().unwrap(), Timeframe::H4);
        assert!("7m".parse::<Timeframe>().is_err());
        assert_eq!("swing".parse::<TradingStyle>().unwrap(), TradingStyle::Swing);
        assert_eq!(
            "moderate".parse::<RiskTolerance>().unwrap(),
            RiskTolerance::Moderate
        );
    }

    #[test]
    fn target_ladders_increase() {
        for style in [
            TradingStyle::Scalping,
            TradingStyle::DayTrading,
            TradingStyle::Swing,
            TradingStyle::Position,
        ] {
            let multiples = style.target_multiples();
            assert!(multiples.windows(2).all(|w| w[0] < w[1]));
            assert!((2..=3).contains(&multiples.len()));
        }
    }

    #[test]
    fn htf_alignment_styles() {
        assert!(!TradingStyle::Scalping.requires_htf_alignment());
        assert!(TradingStyle::Swing.requires_htf_alignment());
        assert!(TradingStyle::Position.requires_htf_alignment());
    }
}
