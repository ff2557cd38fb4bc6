//! PlanLab Core — multi-methodology technical analysis into one gated plan.
//!
//! The crate turns OHLCV history plus optional order-book/trade snapshots
//! into a risk-managed trade plan:
//! - Indicator library (RSI, MACD, Bollinger, ATR, MFI, Fibonacci, S/R)
//! - Market-structure classifier (swings, trend, structure breaks)
//! - Volume-profile analyzer (POC, value area, institutional levels)
//! - Microstructure analyzer (spread, liquidity, order flow, smart money)
//! - Heuristic pattern detector (fixed-weight scorer with running stats)
//! - Consensus builder, trade-plan optimizer, candle and multi-timeframe
//!   confirmation gates
//!
//! Everything is a pure function of its inputs; the pattern detector's
//! statistics table is the only cross-call state. The structured
//! `AnalysisReport` is the contract with the narrative layer that turns it
//! into prose.

pub mod config;
pub mod consensus;
pub mod domain;
pub mod error;
pub mod gates;
pub mod indicators;
pub mod memo;
pub mod micro;
pub mod patterns;
pub mod pipeline;
pub mod planner;
pub mod profile;
pub mod structure;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use memo::MemoizedPipeline;
pub use pipeline::{AnalysisInput, AnalysisPipeline, AnalysisReport, PlanOutcome};
