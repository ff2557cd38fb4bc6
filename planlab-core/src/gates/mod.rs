//! Confirmation gates — the policies that withhold a finished plan until
//! the evidence is in.
//!
//! The candle gate works on the most recently closed bar; the
//! multi-timeframe gate decides whether higher-timeframe corroboration is
//! mandatory and aggregates it once supplied. Neither gate ever fabricates
//! a go-ahead: missing evidence always reads as "wait", with the reason
//! spelled out.

pub mod candle;
pub mod mtf;

pub use candle::{evaluate_candle, CandleClass, CandleDecision, CandleVerdict};
pub use mtf::{
    confirmation_request, resolve_confirmations, ConfirmationDecision, ConfirmationRequest,
    MarketConditions, TimeframeConfirmation,
};
