//! The analysis pipeline — one call from raw market data to a gated plan.
//!
//! Stages: validate input → indicators + market structure → volume profile,
//! microstructure, and pattern detection fanned out in parallel → consensus →
//! plan synthesis → candle gate → multi-timeframe gate. Every stage is a pure
//! transformation of its inputs; the only state anywhere is the pattern
//! detector's statistics table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::consensus::{self, ConsensusResult, SignalVote};
use crate::domain::{
    Direction, OrderBookSnapshot, PriceBar, RiskTolerance, Timeframe, Trade, TradeDirection,
    TradingStyle,
};
use crate::error::{AnalysisError, AnalysisResult};
use crate::gates::{
    confirmation_request, evaluate_candle, resolve_confirmations, CandleDecision, CandleVerdict,
    ConfirmationDecision, ConfirmationRequest, MarketConditions, TimeframeConfirmation,
};
use crate::indicators::{support_resistance, IndicatorSnapshot, SupportResistance};
use crate::micro::{self, DataQuality, LiquidityLevel, MicrostructureReport, SpreadTrend};
use crate::patterns::{PatternDetector, PatternPrediction, StatsTable};
use crate::planner::{build_plan, PlannerInput, TradePlan};
use crate::profile::{build_profile, VolumeProfile};
use crate::structure::{self, MarketStructure, Trend};

/// Everything one analysis call consumes. Bars are mandatory; book and tape
/// are optional and degrade the microstructure stage when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<PriceBar>,
    #[serde(default)]
    pub books: Vec<OrderBookSnapshot>,
    #[serde(default)]
    pub trades: Vec<Trade>,
    pub style: TradingStyle,
    pub risk: RiskTolerance,
}

/// What the pipeline decided about releasing a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// A plan cleared both gates.
    Plan {
        plan: TradePlan,
        candle: CandleDecision,
    },
    /// No direction cleared the thresholds — a valid result, not an error.
    NoSignal { reason: String },
    /// Consensus was too divided to act on.
    Conflicted { reasons: Vec<String> },
    /// The candle gate declined to release.
    GateRejected {
        reason: String,
        verdict: CandleVerdict,
        wait_bars: Option<u32>,
    },
    /// The multi-timeframe gate wants corroboration first; the candidate
    /// plan rides along so confirmation can release it.
    Withheld {
        request: ConfirmationRequest,
        candidate: TradePlan,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Close time of the last analyzed bar — reports are a pure function of
    /// their input, so this is the only timestamp they carry.
    pub as_of: DateTime<Utc>,
    pub consensus: ConsensusResult,
    pub structure: MarketStructure,
    pub indicators: IndicatorSnapshot,
    pub profile: VolumeProfile,
    pub micro: MicrostructureReport,
    pub patterns: Vec<PatternPrediction>,
    pub risk_factors: Vec<String>,
    pub outcome: PlanOutcome,
}

pub struct AnalysisPipeline {
    config: AnalysisConfig,
    detector: PatternDetector,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        Self::with_stats(config, StatsTable::default())
    }

    /// Start with a persisted pattern-statistics table.
    pub fn with_stats(config: AnalysisConfig, stats: StatsTable) -> AnalysisResult<Self> {
        config.validate()?;
        let detector = PatternDetector::with_stats(config.patterns.clone(), stats);
        Ok(Self { config, detector })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Training and persistence entry point for the statistics table.
    pub fn detector(&self) -> &PatternDetector {
        &self.detector
    }

    pub fn analyze(&self, input: &AnalysisInput) -> AnalysisResult<AnalysisReport> {
        let bars = &input.bars;
        let required = self.config.min_bars();
        if bars.len() < required {
            return Err(AnalysisError::insufficient(required, bars.len()));
        }
        crate::domain::validate_series(bars)?;

        tracing::debug!(
            symbol = %input.symbol,
            timeframe = %input.timeframe,
            bars = bars.len(),
            books = input.books.len(),
            trades = input.trades.len(),
            "analysis started"
        );

        let structure = structure::classify(bars)?;
        let sr = support_resistance(bars, self.config.indicators.sr_cluster_pct)?;
        let snapshot = IndicatorSnapshot::compute(bars, &self.config.indicators)?;

        // The three mid-stage analyzers are independent; fan out and join.
        let (profile_result, (micro_result, patterns_result)) = rayon::join(
            || build_profile(bars, &self.config.profile),
            || {
                rayon::join(
                    || micro::analyze(&input.books, &input.trades, &self.config.micro),
                    || self.detector.detect(bars, &structure, &sr),
                )
            },
        );
        let profile = profile_result?;
        let micro_report = micro_result?;
        let patterns = patterns_result?;

        let votes = collect_votes(&patterns, &profile, &micro_report, &snapshot, &structure);
        let mut consensus = consensus::build(votes, &self.config.consensus);
        if structure.structure_break {
            consensus
                .conflicting_signals
                .push("structure break against the prevailing trend".into());
        }

        let risk_factors = risk_factors(&structure, &snapshot, &micro_report, &consensus);
        let outcome = self.decide(input, &structure, &sr, &snapshot, &patterns, &consensus)?;

        tracing::info!(
            symbol = %input.symbol,
            direction = ?consensus.overall_direction,
            confidence = consensus.confidence,
            agreement = consensus.agreement_score,
            outcome = outcome_kind(&outcome),
            "analysis complete"
        );

        Ok(AnalysisReport {
            symbol: input.symbol.clone(),
            timeframe: input.timeframe,
            as_of: bars.last().map(|b| b.close_time).unwrap_or_default(),
            consensus,
            structure,
            indicators: snapshot,
            profile,
            micro: micro_report,
            patterns,
            risk_factors,
            outcome,
        })
    }

    /// Second half of the confirmation round-trip: feed higher-timeframe
    /// results back against a pending request.
    pub fn confirm(
        &self,
        request: &ConfirmationRequest,
        confirmations: &[TimeframeConfirmation],
        desired: TradeDirection,
    ) -> ConfirmationDecision {
        resolve_confirmations(request, confirmations, desired.bias())
    }

    /// Gate cascade: consensus thresholds → plan synthesis → candle gate →
    /// multi-timeframe gate.
    fn decide(
        &self,
        input: &AnalysisInput,
        structure: &MarketStructure,
        sr: &SupportResistance,
        snapshot: &IndicatorSnapshot,
        patterns: &[PatternPrediction],
        consensus: &ConsensusResult,
    ) -> AnalysisResult<PlanOutcome> {
        let consensus_config = &self.config.consensus;

        let direction = match TradeDirection::from_bias(consensus.overall_direction) {
            Some(direction) => direction,
            None => {
                return Ok(PlanOutcome::NoSignal {
                    reason: format!(
                        "no directional consensus (weight difference {:.0}%)",
                        consensus.confidence
                    ),
                })
            }
        };
        if consensus.agreement_score < consensus_config.min_agreement_score {
            let mut reasons = consensus.conflicting_signals.clone();
            if reasons.is_empty() {
                reasons.push(format!(
                    "agreement {:.0}% under the {:.0}% floor",
                    consensus.agreement_score, consensus_config.min_agreement_score
                ));
            }
            return Ok(PlanOutcome::Conflicted { reasons });
        }
        if consensus.confidence < consensus_config.min_plan_confidence {
            return Ok(PlanOutcome::NoSignal {
                reason: format!(
                    "consensus confidence {:.0} under the {:.0} floor",
                    consensus.confidence, consensus_config.min_plan_confidence
                ),
            });
        }

        let current_price = input.bars.last().map(|b| b.close).unwrap_or_default();
        let pattern_confidence = patterns
            .first()
            .map(|p| p.confidence * p.historical_success_rate)
            .unwrap_or(consensus.confidence / 100.0);
        let plan = build_plan(&PlannerInput {
            current_price,
            direction,
            atr: snapshot.atr,
            sr,
            style: input.style,
            risk: input.risk,
            pattern_confidence,
        })?;

        let key_level = match direction {
            TradeDirection::Long => sr
                .nearest_support(current_price)
                .map(|l| l.price)
                .unwrap_or(plan.entry.optimal),
            TradeDirection::Short => sr
                .nearest_resistance(current_price)
                .map(|l| l.price)
                .unwrap_or(plan.entry.optimal),
        };
        let candle = evaluate_candle(&input.bars, direction, input.style, key_level, &self.config.gates)?;
        if candle.verdict != CandleVerdict::ReadyToEnter {
            return Ok(PlanOutcome::GateRejected {
                reason: candle.reason.clone(),
                verdict: candle.verdict,
                wait_bars: candle.wait_bars,
            });
        }

        let conditions = MarketConditions {
            atr_pct: snapshot.atr_pct,
            choppy: structure.trend == Trend::Sideways || structure.structure_break,
            strong_trend: structure.trend != Trend::Sideways && !structure.structure_break,
            conflicting_signals: consensus.conflicting_signals.clone(),
        };
        match confirmation_request(
            input.timeframe,
            consensus.confidence,
            input.style,
            &conditions,
            &self.config.gates,
        ) {
            Some(request) => Ok(PlanOutcome::Withheld {
                request,
                candidate: plan,
            }),
            None => Ok(PlanOutcome::Plan { plan, candle }),
        }
    }
}

/// One vote per source, each with its own confidence. Sources with nothing
/// to say (missing data, no emitted pattern) stay silent rather than voting
/// neutral noise.
fn collect_votes(
    patterns: &[PatternPrediction],
    profile: &VolumeProfile,
    micro: &MicrostructureReport,
    snapshot: &IndicatorSnapshot,
    structure: &MarketStructure,
) -> Vec<SignalVote> {
    let mut votes = Vec::with_capacity(5);

    if let Some(top) = patterns.first() {
        votes.push(SignalVote::new(
            "patterns",
            Direction::from_sign(top.expected_move),
            top.confidence * top.historical_success_rate,
            format!(
                "{} at {:.0}% confidence",
                top.pattern.name(),
                top.confidence * 100.0
            ),
        ));
    }

    let profile_direction = profile.bias();
    votes.push(SignalVote::new(
        "volume_profile",
        profile_direction,
        0.3 + 0.5 * (2.0 * (profile.buy_fraction - 0.5)).abs(),
        format!("{:?} phase, {:?} shape", profile.phase, profile.shape),
    ));

    if micro.data_quality != DataQuality::Missing {
        votes.push(SignalVote::new(
            "smart_money",
            micro.smart_money.direction,
            micro.smart_money.confidence,
            format!(
                "institutional flow {:.1} vs retail {:.1}",
                micro.smart_money.institutional_flow, micro.smart_money.retail_flow
            ),
        ));
    }

    if let Some(divergence) = &snapshot.divergence {
        let direction = match divergence.kind {
            crate::indicators::DivergenceKind::Bullish => Direction::Bullish,
            crate::indicators::DivergenceKind::Bearish => Direction::Bearish,
        };
        votes.push(SignalVote::new(
            "divergence",
            direction,
            0.55,
            format!("{:?} RSI/price divergence", divergence.kind),
        ));
    }

    let structure_direction = if structure.structure_break {
        Direction::Neutral
    } else {
        match structure.trend {
            Trend::Uptrend => Direction::Bullish,
            Trend::Downtrend => Direction::Bearish,
            Trend::Sideways => Direction::Neutral,
        }
    };
    votes.push(SignalVote::new(
        "market_structure",
        structure_direction,
        if structure_direction == Direction::Neutral { 0.3 } else { 0.6 },
        format!(
            "{:?}, structure break: {}",
            structure.trend, structure.structure_break
        ),
    ));

    votes
}

fn risk_factors(
    structure: &MarketStructure,
    snapshot: &IndicatorSnapshot,
    micro: &MicrostructureReport,
    consensus: &ConsensusResult,
) -> Vec<String> {
    let mut factors = Vec::new();
    if structure.structure_break {
        factors.push("recent structure break — trend may be reversing".into());
    }
    if structure.trend == Trend::Sideways {
        factors.push("sideways structure — breakout direction unproven".into());
    }
    if snapshot.atr_pct > 0.03 {
        factors.push(format!(
            "elevated volatility: ATR is {:.1}% of price",
            snapshot.atr_pct * 100.0
        ));
    }
    if micro.book.liquidity == LiquidityLevel::Low && micro.data_quality != DataQuality::Missing {
        factors.push("thin order book — expect slippage".into());
    }
    if micro.book.spread_trend == SpreadTrend::Widening {
        factors.push("spread is widening".into());
    }
    if micro.quality.overall < 40.0 && micro.data_quality != DataQuality::Missing {
        factors.push(format!(
            "poor market quality score ({:.0}/100)",
            micro.quality.overall
        ));
    }
    if !consensus.conflicting_signals.is_empty() {
        factors.push(format!(
            "{} conflicting signal(s) on record",
            consensus.conflicting_signals.len()
        ));
    }
    factors
}

fn outcome_kind(outcome: &PlanOutcome) -> &'static str {
    match outcome {
        PlanOutcome::Plan { .. } => "plan",
        PlanOutcome::NoSignal { .. } => "no_signal",
        PlanOutcome::Conflicted { .. } => "conflicted",
        PlanOutcome::GateRejected { .. } => "gate_rejected",
        PlanOutcome::Withheld { .. } => "withheld",
    }
}
