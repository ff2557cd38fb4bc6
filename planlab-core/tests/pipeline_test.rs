//! End-to-end pipeline scenarios: full data, degraded data, gate rejections,
//! and the confirmation round-trip.

use chrono::{DateTime, TimeZone, Utc};
use planlab_core::config::AnalysisConfig;
use planlab_core::domain::{
    BookLevel, Direction, OrderBookSnapshot, PriceBar, RiskTolerance, Timeframe, Trade,
    TradeDirection, TradeSide, TradingStyle,
};
use planlab_core::gates::TimeframeConfirmation;
use planlab_core::micro::DataQuality;
use planlab_core::pipeline::{AnalysisInput, AnalysisPipeline, PlanOutcome};
use planlab_core::AnalysisError;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> PriceBar {
    let open_time = base_time() + chrono::Duration::minutes(15 * i as i64);
    PriceBar {
        open_time,
        close_time: open_time + chrono::Duration::minutes(15),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Steady climb with rising participation.
fn trending_bars(n: usize) -> Vec<PriceBar> {
    (0..n)
        .map(|i| {
            let open = 100.0 + 0.8 * i as f64;
            let close = open + 0.8;
            bar(i, open, close + 1.0, open - 1.0, close, 1000.0 + 60.0 * i as f64)
        })
        .collect()
}

/// The trend, finished with a decisive wide-bodied confirmation bar.
fn trending_bars_with_confirmation(n: usize) -> Vec<PriceBar> {
    let mut bars = trending_bars(n - 1);
    let prev_close = bars.last().unwrap().close;
    let avg_volume = bars[bars.len() - 5..]
        .iter()
        .map(|b| b.volume)
        .sum::<f64>()
        / 5.0;
    bars.push(bar(
        n - 1,
        prev_close,
        prev_close + 2.6,
        prev_close - 0.1,
        prev_close + 2.5,
        avg_volume * 2.0,
    ));
    bars
}

fn steady_books(n: usize, around: f64) -> Vec<OrderBookSnapshot> {
    (0..n)
        .map(|i| OrderBookSnapshot {
            timestamp: base_time() + chrono::Duration::seconds(i as i64),
            bids: vec![
                BookLevel { price: around - 0.01, size: 30.0 },
                BookLevel { price: around - 0.05, size: 40.0 },
            ],
            asks: vec![
                BookLevel { price: around + 0.01, size: 30.0 },
                BookLevel { price: around + 0.05, size: 40.0 },
            ],
        })
        .collect()
}

fn buy_heavy_trades(n: usize, around: f64) -> Vec<Trade> {
    (0..n)
        .map(|i| Trade {
            timestamp: base_time() + chrono::Duration::seconds(i as i64),
            price: around,
            size: if i % 7 == 0 { 40.0 } else { 1.0 + 0.05 * (i % 5) as f64 },
            side: if i % 4 == 0 { TradeSide::Sell } else { TradeSide::Buy },
            id: i as u64,
        })
        .collect()
}

fn input(bars: Vec<PriceBar>, style: TradingStyle, timeframe: Timeframe) -> AnalysisInput {
    let last = bars.last().map(|b| b.close).unwrap_or(100.0);
    AnalysisInput {
        symbol: "TESTUSD".into(),
        timeframe,
        books: steady_books(10, last),
        trades: buy_heavy_trades(40, last),
        bars,
        style,
        risk: RiskTolerance::Moderate,
    }
}

#[test]
fn full_input_produces_full_report() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let report = pipeline
        .analyze(&input(trending_bars(60), TradingStyle::DayTrading, Timeframe::H1))
        .unwrap();

    assert_eq!(report.micro.data_quality, DataQuality::Full);
    assert_eq!(report.consensus.overall_direction, Direction::Bullish);
    assert!(report.consensus.confidence > 50.0);
    assert!(!report.patterns.is_empty());
    assert!(report.profile.total_volume > 0.0);
    // last of 60 bars opens at 59 * 15min and closes 15min later
    assert_eq!(
        report.as_of,
        base_time() + chrono::Duration::minutes(15 * 59 + 15)
    );
}

#[test]
fn missing_book_and_tape_degrades_not_fails() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let mut analysis_input = input(trending_bars(60), TradingStyle::DayTrading, Timeframe::H1);
    analysis_input.books.clear();
    analysis_input.trades.clear();
    let report = pipeline.analyze(&analysis_input).unwrap();
    assert_eq!(report.micro.data_quality, DataQuality::Missing);
    assert_eq!(report.consensus.overall_direction, Direction::Bullish);
}

#[test]
fn crossed_book_fails_the_call() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let mut analysis_input = input(trending_bars(60), TradingStyle::DayTrading, Timeframe::H1);
    analysis_input.books[3].bids[0].price = analysis_input.books[3].asks[0].price + 0.1;
    let err = pipeline.analyze(&analysis_input).unwrap_err();
    assert!(matches!(err, AnalysisError::CrossedBook { .. }));
}

#[test]
fn short_history_is_insufficient_data() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let err = pipeline
        .analyze(&input(trending_bars(20), TradingStyle::DayTrading, Timeframe::H1))
        .unwrap_err();
    assert!(matches!(
        err,
        AnalysisError::InsufficientData { required: 35, got: 20 }
    ));
}

#[test]
fn fast_timeframe_scalp_is_withheld_for_confirmation() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let report = pipeline
        .analyze(&input(
            trending_bars_with_confirmation(60),
            TradingStyle::Scalping,
            Timeframe::M15,
        ))
        .unwrap();

    match &report.outcome {
        PlanOutcome::Withheld { request, candidate } => {
            // the 15m working timeframe mandates the 30m and 1h views
            assert_eq!(request.required, vec![Timeframe::M30, Timeframe::H1]);
            assert!(!request.reasons.is_empty());
            candidate.validate().unwrap();
            assert_eq!(candidate.direction, TradeDirection::Long);
        }
        other => panic!("expected Withheld, got {other:?}"),
    }
}

#[test]
fn confirmation_roundtrip_releases_or_blocks() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let report = pipeline
        .analyze(&input(
            trending_bars_with_confirmation(60),
            TradingStyle::Scalping,
            Timeframe::M15,
        ))
        .unwrap();
    let request = match &report.outcome {
        PlanOutcome::Withheld { request, .. } => request.clone(),
        other => panic!("expected Withheld, got {other:?}"),
    };

    // partial evidence: still blocked, missing timeframes named
    let partial = pipeline.confirm(
        &request,
        &[TimeframeConfirmation {
            timeframe: Timeframe::M30,
            bias: Direction::Bullish,
            confidence: 80.0,
        }],
        TradeDirection::Long,
    );
    assert!(!partial.can_proceed);
    assert_eq!(partial.missing, vec![Timeframe::H1]);

    // aligned evidence: released
    let aligned = pipeline.confirm(
        &request,
        &[
            TimeframeConfirmation {
                timeframe: Timeframe::M30,
                bias: Direction::Bullish,
                confidence: 80.0,
            },
            TimeframeConfirmation {
                timeframe: Timeframe::H1,
                bias: Direction::Bullish,
                confidence: 70.0,
            },
        ],
        TradeDirection::Long,
    );
    assert!(aligned.can_proceed);
    assert_eq!(aligned.overall_bias, Some(Direction::Bullish));

    // opposing evidence: blocked with the opposing bias on record
    let opposed = pipeline.confirm(
        &request,
        &[
            TimeframeConfirmation {
                timeframe: Timeframe::M30,
                bias: Direction::Bearish,
                confidence: 90.0,
            },
            TimeframeConfirmation {
                timeframe: Timeframe::H1,
                bias: Direction::Bearish,
                confidence: 80.0,
            },
        ],
        TradeDirection::Long,
    );
    assert!(!opposed.can_proceed);
    assert_eq!(opposed.overall_bias, Some(Direction::Bearish));
}

#[test]
fn weak_final_bar_is_gate_rejected() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    // trend ends on an indecisive doji-ish bar
    let mut bars = trending_bars(59);
    let prev_close = bars.last().unwrap().close;
    bars.push(bar(
        59,
        prev_close,
        prev_close + 1.4,
        prev_close - 1.4,
        prev_close + 0.05,
        1000.0 + 60.0 * 59.0,
    ));
    let report = pipeline
        .analyze(&input(bars, TradingStyle::Scalping, Timeframe::M15))
        .unwrap();
    match &report.outcome {
        PlanOutcome::GateRejected { verdict, wait_bars, .. } => {
            assert_ne!(
                *verdict,
                planlab_core::gates::CandleVerdict::ReadyToEnter
            );
            assert!(wait_bars.is_some() || *verdict == planlab_core::gates::CandleVerdict::AvoidTrade);
        }
        other => panic!("expected GateRejected, got {other:?}"),
    }
}

#[test]
fn training_feedback_survives_snapshot_roundtrip() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let report = pipeline
        .analyze(&input(trending_bars(60), TradingStyle::DayTrading, Timeframe::H1))
        .unwrap();
    let top = report.patterns[0].pattern;

    pipeline
        .detector()
        .add_training_example(top, Timeframe::H1, true, 0.05, 2.0);
    let snapshot = pipeline.detector().stats_snapshot();

    // a fresh pipeline reloaded from the snapshot sees the same history
    let reloaded =
        AnalysisPipeline::with_stats(AnalysisConfig::default(), snapshot.clone()).unwrap();
    assert_eq!(reloaded.detector().stats_snapshot(), snapshot);
    assert_eq!(snapshot.success_rate(top), 1.0);
}
