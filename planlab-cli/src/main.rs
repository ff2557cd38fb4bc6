//! PlanLab CLI — run the analysis pipeline against local market data.
//!
//! Commands:
//! - `analyze` — read bars from a CSV file (plus optional order-book/trade
//!   JSON) and print the structured report as JSON
//! - `demo` — run against a deterministic synthetic feed; the only place in
//!   the workspace where sample data is generated

mod data;
mod sample;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use planlab_core::config::AnalysisConfig;
use planlab_core::domain::{RiskTolerance, Timeframe, TradingStyle};
use planlab_core::pipeline::{AnalysisInput, AnalysisPipeline, AnalysisReport};

#[derive(Parser)]
#[command(name = "planlab", about = "PlanLab — technical-analysis trade planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a CSV bar file and print the JSON report.
    Analyze {
        /// CSV with open_time, close_time, open, high, low, close, volume.
        bars: PathBuf,

        /// Optional JSON array of order-book snapshots.
        #[arg(long)]
        book: Option<PathBuf>,

        /// Optional JSON array of trades.
        #[arg(long)]
        trades: Option<PathBuf>,

        /// Working timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d).
        #[arg(long, default_value = "1h")]
        timeframe: String,

        /// Trading style: scalping, day, swing, position.
        #[arg(long, default_value = "day")]
        style: String,

        /// Risk tolerance: conservative, moderate, aggressive.
        #[arg(long, default_value = "moderate")]
        risk: String,

        #[arg(long, default_value = "UNKNOWN")]
        symbol: String,

        /// TOML config overriding the analysis defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Single-line JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,
    },

    /// Analyze a synthetic feed (deterministic per seed).
    Demo {
        #[arg(long, default_value_t = 240)]
        bars: usize,

        #[arg(long, default_value_t = 7)]
        seed: u64,

        #[arg(long, default_value = "15m")]
        timeframe: String,

        #[arg(long, default_value = "day")]
        style: String,

        #[arg(long, default_value = "moderate")]
        risk: String,

        #[arg(long)]
        compact: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Analyze {
            bars,
            book,
            trades,
            timeframe,
            style,
            risk,
            symbol,
            config,
            compact,
        } => {
            let config = load_config(config.as_deref())?;
            let input = AnalysisInput {
                symbol,
                timeframe: parse::<Timeframe>(&timeframe)?,
                bars: data::load_bars(&bars)?,
                books: book.as_deref().map(data::load_books).transpose()?.unwrap_or_default(),
                trades: trades
                    .as_deref()
                    .map(data::load_trades)
                    .transpose()?
                    .unwrap_or_default(),
                style: parse::<TradingStyle>(&style)?,
                risk: parse::<RiskTolerance>(&risk)?,
            };
            let pipeline = AnalysisPipeline::new(config)?;
            let report = pipeline.analyze(&input)?;
            print_report(&report, compact)
        }
        Commands::Demo {
            bars,
            seed,
            timeframe,
            style,
            risk,
            compact,
        } => {
            let feed = sample::generate(seed, bars);
            let input = AnalysisInput {
                symbol: format!("DEMO-{seed}"),
                timeframe: parse::<Timeframe>(&timeframe)?,
                bars: feed.bars,
                books: feed.books,
                trades: feed.trades,
                style: parse::<TradingStyle>(&style)?,
                risk: parse::<RiskTolerance>(&risk)?,
            };
            let pipeline = AnalysisPipeline::new(AnalysisConfig::default())?;
            let report = pipeline.analyze(&input)?;
            print_report(&report, compact)
        }
    }
}

fn parse<T: std::str::FromStr<Err = String>>(text: &str) -> Result<T> {
    text.parse::<T>().map_err(|e| anyhow!(e))
}

fn load_config(path: Option<&std::path::Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(AnalysisConfig::from_toml_str(&text)?)
        }
        None => Ok(AnalysisConfig::default()),
    }
}

fn print_report(report: &AnalysisReport, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(report)?
    } else {
        serde_json::to_string_pretty(report)?
    };
    println!("{json}");
    Ok(())
}
