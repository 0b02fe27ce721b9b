use super::context::SourceArgs;
use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use signal_engine_core::{AppConfig, CandleSeries, CandleSource, Signal, SignalEvaluator};
use signal_engine_data::write_candles;
use signal_engine_strategy::{build_evaluator, FrameSnapshot, IndicatorFrame};
use std::path::PathBuf;

/// Arguments for the evaluate command
#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Evaluate every candle from the first one with enough history, not just the last
    #[arg(long)]
    pub scan: bool,

    /// Save the fetched candles to a CSV file
    #[arg(long, value_name = "PATH")]
    pub save_csv: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Evaluation {
    symbol: String,
    evaluator: String,
    candles: usize,
    indicators: Option<FrameSnapshot>,
    signal: Option<Signal>,
}

/// Signals the evaluator would raise on each prefix of `series`.
///
/// Each prefix ends on one candle, so this is what the live pipeline would
/// have seen had it ticked once per candle.
fn scan(evaluator: &dyn SignalEvaluator, series: &CandleSeries) -> Result<Vec<Signal>> {
    let candles = series.as_slice();
    let start = evaluator.required_lookback().max(1);

    let mut signals = Vec::new();
    for end in start..=candles.len() {
        let prefix = CandleSeries::new(candles[..end].to_vec())?;
        if let Some(signal) = evaluator.evaluate(&prefix) {
            signals.push(signal);
        }
    }
    Ok(signals)
}

/// Fetches candles once and runs the evaluator without touching the store.
///
/// # Errors
/// Returns error if fetching fails or the series is empty.
pub async fn run_evaluate(mut config: AppConfig, args: EvaluateArgs) -> Result<()> {
    args.source.apply(&mut config);
    let source = args.source.build(&config)?;
    let series = source.fetch_candles().await?;
    if series.is_empty() {
        bail!("no candles returned for {}", source.symbol());
    }

    if let Some(path) = &args.save_csv {
        write_candles(path, series.as_slice())?;
        tracing::info!(path = %path.display(), candles = series.len(), "saved candles");
    }

    let evaluator = build_evaluator(&config);

    if args.scan {
        let signals = scan(evaluator.as_ref(), &series)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&signals)?);
        } else {
            println!(
                "{}: {} signal(s) over {} candles ({})",
                source.symbol(),
                signals.len(),
                series.len(),
                evaluator.name()
            );
            for signal in &signals {
                println!("  {signal}");
            }
        }
        return Ok(());
    }

    let frame = IndicatorFrame::compute(&series, &config.indicators);
    let report = Evaluation {
        symbol: source.symbol().to_string(),
        evaluator: evaluator.name().to_string(),
        candles: series.len(),
        indicators: frame.len().checked_sub(1).map(|last| frame.snapshot(last)),
        signal: evaluator.evaluate(&series),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} ({} candles, {})",
        report.symbol, report.candles, report.evaluator
    );
    if let Some(snapshot) = &report.indicators {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    }
    match &report.signal {
        Some(signal) => println!("signal: {signal}"),
        None if series.len() < evaluator.required_lookback() => println!(
            "no signal: insufficient data ({}/{} candles)",
            series.len(),
            evaluator.required_lookback()
        ),
        None => println!("no signal"),
    }
    Ok(())
}
