use super::context::{build_pipeline, SourceArgs, StoreArgs};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use signal_engine_core::{AppConfig, Signal};
use signal_engine_signals::TickOutcome;

/// Arguments for the tick command
#[derive(Args, Debug, Clone)]
pub struct TickArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Machine-readable form of a [`TickOutcome`].
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum TickReport<'a> {
    Emitted { signal: &'a Signal },
    NoSignal { reason: String },
    Duplicate { signal: &'a Signal },
    Superseded { ticket: u64 },
}

impl<'a> From<&'a TickOutcome> for TickReport<'a> {
    fn from(outcome: &'a TickOutcome) -> Self {
        match outcome {
            TickOutcome::Emitted(signal) => Self::Emitted { signal },
            TickOutcome::NoSignal(reason) => Self::NoSignal {
                reason: reason.to_string(),
            },
            TickOutcome::Duplicate(signal) => Self::Duplicate { signal },
            TickOutcome::Superseded { ticket } => Self::Superseded { ticket: *ticket },
        }
    }
}

fn describe(outcome: &TickOutcome) -> String {
    match outcome {
        TickOutcome::Emitted(signal) => format!("emitted: {signal}"),
        TickOutcome::NoSignal(reason) => format!("no signal: {reason}"),
        TickOutcome::Duplicate(signal) => format!("duplicate (already emitted): {signal}"),
        TickOutcome::Superseded { ticket } => format!("superseded (ticket {ticket})"),
    }
}

/// Runs a single evaluation pass against the persisted history.
///
/// # Errors
/// Returns error if the store cannot be opened or the tick fails.
pub async fn run_tick(mut config: AppConfig, args: TickArgs) -> Result<()> {
    args.source.apply(&mut config);
    let pipeline = build_pipeline(&config, &args.source, &args.store).await?;
    pipeline.rehydrate().await?;

    let outcome = pipeline.tick().await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&TickReport::from(&outcome))?);
    } else {
        println!("{}: {}", pipeline.symbol(), describe(&outcome));
    }
    Ok(())
}
