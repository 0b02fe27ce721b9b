use super::context::{build_pipeline, SourceArgs, StoreArgs};
use anyhow::Result;
use clap::Args;
use signal_engine_core::AppConfig;
use signal_engine_signals::{OrchestratorConfig, SignalOrchestrator};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Seconds between ticks (overrides pipeline.poll_interval_secs)
    #[arg(long)]
    pub poll_secs: Option<u64>,
}

/// Polls the source until SIGINT or SIGTERM, printing each new signal.
///
/// # Errors
/// Returns error if the pipeline cannot be built or rehydrated.
pub async fn run_daemon(mut config: AppConfig, args: RunArgs) -> Result<()> {
    args.source.apply(&mut config);
    if let Some(secs) = args.poll_secs {
        config.pipeline.poll_interval_secs = secs;
    }

    let pipeline = build_pipeline(&config, &args.source, &args.store).await?;
    if let Some(last) = pipeline.rehydrate().await? {
        println!("{}: last recorded signal {last}", pipeline.symbol());
    }
    let symbol = pipeline.symbol().to_string();

    let orchestrator = SignalOrchestrator::new(
        Arc::new(pipeline),
        OrchestratorConfig {
            poll_interval: Duration::from_secs(config.pipeline.poll_interval_secs.max(1)),
            ..OrchestratorConfig::default()
        },
    );
    let mut signals = orchestrator.subscribe();
    let handle = orchestrator.spawn();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            received = signals.recv() => match received {
                Ok(signal) => println!("{symbol}: {signal}"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "output fell behind, some signals were not printed");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.shutdown().await?;
    tracing::info!("shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigterm), Ok(mut sigint)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) else {
        tracing::warn!("signal handlers unavailable, falling back to Ctrl+C");
        let _ = tokio::signal::ctrl_c().await;
        return;
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
        _ = sigint.recv() => tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
}
