//! Background polling loop around a [`SignalPipeline`].
//!
//! The orchestrator ticks the pipeline on a fixed interval, accepts
//! commands to tick immediately or stop, and republishes every emitted
//! signal on a broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use signal_engine_core::{CandleSource, Signal, SignalStore};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::pipeline::{SignalPipeline, TickOutcome};

/// Commands to control the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorCommand {
    /// Run a tick now, outside the regular cadence
    TickNow,
    /// Stop after the current tick
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Interval between ticks
    pub poll_interval: Duration,
    /// Capacity of the emitted-signal broadcast channel
    pub channel_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            channel_capacity: 64,
        }
    }
}

/// Handle to a running orchestrator task.
pub struct OrchestratorHandle {
    commands: mpsc::Sender<OrchestratorCommand>,
    task: JoinHandle<()>,
}

impl OrchestratorHandle {
    /// Asks for an immediate tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the orchestrator has already stopped.
    pub async fn tick_now(&self) -> anyhow::Result<()> {
        self.commands
            .send(OrchestratorCommand::TickNow)
            .await
            .map_err(|_| anyhow::anyhow!("orchestrator is not running"))
    }

    /// Stops the loop and waits for the task to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the task panicked.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        // a closed channel also stops the loop
        let _ = self.commands.send(OrchestratorCommand::Shutdown).await;
        self.task.await?;
        Ok(())
    }
}

pub struct SignalOrchestrator<S, P> {
    pipeline: Arc<SignalPipeline<S, P>>,
    config: OrchestratorConfig,
    signals: broadcast::Sender<Signal>,
}

impl<S, P> SignalOrchestrator<S, P>
where
    S: CandleSource + 'static,
    P: SignalStore + 'static,
{
    #[must_use]
    pub fn new(pipeline: Arc<SignalPipeline<S, P>>, config: OrchestratorConfig) -> Self {
        let (signals, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            pipeline,
            config,
            signals,
        }
    }

    /// Receiver for every signal emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.signals.subscribe()
    }

    /// Spawns the polling task. The first tick runs immediately.
    pub fn spawn(self) -> OrchestratorHandle {
        let (tx, mut rx) = mpsc::channel(32);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                symbol = %self.pipeline.symbol(),
                evaluator = self.pipeline.evaluator().name(),
                interval = ?self.config.poll_interval,
                "signal orchestrator started"
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => self.run_tick().await,
                    cmd = rx.recv() => match cmd {
                        Some(OrchestratorCommand::TickNow) => {
                            tracing::debug!("received TickNow command");
                            self.run_tick().await;
                        }
                        Some(OrchestratorCommand::Shutdown) => {
                            tracing::info!("signal orchestrator shutting down");
                            break;
                        }
                        None => {
                            tracing::info!("command channel closed, orchestrator shutting down");
                            break;
                        }
                    },
                }
            }
        });

        OrchestratorHandle { commands: tx, task }
    }

    async fn run_tick(&self) {
        match self.pipeline.tick().await {
            Ok(TickOutcome::Emitted(signal)) => {
                // no subscribers is fine
                let _ = self.signals.send(signal);
            }
            Ok(_) => {}
            // already logged by the pipeline; the next interval retries
            Err(e) => tracing::debug!(error = %e, "tick error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use signal_engine_core::{Candle, CandleSeries, SignalEvaluator, SignalLevel, SignalType};
    use signal_engine_data::InMemorySignalStore;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Each fetch returns a series one candle longer than the last.
    struct GrowingSource {
        fetches: AtomicI64,
    }

    #[async_trait]
    impl CandleSource for GrowingSource {
        async fn fetch_candles(&self) -> Result<CandleSeries> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            let candles = (0..n)
                .map(|i| Candle::new(i * 60_000, 1.0, 1.0, 1.0, 1.0, 1.0))
                .collect();
            Ok(CandleSeries::new(candles)?)
        }

        fn symbol(&self) -> &str {
            "TESTUSDT"
        }
    }

    struct LastCandleBuy;

    impl SignalEvaluator for LastCandleBuy {
        fn evaluate(&self, series: &CandleSeries) -> Option<Signal> {
            let last = series.last()?;
            Some(Signal::new(SignalType::Buy, SignalLevel::Low, last.close, last.time))
        }

        fn required_lookback(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "last-candle-buy"
        }
    }

    fn orchestrator(poll: Duration) -> SignalOrchestrator<GrowingSource, Arc<InMemorySignalStore>> {
        let pipeline = SignalPipeline::new(
            GrowingSource {
                fetches: AtomicI64::new(0),
            },
            Arc::new(InMemorySignalStore::new()),
            Box::new(LastCandleBuy),
        );
        SignalOrchestrator::new(
            Arc::new(pipeline),
            OrchestratorConfig {
                poll_interval: poll,
                channel_capacity: 8,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_runs_immediately_and_broadcasts() {
        let orchestrator = orchestrator(Duration::from_secs(60));
        let mut signals = orchestrator.subscribe();
        let handle = orchestrator.spawn();

        let first = signals.recv().await.unwrap();
        assert_eq!(first.time, 0);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn tick_now_runs_out_of_cadence() {
        let orchestrator = orchestrator(Duration::from_secs(3_600));
        let mut signals = orchestrator.subscribe();
        let handle = orchestrator.spawn();

        assert_eq!(signals.recv().await.unwrap().time, 0);
        handle.tick_now().await.unwrap();
        assert_eq!(signals.recv().await.unwrap().time, 60_000);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn interval_keeps_ticking() {
        let orchestrator = orchestrator(Duration::from_secs(10));
        let mut signals = orchestrator.subscribe();
        let handle = orchestrator.spawn();

        for expected in 0..3 {
            assert_eq!(signals.recv().await.unwrap().time, expected * 60_000);
        }

        handle.shutdown().await.unwrap();
    }
}
