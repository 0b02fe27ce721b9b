//! Dedup gate, tick pipeline and polling orchestrator.

pub mod dedup;
pub mod orchestrator;
pub mod pipeline;

pub use dedup::{Admission, DedupGate};
pub use orchestrator::{
    OrchestratorCommand, OrchestratorConfig, OrchestratorHandle, SignalOrchestrator,
};
pub use pipeline::{NoSignalReason, SignalPipeline, TickOutcome};
