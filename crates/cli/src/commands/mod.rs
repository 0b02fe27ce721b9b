//! CLI commands for the signal engine.

pub mod context;
pub mod evaluate;
pub mod history;
pub mod run;
pub mod tick;

pub use context::GlobalOpts;
pub use evaluate::{run_evaluate, EvaluateArgs};
pub use history::{run_history, HistoryArgs};
pub use run::{run_daemon, RunArgs};
pub use tick::{run_tick, TickArgs};
