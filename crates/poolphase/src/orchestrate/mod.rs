//! Orchestration layer sequencing one generation run.

/// Pipeline engine and run verdicts.
pub mod engine;
/// Pipeline state machine.
pub mod state;

pub use engine::{PipelineEngine, PipelineError, RunVerdict};
pub use state::PipelineState;
