#![warn(missing_docs)]

//! poolphase - pool generation pipeline.
//!
//! Stages the pool directory, resolves the project's import set, loads the
//! program tolerantly, hands it to a pool synthesizer and reloads the result
//! strictly before declaring success.

/// Generation inputs.
pub mod options;
/// Orchestration engine and state machine.
pub mod orchestrate;
/// Target package and import set resolution.
pub mod project;
/// Run reports and pool digests.
pub mod report;
/// Pool directory staging.
pub mod stage;

use std::io::Write;

pub use options::{
    validate_pool_dir, GenerationConfig, PoolDirError, CONFIG_DIR, DEFAULT_POOL_DIR,
};
pub use orchestrate::{PipelineEngine, PipelineError, PipelineState, RunVerdict};
pub use project::{resolve, Resolution, ResolveError};
pub use report::{pool_digest, RunReport};
pub use stage::{placeholder_source, stage, StageError};

/// Run the pipeline with the default synthesizer.
pub fn run_generation(config: GenerationConfig, progress: &mut dyn Write) -> RunVerdict {
    PipelineEngine::new(config).run(progress)
}
