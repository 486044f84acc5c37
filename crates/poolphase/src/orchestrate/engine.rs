use std::io::Write;

use poolload::{LoadError, LoadMode, Loader};
use poolsynth::{DefaultSynthesizer, PoolSynthesizer, SynthError};
use thiserror::Error;

use crate::options::{GenerationConfig, PoolDirError};
use crate::project::{resolve, ResolveError};
use crate::report::{pool_digest, RunReport};
use crate::stage::{stage, StageError};

use super::state::PipelineState;

/// Fatal errors of a generation run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Pool directory is unsafe to stage or has no import path.
    #[error(transparent)]
    PoolDir(#[from] PoolDirError),

    /// Pool directory could not be reset.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Target package could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Tolerant load could not produce a program.
    #[error("error while loading program: {0}")]
    Load(#[source] LoadError),

    /// Synthesizer failed.
    #[error("error while generating pool: {0}")]
    Synthesis(#[from] SynthError),

    /// Generated pool does not load cleanly.
    #[error("generated code does not check: {0}")]
    Validation(#[source] LoadError),
}

/// Outcome of a run.
#[derive(Debug)]
pub struct RunVerdict {
    /// Terminal state, `Done` or `Aborted`.
    pub state: PipelineState,
    /// Every state visited, in order.
    pub trace: Vec<PipelineState>,
    /// Error that aborted the run.
    pub error: Option<PipelineError>,
    /// What the run produced before it ended.
    pub report: RunReport,
}

impl RunVerdict {
    /// True when the run reached `Done`.
    pub fn is_success(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// Report on success, error otherwise.
    pub fn into_result(self) -> Result<RunReport, PipelineError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.report),
        }
    }
}

struct Tracker {
    state: PipelineState,
    trace: Vec<PipelineState>,
}

impl Tracker {
    fn new() -> Self {
        Self {
            state: PipelineState::Start,
            trace: vec![PipelineState::Start],
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition(next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        tracing::info!(from = %self.state, to = %next, "pipeline step");
        self.state = next;
        self.trace.push(next);
    }
}

/// Engine that sequences staging, resolution, loading, synthesis and validation.
pub struct PipelineEngine<S: PoolSynthesizer = DefaultSynthesizer> {
    config: GenerationConfig,
    synthesizer: S,
}

impl PipelineEngine<DefaultSynthesizer> {
    /// Create an engine using the default synthesizer for the configured pool.
    pub fn new(config: GenerationConfig) -> Self {
        let synthesizer = DefaultSynthesizer::new(config.pool_import_path(), config.pool_name());
        Self::with_synthesizer(config, synthesizer)
    }
}

impl<S: PoolSynthesizer> PipelineEngine<S> {
    /// Create an engine with a custom synthesizer.
    pub fn with_synthesizer(config: GenerationConfig, synthesizer: S) -> Self {
        Self {
            config,
            synthesizer,
        }
    }

    /// Execute one run, writing progress lines to `progress`.
    ///
    /// Every fatal error moves the run to `Aborted`; nothing is retried.
    pub fn run(&self, progress: &mut dyn Write) -> RunVerdict {
        let mut tracker = Tracker::new();
        let mut report = RunReport {
            pool_dir: self.config.pool_path(),
            ..RunReport::default()
        };

        let error = match self.execute(&mut tracker, &mut report, progress) {
            Ok(()) => None,
            Err(err) => {
                tracing::error!(error = %err, state = %tracker.state, "generation aborted");
                tracker.advance(PipelineState::Aborted);
                Some(err)
            }
        };

        RunVerdict {
            state: tracker.state,
            trace: tracker.trace,
            error,
            report,
        }
    }

    fn execute(
        &self,
        tracker: &mut Tracker,
        report: &mut RunReport,
        out: &mut dyn Write,
    ) -> Result<(), PipelineError> {
        self.config.validate()?;
        let pool_path = self.config.pool_path();
        stage(&pool_path)?;
        tracker.advance(PipelineState::Staged);

        if self.config.empty_pool {
            report.digest = digest(&pool_path);
            tracker.advance(PipelineState::Done);
            return Ok(());
        }

        line(out, "Poolgen Generate\n----------------");
        line(
            out,
            &format!(
                "Detected framework root at {}.",
                self.config.framework_root.display()
            ),
        );

        let context = self.config.build_context();
        let resolution = resolve(&self.config, &context)?;
        line(out, &format!("target dir {}", resolution.target_dir.display()));
        line(out, &format!("Project package found: {}.", resolution.package));
        report.package = Some(resolution.package.clone());
        report.imports = resolution.imports.as_slice().to_vec();
        tracker.advance(PipelineState::Resolved);

        line(
            out,
            "Loading program...\nWarnings may appear here, just ignore them if poolgen doesn't fail.",
        );
        let loader = Loader::new(&context);
        let program = loader
            .load(&resolution.imports, LoadMode::Tolerant)
            .map_err(PipelineError::Load)?;
        for diagnostic in &program.diagnostics {
            tracing::warn!("{}", diagnostic);
        }
        report.warnings = program.diagnostics.len();
        report.loaded_packages = program
            .packages
            .iter()
            .map(|package| package.import_path.clone())
            .collect();
        line(out, "Ok");
        tracker.advance(PipelineState::Loaded);

        partial(out, "Generating pool...");
        let output = match self.synthesizer.synthesize(&program, &pool_path) {
            Ok(output) => output,
            Err(err) => {
                line(out, &format!("FAIL {}", err));
                return Err(err.into());
            }
        };
        line(out, "Ok");
        report.models = output.models;
        report.files = output.files;
        tracker.advance(PipelineState::Synthesized);

        partial(out, "Checking the generated code...");
        let mut strict_imports = resolution.imports.clone();
        let pool_import_path = self.config.pool_import_path();
        if !strict_imports.contains(&pool_import_path) {
            strict_imports.push(pool_import_path);
        }
        if let Err(err) = loader.load(&strict_imports, LoadMode::Strict) {
            line(out, &format!("FAIL {}", err));
            return Err(PipelineError::Validation(err));
        }
        line(out, "Ok");
        tracker.advance(PipelineState::Validated);

        report.digest = digest(&pool_path);
        line(out, "Pool generated successfully");
        tracker.advance(PipelineState::Done);
        Ok(())
    }
}

fn digest(pool_path: &std::path::Path) -> Option<String> {
    match pool_digest(pool_path) {
        Ok(digest) => Some(digest),
        Err(err) => {
            tracing::warn!(error = %err, "failed to digest pool");
            None
        }
    }
}

// Progress writes are best effort.
fn line(out: &mut dyn Write, text: &str) {
    let _ = writeln!(out, "{}", text);
}

fn partial(out: &mut dyn Write, text: &str) {
    let _ = write!(out, "{}", text);
    let _ = out.flush();
}
