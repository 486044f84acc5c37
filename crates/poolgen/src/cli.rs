// CLI Interface
//
// Command-line entry point for pool generation.

use crate::config::{detect_framework_root, PoolgenConfig, ROOT_ENV};
use crate::errors::PoolgenError;
use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use poolphase::{run_generation, GenerationConfig};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// poolgen - generate the model pool package of a project
#[derive(Parser, Debug)]
#[command(name = "poolgen")]
#[command(author = "poolgen Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge model fragments of the loaded modules into the pool package", long_about = None)]
pub struct Cli {
    /// Project directory whose `config` package imports the modules
    #[arg(value_name = "PROJECT_DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Generate for the module in this directory only
    #[arg(long = "test", short = 't', value_name = "MODULE_DIR")]
    pub test_module: Option<PathBuf>,

    /// Only reset the pool to its placeholder
    #[arg(long = "empty")]
    pub empty: bool,

    /// Framework root (overrides POOLGEN_ROOT and poolgen.toml detection)
    #[arg(long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Configuration file to use instead of `<root>/poolgen.toml`
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the run report as JSON to this file
    #[arg(long = "report-json", value_name = "FILE")]
    pub report_json: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Run the CLI
    pub fn run(self) -> AnyhowResult<()> {
        let start = self
            .test_module
            .clone()
            .unwrap_or_else(|| self.project_dir.clone());
        let env_root = std::env::var_os(ROOT_ENV).map(PathBuf::from);
        let framework_root = detect_framework_root(self.root.as_deref(), env_root, &start)?;

        let config = match &self.config {
            Some(path) => PoolgenConfig::load_file(path)?,
            None => PoolgenConfig::load(&framework_root)?,
        };

        init_logging_impl(self.verbose, &config.logging.level);
        debug!(root = %framework_root.display(), ?config, "configuration loaded");

        let generation = GenerationConfig {
            project_dir: self.project_dir,
            test_module: self.test_module,
            empty_pool: self.empty,
            framework_root,
            pool_dir: config.generate.pool_dir,
            source_roots: config.generate.source_roots,
        };

        let stdout = std::io::stdout();
        let mut progress = stdout.lock();
        let verdict = run_generation(generation, &mut progress);
        info!(state = %verdict.state, "generation finished");

        if let Some(path) = &self.report_json {
            verdict
                .report
                .save_to_path(path)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
        }

        verdict.into_result().map_err(PoolgenError::from)?;
        Ok(())
    }
}

/// Initialize logging on stderr
///
/// `-v` forces debug output; otherwise `RUST_LOG` wins over the configured level.
fn init_logging_impl(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["poolgen"]);
        assert_eq!(cli.project_dir, PathBuf::from("."));
        assert!(cli.test_module.is_none());
        assert!(!cli.empty);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "poolgen",
            "-t",
            "modules/base",
            "--empty",
            "--root",
            "/framework",
            "--report-json",
            "out.json",
            "-v",
            "project",
        ]);
        assert_eq!(cli.project_dir, PathBuf::from("project"));
        assert_eq!(cli.test_module, Some(PathBuf::from("modules/base")));
        assert!(cli.empty);
        assert_eq!(cli.root, Some(PathBuf::from("/framework")));
        assert_eq!(cli.report_json, Some(PathBuf::from("out.json")));
        assert!(cli.verbose);
    }
}
