// Error Handling
//
// CLI error types, suggestions and formatting

use poolphase::{PipelineError, ResolveError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for poolgen operations
pub type Result<T> = std::result::Result<T, PoolgenError>;

/// poolgen error types
#[derive(Debug, Error)]
pub enum PoolgenError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
        /// How to fix it
        suggestion: Option<String>,
    },

    /// The generation run aborted
    #[error("Generation failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O errors with context
    #[error("I/O error: {context} (path: {path:?})")]
    Io {
        /// Operation that failed
        context: String,
        /// Path involved, if any
        path: Option<PathBuf>,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl PoolgenError {
    /// Create a config error
    pub fn config_error(message: impl Into<String>, suggestion: Option<String>) -> Self {
        PoolgenError::Config {
            message: message.into(),
            suggestion,
        }
    }

    /// Get user-friendly suggestion for recovery
    pub fn suggestion(&self) -> Option<String> {
        match self {
            PoolgenError::Config { suggestion, .. } => suggestion.clone(),
            PoolgenError::Pipeline(PipelineError::Resolve(ResolveError::OutsideRoots(_))) => Some(
                "Move the module under the framework root or add its root to [generate] source_roots."
                    .to_string(),
            ),
            PoolgenError::Pipeline(PipelineError::PoolDir(_)) => Some(
                "Set [generate] pool_dir to identifier segments below the framework root, e.g. \"pool\"."
                    .to_string(),
            ),
            PoolgenError::Pipeline(PipelineError::Resolve(_)) => Some(
                "Run poolgen from the project directory or pass it as PROJECT_DIR; it must contain a config package."
                    .to_string(),
            ),
            PoolgenError::Pipeline(PipelineError::Validation(_)) => Some(
                "The generated pool does not check. Run with -v to see the diagnostics of the first pass."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

/// Format an error for the terminal
pub fn format_error(error: &PoolgenError) -> String {
    let mut message = format!("Error: {}", error);

    if let Some(suggestion) = error.suggestion() {
        message.push_str(&format!("\n\nSuggestion: {}", suggestion));
    }

    if let PoolgenError::Io {
        path: Some(path), ..
    } = error
    {
        message.push_str(&format!("\n\nPath: {:?}", path));
    }

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_carries_suggestion() {
        let err = PoolgenError::config_error("bad", Some("fix it".to_string()));
        assert_eq!(err.to_string(), "Configuration error: bad");
        assert_eq!(err.suggestion().as_deref(), Some("fix it"));
    }

    #[test]
    fn test_format_error_appends_suggestion_and_path() {
        let err = PoolgenError::config_error("no root", Some("pass --root".to_string()));
        assert_eq!(
            format_error(&err),
            "Error: Configuration error: no root\n\nSuggestion: pass --root"
        );

        let err = PoolgenError::Io {
            context: "read".to_string(),
            path: Some(PathBuf::from("/x")),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(format_error(&err).ends_with("Path: \"/x\""));
    }

    #[test]
    fn test_pool_dir_errors_suggest_config_fix() {
        let err = PoolgenError::from(PipelineError::PoolDir(
            poolphase::validate_pool_dir(std::path::Path::new("."))
                .expect_err("dot is not a pool dir"),
        ));
        assert!(err.suggestion().is_some_and(|s| s.contains("pool_dir")));
    }

    #[test]
    fn test_resolution_errors_suggest_project_dir() {
        let err = PoolgenError::from(PipelineError::Resolve(ResolveError::OutsideRoots(
            PathBuf::from("/elsewhere"),
        )));
        assert!(err
            .suggestion()
            .is_some_and(|s| s.contains("source_roots")));
    }
}
