// Pool directory staging

use poolload::sanitize_package_name;
use poolsynth::{GENERATED_HEADER, PLACEHOLDER_FILE};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resetting the pool directory
#[derive(Debug, Error)]
pub enum StageError {
    /// Existing contents could not be removed
    #[error("failed to clear {}: {source}", .path.display())]
    Remove {
        /// Path being removed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The directory could not be created
    #[error("failed to create {}: {source}", .path.display())]
    Create {
        /// Directory being created
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The placeholder could not be written
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Placeholder path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Contents of the placeholder file for a pool named `pool_name`.
pub fn placeholder_source(pool_name: &str) -> String {
    format!("{}#![package({})]\n", GENERATED_HEADER, pool_name)
}

/// Reset `path` to an empty directory holding only the placeholder.
///
/// Whatever exists at `path` is removed first, whether a directory tree or a
/// stray file. Returns the placeholder path.
pub fn stage(path: &Path) -> Result<PathBuf, StageError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
    .map_err(|source| StageError::Remove {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::create_dir_all(path).map_err(|source| StageError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    let pool_name = path
        .file_name()
        .map(|name| sanitize_package_name(&name.to_string_lossy()))
        .unwrap_or_else(|| sanitize_package_name(""));
    let placeholder = path.join(PLACEHOLDER_FILE);
    std::fs::write(&placeholder, placeholder_source(&pool_name)).map_err(|source| {
        StageError::Write {
            path: placeholder.clone(),
            source,
        }
    })?;

    tracing::debug!(pool = %path.display(), "staged pool directory");
    Ok(placeholder)
}
