use poolload::context::{EXTERNAL_ROOTS, RELATIVE_ROOTS};
use poolload::{sanitize_package_name, BuildContext};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Directory of a project holding the package whose imports select the modules.
pub const CONFIG_DIR: &str = "config";

/// Default pool location, relative to the framework root.
pub const DEFAULT_POOL_DIR: &str = "pool";

/// Pool directories the pipeline refuses to stage
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolDirError {
    /// Empty, absolute, or not valid unicode
    #[error("pool directory must be a relative path below the framework root, got {0:?}")]
    NotRelative(PathBuf),

    /// A segment is `.`, `..` or not an identifier
    #[error("pool directory segment `{segment}` of {path:?} is not a package identifier")]
    Segment {
        /// Full pool directory
        path: PathBuf,
        /// Offending segment
        segment: String,
    },
}

/// Check that `pool_dir` names a package directory strictly below the root.
///
/// Every segment must be an identifier so the pool has an import path, and
/// the first one may not shadow `std`, `core`, `alloc`, `self`, `crate` or
/// `super`.
pub fn validate_pool_dir(pool_dir: &Path) -> Result<(), PoolDirError> {
    let not_relative = || PoolDirError::NotRelative(pool_dir.to_path_buf());
    if pool_dir.has_root() || pool_dir.is_absolute() || pool_dir.components().next().is_none() {
        return Err(not_relative());
    }
    let text = pool_dir.to_str().ok_or_else(not_relative)?;

    let segments = text.split(['/', '\\']).filter(|segment| !segment.is_empty());
    for (i, segment) in segments.enumerate() {
        let reserved = i == 0
            && (EXTERNAL_ROOTS.contains(&segment) || RELATIVE_ROOTS.contains(&segment));
        if reserved || !is_identifier(segment) {
            return Err(PoolDirError::Segment {
                path: pool_dir.to_path_buf(),
                segment: segment.to_string(),
            });
        }
    }
    Ok(())
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    segment != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Inputs of one generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    /// Project directory; its `config` package lists the modules to load.
    pub project_dir: PathBuf,
    /// Module to generate for in isolation; overrides `project_dir`.
    pub test_module: Option<PathBuf>,
    /// Only reset the pool to its placeholder.
    pub empty_pool: bool,
    /// Framework root, first source root and parent of the pool.
    pub framework_root: PathBuf,
    /// Pool directory, relative to the framework root.
    pub pool_dir: PathBuf,
    /// Extra source roots searched after the framework root.
    pub source_roots: Vec<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            test_module: None,
            empty_pool: false,
            framework_root: PathBuf::from("."),
            pool_dir: PathBuf::from(DEFAULT_POOL_DIR),
            source_roots: Vec::new(),
        }
    }
}

impl GenerationConfig {
    /// Create a config for a framework root with default settings.
    pub fn new(framework_root: impl Into<PathBuf>) -> Self {
        Self {
            framework_root: framework_root.into(),
            ..Self::default()
        }
    }

    /// Reject a pool directory that cannot be staged safely.
    pub fn validate(&self) -> Result<(), PoolDirError> {
        validate_pool_dir(&self.pool_dir)
    }

    /// Absolute location of the pool package.
    pub fn pool_path(&self) -> PathBuf {
        self.framework_root.join(&self.pool_dir)
    }

    /// Package name written into the pool placeholder.
    pub fn pool_name(&self) -> String {
        let last = self
            .pool_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        sanitize_package_name(&last)
    }

    /// Import path of the pool package.
    pub fn pool_import_path(&self) -> String {
        self.pool_dir
            .components()
            .filter_map(|component| match component {
                Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("::")
    }

    /// Build context over the framework root and extra source roots.
    pub fn build_context(&self) -> BuildContext {
        BuildContext::new(&self.framework_root).with_source_roots(&self.source_roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_targets_current_dir() {
        let config = GenerationConfig::default();
        assert_eq!(config.project_dir, PathBuf::from("."));
        assert_eq!(config.pool_dir, PathBuf::from("pool"));
        assert!(!config.empty_pool);
    }

    #[test]
    fn pool_identity_follows_pool_dir() {
        let mut config = GenerationConfig::new("/framework");
        config.pool_dir = PathBuf::from("generated/model_pool");
        assert!(config.validate().is_ok());
        assert_eq!(config.pool_path(), PathBuf::from("/framework/generated/model_pool"));
        assert_eq!(config.pool_name(), "model_pool");
        assert_eq!(config.pool_import_path(), "generated::model_pool");
    }

    #[rstest]
    #[case("pool")]
    #[case("generated/pool")]
    #[case("gen/pool_2/")]
    fn valid_pool_dirs(#[case] pool_dir: &str) {
        assert_eq!(validate_pool_dir(Path::new(pool_dir)), Ok(()));
    }

    #[rstest]
    #[case(".")]
    #[case("./")]
    #[case("a/./b")]
    #[case("a/../b")]
    #[case("model-pool")]
    #[case("2pool")]
    #[case("std")]
    #[case("crate/pool")]
    fn invalid_pool_segments(#[case] pool_dir: &str) {
        assert!(matches!(
            validate_pool_dir(Path::new(pool_dir)),
            Err(PoolDirError::Segment { .. })
        ));
    }

    #[test]
    fn pool_dir_must_be_relative() {
        assert!(matches!(
            validate_pool_dir(Path::new("")),
            Err(PoolDirError::NotRelative(_))
        ));
        assert!(matches!(
            validate_pool_dir(Path::new("/var/pool")),
            Err(PoolDirError::NotRelative(_))
        ));
    }
}
