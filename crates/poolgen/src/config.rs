// Framework Configuration
//
// poolgen.toml settings and framework root detection

use crate::errors::{PoolgenError, Result as PoolgenResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name, looked up at the framework root
pub const CONFIG_FILE: &str = "poolgen.toml";

/// Environment variable naming the framework root
pub const ROOT_ENV: &str = "POOLGEN_ROOT";

/// Framework configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PoolgenConfig {
    /// Generation settings
    pub generate: GenerateConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// `[generate]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerateConfig {
    /// Pool directory, relative to the framework root
    pub pool_dir: PathBuf,

    /// Extra source roots, searched after the framework root
    pub source_roots: Vec<PathBuf>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            pool_dir: PathBuf::from(poolphase::DEFAULT_POOL_DIR),
            source_roots: Vec::new(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl PoolgenConfig {
    /// Load configuration from a framework root
    ///
    /// Looks for `poolgen.toml` in `root`; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let config_path = root.as_ref().join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(PoolgenConfig::default());
        }

        Self::load_file(&config_path)
    }

    /// Load configuration from an explicit file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: PoolgenConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot honor
    pub fn validate(&self) -> PoolgenResult<()> {
        poolphase::validate_pool_dir(&self.generate.pool_dir).map_err(|err| {
            PoolgenError::config_error(
                err.to_string(),
                Some(
                    "Set [generate] pool_dir to identifier segments below the framework root, e.g. \"pool\"."
                        .to_string(),
                ),
            )
        })
    }
}

/// Find the framework root.
///
/// Precedence: the explicit `--root`, then `POOLGEN_ROOT`, then the nearest
/// ancestor of `start` holding `poolgen.toml`.
pub fn detect_framework_root(
    explicit: Option<&Path>,
    env_root: Option<PathBuf>,
    start: &Path,
) -> PoolgenResult<PathBuf> {
    if let Some(root) = explicit {
        return existing_dir(root, "--root");
    }
    if let Some(root) = env_root.filter(|root| !root.as_os_str().is_empty()) {
        return existing_dir(&root, ROOT_ENV);
    }

    let start = fs::canonicalize(start).map_err(|source| PoolgenError::Io {
        context: "Failed to resolve the starting directory".to_string(),
        path: Some(start.to_path_buf()),
        source,
    })?;
    let found = start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf);

    found.ok_or_else(|| {
        PoolgenError::config_error(
            format!("no {} found in {} or any parent directory", CONFIG_FILE, start.display()),
            Some(format!(
                "Create {} at the framework root, set {} or pass --root.",
                CONFIG_FILE, ROOT_ENV
            )),
        )
    })
}

fn existing_dir(root: &Path, source_name: &str) -> PoolgenResult<PathBuf> {
    match fs::canonicalize(root) {
        Ok(path) if path.is_dir() => Ok(path),
        _ => Err(PoolgenError::config_error(
            format!("framework root from {} is not a directory: {}", source_name, root.display()),
            Some("Point it at the directory that contains the pool and the modules.".to_string()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = PoolgenConfig::default();
        assert_eq!(config.generate.pool_dir, PathBuf::from("pool"));
        assert!(config.generate.source_roots.is_empty());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let config = PoolgenConfig::load(dir.path()).expect("load");
        assert_eq!(config, PoolgenConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[generate]\nsource_roots = [\"addons\"]\n",
        )
        .expect("write");

        let config = PoolgenConfig::load(dir.path()).expect("load");
        assert_eq!(config.generate.pool_dir, PathBuf::from("pool"));
        assert_eq!(config.generate.source_roots, vec![PathBuf::from("addons")]);
        assert_eq!(config.logging.level, "warn");
    }

    #[rstest]
    #[case("../pool")]
    #[case(".")]
    #[case("./")]
    #[case("a/./b")]
    #[case("model-pool")]
    fn test_invalid_pool_dir_is_rejected(#[case] pool_dir: &str) {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CONFIG_FILE),
            format!("[generate]\npool_dir = \"{}\"\n", pool_dir),
        )
        .expect("write");
        assert!(PoolgenConfig::load(dir.path()).is_err());

        let mut config = PoolgenConfig::default();
        config.generate.pool_dir = PathBuf::from(pool_dir);
        let err = config.validate().expect_err("invalid pool_dir");
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_root_precedence() {
        let explicit = tempdir().expect("tempdir");
        let env = tempdir().expect("tempdir");
        let detected = tempdir().expect("tempdir");
        fs::write(detected.path().join(CONFIG_FILE), "").expect("write");
        let nested = detected.path().join("project").join("config");
        fs::create_dir_all(&nested).expect("mkdir");

        let root = detect_framework_root(
            Some(explicit.path()),
            Some(env.path().to_path_buf()),
            &nested,
        )
        .expect("explicit");
        assert_eq!(root, fs::canonicalize(explicit.path()).expect("canon"));

        let root = detect_framework_root(None, Some(env.path().to_path_buf()), &nested)
            .expect("env");
        assert_eq!(root, fs::canonicalize(env.path()).expect("canon"));

        let root = detect_framework_root(None, None, &nested).expect("detected");
        assert_eq!(root, fs::canonicalize(detected.path()).expect("canon"));
    }

    #[test]
    fn test_missing_root_has_suggestion() {
        let dir = tempdir().expect("tempdir");
        let err = detect_framework_root(None, None, dir.path()).expect_err("no root");
        assert!(err.suggestion().is_some());
    }
}
