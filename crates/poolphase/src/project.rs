// Project resolution: target package and import set

use crate::options::{GenerationConfig, CONFIG_DIR};
use poolload::{BuildContext, ImportSet, PackageError};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving what to load
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The working directory was needed and unavailable
    #[error("cannot resolve target directory {}: {source}", .path.display())]
    TargetDir {
        /// Relative path being resolved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A test module must live under a source root to have an import path
    #[error("module {} is not under any source root", .0.display())]
    OutsideRoots(PathBuf),

    /// The target directory is not an importable package
    #[error("error while importing project: {0}")]
    Package(#[from] PackageError),
}

/// What the run will load
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Directory of the target package
    pub target_dir: PathBuf,
    /// Name of the target package
    pub package: String,
    /// Import paths handed to the loader
    pub imports: ImportSet,
    /// True when a single module is generated in isolation
    pub test_mode: bool,
}

/// Pick the target package and compute the import set.
///
/// In test mode the import set is the module's own import path; otherwise it
/// is the declared imports of `<project_dir>/config`, in declaration order.
pub fn resolve(
    config: &GenerationConfig,
    context: &BuildContext,
) -> Result<Resolution, ResolveError> {
    let (target_dir, test_mode) = match &config.test_module {
        Some(module) => (absolute(module)?, true),
        None => (config.project_dir.join(CONFIG_DIR), false),
    };
    tracing::debug!(target = %target_dir.display(), test_mode, "resolving project");

    let info = context.import_dir(&target_dir)?;

    let imports = if test_mode {
        let import_path = info
            .import_path
            .clone()
            .ok_or_else(|| ResolveError::OutsideRoots(info.dir.clone()))?;
        ImportSet::from(vec![import_path])
    } else {
        ImportSet::from(info.imports.clone())
    };

    Ok(Resolution {
        target_dir: info.dir,
        package: info.name,
        imports,
        test_mode,
    })
}

fn absolute(path: &std::path::Path) -> Result<PathBuf, ResolveError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| ResolveError::TargetDir {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, content).expect("write");
    }

    #[test]
    fn normal_mode_uses_config_imports() {
        let framework = tempdir().expect("tempdir");
        write(framework.path(), "modules/base/a.rs", "pub struct A;");
        write(framework.path(), "modules/sale/b.rs", "pub struct B;");

        let project = tempdir().expect("tempdir");
        write(
            project.path(),
            "config/imports.rs",
            "#![package(config)]\nuse modules::sale;\nuse modules::base;\n",
        );

        let mut config = GenerationConfig::new(framework.path());
        config.project_dir = project.path().to_path_buf();
        let resolution = resolve(&config, &config.build_context()).expect("resolve");

        assert!(!resolution.test_mode);
        assert_eq!(resolution.package, "config");
        assert_eq!(
            resolution.imports.as_slice(),
            &["modules::sale".to_string(), "modules::base".to_string()]
        );
    }

    #[test]
    fn test_mode_loads_only_the_module() {
        let framework = tempdir().expect("tempdir");
        write(framework.path(), "modules/base/a.rs", "use modules::sale;\npub struct A;");
        write(framework.path(), "modules/sale/b.rs", "pub struct B;");

        let mut config = GenerationConfig::new(framework.path());
        config.test_module = Some(framework.path().join("modules/base"));
        let resolution = resolve(&config, &config.build_context()).expect("resolve");

        assert!(resolution.test_mode);
        assert_eq!(resolution.imports.as_slice(), &["modules::base".to_string()]);
    }

    #[test]
    fn test_mode_requires_a_source_root() {
        let framework = tempdir().expect("tempdir");
        let elsewhere = tempdir().expect("tempdir");
        write(elsewhere.path(), "module/a.rs", "pub struct A;");

        let mut config = GenerationConfig::new(framework.path());
        config.test_module = Some(elsewhere.path().join("module"));
        let result = resolve(&config, &config.build_context());
        assert!(matches!(result, Err(ResolveError::OutsideRoots(_))));
    }

    #[test]
    fn missing_config_package_is_fatal() {
        let framework = tempdir().expect("tempdir");
        let mut config = GenerationConfig::new(framework.path());
        config.project_dir = framework.path().join("no-such-project");
        let result = resolve(&config, &config.build_context());
        assert!(matches!(
            result,
            Err(ResolveError::Package(PackageError::NotFound(_)))
        ));
    }
}
