// Build context: source roots, package discovery and import classification

use poolparse::grammar::is_source_path;
use poolparse::{SourceParser, SourceUnit, UseEntry};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Path roots that are never resolved against source roots.
pub const EXTERNAL_ROOTS: &[&str] = &["std", "core", "alloc"];

/// Relative path keywords that module imports may not use.
pub const RELATIVE_ROOTS: &[&str] = &["self", "crate", "super"];

/// Errors raised while reading a single package directory
#[derive(Debug, Error)]
pub enum PackageError {
    /// The directory does not exist
    #[error("cannot find package directory {}", .0.display())]
    NotFound(PathBuf),

    /// The directory holds no buildable source file
    #[error("no buildable source files in {}", .0.display())]
    NoSources(PathBuf),

    /// A file failed to parse cleanly
    #[error("{}:{line}:{column}: syntax error: {message}", .path.display())]
    Syntax {
        /// File with the error
        path: PathBuf,
        /// 1-based line
        line: usize,
        /// 1-based column
        column: usize,
        /// Grammar message
        message: String,
    },

    /// Files of one directory declare different package names
    #[error("found packages {first} and {second} in {}", .dir.display())]
    ConflictingNames {
        /// Package directory
        dir: PathBuf,
        /// First declared name
        first: String,
        /// Conflicting name
        second: String,
    },

    /// Reading a file or directory failed
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The parser itself failed
    #[error(transparent)]
    Parse(#[from] poolparse::Error),
}

/// Where a flattened `use` entry points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseTarget {
    /// The whole path names a package
    Package {
        /// Package import path
        path: String,
    },
    /// An item declared by a package
    Item {
        /// Package import path
        package: String,
        /// Item name
        name: String,
    },
    /// `pkg::*`
    Glob {
        /// Package import path
        package: String,
    },
    /// Standard library path, not checked
    External,
    /// `self::`, `crate::` or `super::` path
    Unsupported,
    /// Nothing under the source roots matches
    Unresolved,
}

impl UseTarget {
    /// Package import path this target depends on, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            UseTarget::Package { path } => Some(path),
            UseTarget::Item { package, .. } | UseTarget::Glob { package } => Some(package),
            _ => None,
        }
    }
}

/// One parsed source file of a package
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    /// Absolute file path
    pub path: PathBuf,
    /// Extracted declarations
    pub unit: SourceUnit,
}

/// A package directory read from disk
#[derive(Debug, Clone, Serialize)]
pub struct PackageInfo {
    /// Package name (declared, or the sanitized directory name)
    pub name: String,
    /// Import path when the directory lies under a source root
    pub import_path: Option<String>,
    /// Package directory
    pub dir: PathBuf,
    /// Parsed files in file-name order
    pub files: Vec<SourceFile>,
    /// Distinct names declared with `#![package(..)]`, in file order
    pub declared_names: Vec<String>,
    /// Declared imports, first occurrence first; unresolved entries keep their raw path
    pub imports: Vec<String>,
}

/// Source roots and the rules that map directories to import paths.
///
/// The framework root is always the first root. A directory belongs to the
/// first root that contains it.
#[derive(Debug, Clone)]
pub struct BuildContext {
    roots: Vec<PathBuf>,
}

impl BuildContext {
    /// Create a context rooted at `framework_root`
    pub fn new(framework_root: impl AsRef<Path>) -> Self {
        Self {
            roots: vec![normalize(framework_root.as_ref())],
        }
    }

    /// Add extra source roots; relative roots are taken from the framework root
    pub fn with_source_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for root in roots {
            let root = root.as_ref();
            let absolute = if root.is_absolute() {
                root.to_path_buf()
            } else {
                self.framework_root().join(root)
            };
            let absolute = normalize(&absolute);
            if !self.roots.contains(&absolute) {
                self.roots.push(absolute);
            }
        }
        self
    }

    /// All source roots, framework root first
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// The framework root
    pub fn framework_root(&self) -> &Path {
        &self.roots[0]
    }

    /// Import path of `dir`, relative to the first root containing it.
    ///
    /// A root itself has no import path.
    pub fn import_path_of(&self, dir: &Path) -> Option<String> {
        let dir = normalize(dir);
        self.roots.iter().find_map(|root| {
            let relative = dir.strip_prefix(root).ok()?;
            let segments: Option<Vec<&str>> = relative
                .components()
                .map(|component| component.as_os_str().to_str())
                .collect();
            let segments = segments?;
            if segments.is_empty() {
                None
            } else {
                Some(segments.join("::"))
            }
        })
    }

    /// Directory of the package with the given import path
    pub fn find_package(&self, import_path: &str) -> Option<PathBuf> {
        let segments: Vec<&str> = import_path
            .split("::")
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.is_empty() {
            return None;
        }

        self.roots.iter().find_map(|root| {
            let candidate = segments
                .iter()
                .fold(root.clone(), |path, segment| path.join(segment));
            Self::is_package_dir(&candidate).then_some(candidate)
        })
    }

    /// True when `dir` directly holds at least one buildable source file
    pub fn is_package_dir(dir: &Path) -> bool {
        dir.is_dir()
            && Self::source_files(dir)
                .map(|files| !files.is_empty())
                .unwrap_or(false)
    }

    /// Buildable source files directly inside `dir`, sorted by name.
    ///
    /// Files whose name starts with `.` or `_` are ignored.
    pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>, PackageError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| PackageError::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() || !is_source_path(entry.path()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') || name.starts_with('_') {
                continue;
            }
            files.push(entry.into_path());
        }
        Ok(files)
    }

    /// Classify a flattened `use` entry against the source roots
    pub fn classify_use(&self, entry: &UseEntry) -> UseTarget {
        let Some(first) = entry.path.first() else {
            return UseTarget::Unresolved;
        };
        if EXTERNAL_ROOTS.contains(&first.as_str()) {
            return UseTarget::External;
        }
        if RELATIVE_ROOTS.contains(&first.as_str()) {
            return UseTarget::Unsupported;
        }

        let len = entry.path.len();
        for prefix_len in (1..=len).rev() {
            let prefix = entry.path[..prefix_len].join("::");
            if self.find_package(&prefix).is_none() {
                continue;
            }
            return match (entry.glob, len - prefix_len) {
                (true, 0) => UseTarget::Glob { package: prefix },
                (false, 0) => UseTarget::Package { path: prefix },
                (false, 1) => UseTarget::Item {
                    package: prefix,
                    name: entry.path[len - 1].clone(),
                },
                _ => UseTarget::Unresolved,
            };
        }
        UseTarget::Unresolved
    }

    /// Read and parse every source file of `dir` without judging it.
    ///
    /// Syntax errors stay inside the parsed units and all declared package
    /// names are kept, so the caller decides how strict to be.
    pub fn read_package(&self, dir: &Path) -> Result<PackageInfo, PackageError> {
        if !dir.is_dir() {
            return Err(PackageError::NotFound(dir.to_path_buf()));
        }
        let dir = normalize(dir);

        let paths = Self::source_files(&dir)?;
        if paths.is_empty() {
            return Err(PackageError::NoSources(dir));
        }

        let mut parser = SourceParser::new()?;
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let source = std::fs::read_to_string(&path).map_err(|source| PackageError::Io {
                path: path.clone(),
                source,
            })?;
            let unit = parser.parse(&source)?;
            files.push(SourceFile { path, unit });
        }

        let mut declared_names: Vec<String> = Vec::new();
        for file in &files {
            if let Some(name) = &file.unit.package {
                if !declared_names.contains(name) {
                    declared_names.push(name.clone());
                }
            }
        }

        let import_path = self.import_path_of(&dir);
        let name = declared_names.first().cloned().unwrap_or_else(|| {
            dir.file_name()
                .map(|n| sanitize_package_name(&n.to_string_lossy()))
                .unwrap_or_else(|| "main".to_string())
        });

        let mut seen = HashSet::new();
        let mut imports = Vec::new();
        for entry in files.iter().flat_map(|file| file.unit.uses.iter()) {
            let target = self.classify_use(entry);
            let path = match &target {
                UseTarget::External | UseTarget::Unsupported => continue,
                UseTarget::Unresolved => entry.path.join("::"),
                resolved => match resolved.package() {
                    Some(package) => package.to_string(),
                    None => continue,
                },
            };
            if import_path.as_deref() == Some(path.as_str()) {
                continue;
            }
            if seen.insert(path.clone()) {
                imports.push(path);
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            files = files.len(),
            imports = imports.len(),
            "read package"
        );

        Ok(PackageInfo {
            name,
            import_path,
            dir,
            files,
            declared_names,
            imports,
        })
    }

    /// Import a package directory, failing on anything that keeps it from building
    pub fn import_dir(&self, dir: &Path) -> Result<PackageInfo, PackageError> {
        let info = self.read_package(dir)?;

        for file in &info.files {
            if let Some(error) = file.unit.syntax_errors.first() {
                return Err(PackageError::Syntax {
                    path: file.path.clone(),
                    line: error.line,
                    column: error.column,
                    message: error.message.clone(),
                });
            }
        }

        if let [first, second, ..] = info.declared_names.as_slice() {
            return Err(PackageError::ConflictingNames {
                dir: info.dir.clone(),
                first: first.clone(),
                second: second.clone(),
            });
        }

        Ok(info)
    }
}

/// Turn a directory name into a valid package identifier.
pub fn sanitize_package_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        return "main".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
