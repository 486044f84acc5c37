// Program loader: depth-first package loading in tolerant or strict mode

use crate::check::{Checker, Declarations};
use crate::context::{BuildContext, PackageError, PackageInfo};
use crate::diagnostics::{Diagnostic, DiagnosticKind, LoadError};
use crate::program::{ImportSet, Package, TypedProgram};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// How the loader treats diagnostics
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum LoadMode {
    /// Record diagnostics and return the program anyway
    Tolerant,
    /// Fail on the first load that records any diagnostic
    Strict,
}

#[derive(Default)]
struct Walk {
    visited: HashSet<String>,
    loaded: Vec<(String, PackageInfo)>,
    diagnostics: Vec<Diagnostic>,
}

/// A package whose dependencies are still being walked
struct Frame {
    path: String,
    info: PackageInfo,
    next: usize,
}

/// Loads an import set and everything it reaches.
///
/// Packages are visited depth-first in import order and emitted dependencies
/// first. Import cycles are allowed: a package already visited is skipped, so
/// the package that closes a cycle is emitted before the one that opened it.
/// A package that cannot be read is recorded as a diagnostic and skipped.
pub struct Loader<'a> {
    context: &'a BuildContext,
}

impl<'a> Loader<'a> {
    /// Create a loader over a build context
    pub fn new(context: &'a BuildContext) -> Self {
        Self { context }
    }

    /// Load `imports` and check every reachable package
    pub fn load(&self, imports: &ImportSet, mode: LoadMode) -> Result<TypedProgram, LoadError> {
        if imports.is_empty() {
            return Err(LoadError::NoPackages);
        }

        let mut walk = Walk::default();
        for path in imports.iter() {
            self.visit(path.trim(), &mut walk);
        }

        let Walk {
            loaded,
            mut diagnostics,
            ..
        } = walk;

        let mut declarations = HashMap::new();
        for (path, info) in &loaded {
            declarations.insert(
                path.clone(),
                Declarations::index(info, path, &mut diagnostics),
            );
        }

        let mut packages = Vec::with_capacity(loaded.len());
        {
            let mut checker = Checker::new(self.context, &declarations, &mut diagnostics);
            for (path, info) in loaded {
                let models = checker.check_package(&path, &info);
                packages.push(Package {
                    name: info.name,
                    import_path: path,
                    dir: info.dir,
                    files: info.files,
                    imports: info.imports,
                    models,
                });
            }
        }

        tracing::debug!(
            ?mode,
            packages = packages.len(),
            diagnostics = diagnostics.len(),
            "program loaded"
        );

        if mode == LoadMode::Strict && !diagnostics.is_empty() {
            return Err(LoadError::Strict { diagnostics });
        }

        Ok(TypedProgram {
            mode,
            imports: imports.clone(),
            packages,
            diagnostics,
        })
    }

    fn visit(&self, root: &str, walk: &mut Walk) {
        let Some(frame) = self.enter(root, true, walk) else {
            return;
        };
        let mut stack = vec![frame];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => {
                    let dependency = frame.info.imports.get(frame.next).cloned();
                    frame.next += 1;
                    dependency
                }
                None => break,
            };

            match next {
                Some(dependency) => {
                    if let Some(frame) = self.enter(&dependency, false, walk) {
                        stack.push(frame);
                    }
                }
                None => {
                    if let Some(done) = stack.pop() {
                        walk.loaded.push((done.path, done.info));
                    }
                }
            }
        }
    }

    /// Mark `path` visited and read it; None when it was seen or cannot be loaded
    fn enter(&self, path: &str, initial: bool, walk: &mut Walk) -> Option<Frame> {
        if !walk.visited.insert(path.to_string()) {
            return None;
        }

        let Some(dir) = self.context.find_package(path) else {
            // Use sites of a missing dependency are reported by the checker.
            if initial {
                walk.diagnostics.push(Diagnostic::package(
                    DiagnosticKind::MissingPackage,
                    path,
                    format!("cannot find package `{}` in any source root", path),
                ));
            }
            return None;
        };

        let info = match self.context.read_package(&dir) {
            Ok(info) => info,
            Err(err) => {
                let diagnostic =
                    Diagnostic::package(DiagnosticKind::Unreadable, path, err.to_string());
                walk.diagnostics.push(match err {
                    PackageError::Io { path: file, .. } => diagnostic.at(file, 0),
                    _ => diagnostic,
                });
                return None;
            }
        };
        tracing::debug!(package = path, files = info.files.len(), "loading package");

        for file in &info.files {
            for error in &file.unit.syntax_errors {
                walk.diagnostics.push(
                    Diagnostic::package(
                        DiagnosticKind::Syntax,
                        path,
                        format!("syntax error at column {}: {}", error.column, error.message),
                    )
                    .at(&file.path, error.line),
                );
            }
        }

        if let [first, rest @ ..] = info.declared_names.as_slice() {
            for other in rest {
                walk.diagnostics.push(Diagnostic::package(
                    DiagnosticKind::PackageName,
                    path,
                    format!("found packages {} and {} in {}", first, other, info.dir.display()),
                ));
            }
        }

        Some(Frame {
            path: path.to_string(),
            info,
            next: 0,
        })
    }
}
