// Load diagnostics and loader errors

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Maximum diagnostics rendered in a strict-mode error message.
const MAX_RENDERED: usize = 10;

/// What kind of problem a diagnostic reports
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Grammar error in a source file
    Syntax,
    /// A package directory or one of its files could not be read
    Unreadable,
    /// An import path names no package
    MissingPackage,
    /// Files of a package disagree on its name
    PackageName,
    /// A `use` entry matches nothing under the source roots
    UnresolvedImport,
    /// A `use` entry relies on `self`, `crate` or `super`
    UnsupportedImport,
    /// An item is not declared by the package it is imported from
    MissingItem,
    /// A name is declared or imported twice
    Redeclared,
    /// A type in a signature cannot be resolved
    UndefinedType,
}

/// A single problem found while loading
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// Kind of problem
    pub kind: DiagnosticKind,
    /// Import path (or directory) of the package it was found in
    pub package: String,
    /// File it was found in, if known
    pub file: Option<PathBuf>,
    /// 1-based line, 0 when unknown
    pub line: usize,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic attached to a whole package
    pub fn package(
        kind: DiagnosticKind,
        package: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            package: package.into(),
            file: None,
            line: 0,
            message: message.into(),
        }
    }

    /// Attach a source position
    pub fn at(mut self, file: impl Into<PathBuf>, line: usize) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) if self.line > 0 => {
                write!(f, "{}:{}: {}", file.display(), self.line, self.message)
            }
            Some(file) => write!(f, "{}: {}", file.display(), self.message),
            None => write!(f, "{}: {}", self.package, self.message),
        }
    }
}

/// Errors returned by [`crate::Loader::load`]
#[derive(Debug, Error)]
pub enum LoadError {
    /// Nothing to load
    #[error("no packages to load")]
    NoPackages,

    /// Strict mode found problems
    #[error("{}", render_strict(.diagnostics))]
    Strict {
        /// Every diagnostic, in load order
        diagnostics: Vec<Diagnostic>,
    },
}

fn render_strict(diagnostics: &[Diagnostic]) -> String {
    let mut out = match diagnostics.len() {
        1 => "1 error".to_string(),
        n => format!("{} errors", n),
    };
    for diagnostic in diagnostics.iter().take(MAX_RENDERED) {
        out.push_str("\n  ");
        out.push_str(&diagnostic.to_string());
    }
    if diagnostics.len() > MAX_RENDERED {
        out.push_str(&format!("\n  ... and {} more", diagnostics.len() - MAX_RENDERED));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_prefers_position() {
        let plain = Diagnostic::package(
            DiagnosticKind::MissingPackage,
            "modules::x",
            "cannot find package",
        );
        assert_eq!(plain.to_string(), "modules::x: cannot find package");

        let placed = plain.clone().at("/src/a.rs", 3);
        assert_eq!(placed.to_string(), "/src/a.rs:3: cannot find package");
    }

    #[test]
    fn strict_error_lists_and_truncates() {
        let diagnostics: Vec<_> = (0..12)
            .map(|i| {
                Diagnostic::package(
                    DiagnosticKind::UndefinedType,
                    "pool",
                    format!("undefined type `T{}`", i),
                )
            })
            .collect();
        let message = LoadError::Strict { diagnostics }.to_string();
        assert!(message.starts_with("12 errors"));
        assert!(message.contains("undefined type `T0`"));
        assert!(!message.contains("undefined type `T11`"));
        assert!(message.ends_with("... and 2 more"));
    }
}
