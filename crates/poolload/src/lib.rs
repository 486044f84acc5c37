// poolload - Package Loading and Checking
//
// Finds packages under the source roots, loads an import set depth-first and
// checks every item signature, producing a typed program with the resolved
// model fragments.

#![warn(missing_docs)]

/// Source roots, package discovery and use classification.
pub mod context;

/// Diagnostics and loader errors.
pub mod diagnostics;

/// Depth-first loader.
pub mod loader;

/// Typed program model.
pub mod program;

mod check;

pub use context::{
    sanitize_package_name, BuildContext, PackageError, PackageInfo, SourceFile, UseTarget,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, LoadError};
pub use loader::{LoadMode, Loader};
pub use program::{
    FragmentShape, ImportSet, ModelFragment, Package, ResolvedField, ResolvedType, TypeTarget,
    TypedProgram,
};
