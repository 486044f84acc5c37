// poolparse - Module Source Parsing
//
// Turns one module source file into the declarations the loader needs:
// package identity, use entries, items, model fragments and type expressions.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Core parsing types and the crate error.
pub mod traits;

/// Lazily built tree-sitter grammar.
pub mod grammar;

/// Type expressions and their canonical rendering.
pub mod types;

/// Source-file extraction on top of the tree-sitter Rust grammar.
pub mod rust;

/// Re-exports of commonly used types.
pub mod prelude;

/// Test suite for poolparse.
#[cfg(test)]
mod tests;

pub use rust::{parse_source, SourceParser};
pub use traits::{
    Attribute, Error, Field, Fields, FnSignature, ImplBlock, ImplMember, Item, ItemKind, Result,
    SourceUnit, SyntaxError, UseEntry, Variant,
};
pub use types::TypeExpr;

/// Attribute name that marks a struct as a model fragment.
pub const MODEL_ATTRIBUTE: &str = "model";

/// Inner attribute name that declares a file's package identity.
pub const PACKAGE_ATTRIBUTE: &str = "package";
