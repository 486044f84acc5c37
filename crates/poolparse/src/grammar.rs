// Lazily built grammar shared by every parser instance

use crate::traits::{Error, Result};
use once_cell::sync::Lazy;
use tree_sitter::{Language, Parser};

/// Rust grammar, built on first use and reused for the lifetime of the program.
static RUST_LANGUAGE: Lazy<Language> = Lazy::new(|| tree_sitter_rust::LANGUAGE.into());

/// File extension of module sources.
pub const SOURCE_EXTENSION: &str = "rs";

/// Get the grammar used for module sources.
pub fn language() -> &'static Language {
    &RUST_LANGUAGE
}

/// Create a parser with the module grammar installed.
pub fn new_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(language())
        .map_err(|e| Error::Grammar(e.to_string()))?;
    Ok(parser)
}

/// True when `path` has the module source extension.
pub fn is_source_path(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
        .unwrap_or(false)
}
