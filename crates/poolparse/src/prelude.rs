// Prelude module - common imports for convenience

pub use crate::grammar::{is_source_path, language, new_parser};
pub use crate::rust::{parse_source, SourceParser};
pub use crate::traits::{
    Attribute, Error, Field, Fields, FnSignature, ImplBlock, ImplMember, Item, ItemKind, Result,
    SourceUnit, SyntaxError, UseEntry, Variant,
};
pub use crate::types::TypeExpr;
