// Core types for declaration extraction

use crate::types::TypeExpr;
use serde::{Deserialize, Serialize};

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during parsing
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to parse the source code
    #[error("Failed to parse source: {0}")]
    ParseFailed(String),

    /// The grammar could not be installed into the parser
    #[error("Failed to load grammar: {0}")]
    Grammar(String),

    /// Input/Output error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A syntax error reported by the grammar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line of the offending node
    pub line: usize,
    /// 1-based column of the offending node
    pub column: usize,
    /// Human-readable description
    pub message: String,
}

/// An outer or inner attribute, split into its name and raw arguments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute path, e.g. `model` or `serde::rename`
    pub name: String,
    /// Text between the parentheses, if any
    pub args: Option<String>,
}

impl Attribute {
    /// Parse the text of `#[...]` or `#![...]`.
    pub fn from_source(text: &str) -> Option<Self> {
        let inner = text
            .trim()
            .strip_prefix("#!")
            .or_else(|| text.trim().strip_prefix('#'))?
            .trim()
            .strip_prefix('[')?
            .strip_suffix(']')?
            .trim();

        let (name, args) = match inner.find(|c| c == '(' || c == '=') {
            Some(idx) if inner[idx..].starts_with('(') => {
                let args = inner[idx + 1..].trim_end().strip_suffix(')')?;
                (&inner[..idx], Some(args.trim().to_string()))
            }
            Some(idx) => (&inner[..idx], Some(inner[idx + 1..].trim().to_string())),
            None => (inner, None),
        };

        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            args,
        })
    }
}

/// One flattened entry of a `use` tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UseEntry {
    /// Path segments, e.g. `["modules", "sale", "Order"]`
    pub path: Vec<String>,
    /// `as` alias if present
    pub alias: Option<String>,
    /// True for `path::*`
    pub glob: bool,
    /// 1-based line of the `use` declaration
    pub line: usize,
}

impl UseEntry {
    /// Name this entry binds in the file scope (None for globs).
    pub fn binding_name(&self) -> Option<&str> {
        if self.glob {
            return None;
        }
        self.alias
            .as_deref()
            .or_else(|| self.path.last().map(String::as_str))
    }

    /// Path rendered with `::`.
    pub fn display_path(&self) -> String {
        let mut out = self.path.join("::");
        if self.glob {
            out.push_str("::*");
        }
        out
    }
}

/// A named field of a struct or struct-like variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeExpr,
    /// Doc comment lines
    pub docs: Vec<String>,
    /// 1-based line
    pub line: usize,
}

/// Field layout of a struct or variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Fields {
    /// `{ a: A, b: B }`
    Named(Vec<Field>),
    /// `(A, B)`
    Tuple(Vec<TypeExpr>),
    /// No body
    Unit,
}

impl Fields {
    /// Every type mentioned by the fields.
    pub fn types(&self) -> Vec<&TypeExpr> {
        match self {
            Fields::Named(fields) => fields.iter().map(|f| &f.ty).collect(),
            Fields::Tuple(types) => types.iter().collect(),
            Fields::Unit => Vec::new(),
        }
    }
}

/// Enum variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    /// Variant name
    pub name: String,
    /// Variant payload
    pub fields: Fields,
}

/// Function or method signature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FnSignature {
    /// Function generics
    pub generics: Vec<String>,
    /// Parameter types (self parameters excluded)
    pub params: Vec<TypeExpr>,
    /// Return type, if any
    pub output: Option<TypeExpr>,
}

/// Item kinds the loader cares about
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ItemKind {
    /// `struct`
    Struct(Fields),
    /// `enum`
    Enum(Vec<Variant>),
    /// `union`
    Union,
    /// `type X = ...;`
    TypeAlias(TypeExpr),
    /// `trait`
    Trait,
    /// `fn`
    Function(FnSignature),
    /// `const`
    Const(TypeExpr),
    /// `static`
    Static(TypeExpr),
    /// `mod`
    Module,
    /// `macro_rules!`
    Macro,
}

impl ItemKind {
    /// Short keyword used in diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            ItemKind::Struct(_) => "struct",
            ItemKind::Enum(_) => "enum",
            ItemKind::Union => "union",
            ItemKind::TypeAlias(_) => "type",
            ItemKind::Trait => "trait",
            ItemKind::Function(_) => "fn",
            ItemKind::Const(_) => "const",
            ItemKind::Static(_) => "static",
            ItemKind::Module => "mod",
            ItemKind::Macro => "macro",
        }
    }

    /// True for items that name a type.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            ItemKind::Struct(_)
                | ItemKind::Enum(_)
                | ItemKind::Union
                | ItemKind::TypeAlias(_)
                | ItemKind::Trait
        )
    }
}

/// A named top-level item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    /// Item name
    pub name: String,
    /// Kind and payload
    pub kind: ItemKind,
    /// Generic type parameters (lifetimes excluded)
    pub generics: Vec<String>,
    /// Outer attributes
    pub attributes: Vec<Attribute>,
    /// Doc comment lines
    pub docs: Vec<String>,
    /// Declared `pub` (any form)
    pub public: bool,
    /// 1-based line
    pub line: usize,
}

impl Item {
    /// True when the item carries `#[model]`.
    pub fn is_model(&self) -> bool {
        matches!(self.kind, ItemKind::Struct(_))
            && self
                .attributes
                .iter()
                .any(|attr| attr.name == crate::MODEL_ATTRIBUTE)
    }
}

/// Member of an `impl` block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ImplMember {
    /// Method or associated function
    Function {
        /// Name
        name: String,
        /// Signature
        signature: FnSignature,
        /// 1-based line
        line: usize,
    },
    /// Associated const
    Const {
        /// Name
        name: String,
        /// Declared type
        ty: TypeExpr,
        /// 1-based line
        line: usize,
    },
    /// Associated type with a value
    Type {
        /// Name
        name: String,
        /// Target type
        ty: TypeExpr,
        /// 1-based line
        line: usize,
    },
}

/// `impl [Trait for] Type { ... }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImplBlock {
    /// impl generics
    pub generics: Vec<String>,
    /// Implemented trait, if any
    pub trait_ref: Option<TypeExpr>,
    /// Self type
    pub self_ty: TypeExpr,
    /// Members
    pub members: Vec<ImplMember>,
    /// 1-based line
    pub line: usize,
}

/// Everything extracted from a single source file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceUnit {
    /// Name declared by `#![package(name)]`
    pub package: Option<String>,
    /// Inner attributes of the file
    pub inner_attributes: Vec<Attribute>,
    /// Flattened use entries in source order
    pub uses: Vec<UseEntry>,
    /// Named top-level items in source order
    pub items: Vec<Item>,
    /// impl blocks in source order
    pub impls: Vec<ImplBlock>,
    /// Grammar errors; empty for a well-formed file
    pub syntax_errors: Vec<SyntaxError>,
}

impl SourceUnit {
    /// True when the grammar reported no error.
    pub fn is_well_formed(&self) -> bool {
        self.syntax_errors.is_empty()
    }

    /// Items marked as model fragments.
    pub fn models(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_model())
    }
}
