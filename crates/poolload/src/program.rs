// Typed program: loaded packages, resolved model fragments and diagnostics

use crate::context::SourceFile;
use crate::diagnostics::Diagnostic;
use crate::loader::LoadMode;
use poolparse::types::{write_args, write_tuple};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Ordered list of package import paths to load.
///
/// Order is significant and duplicates are kept as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSet(Vec<String>);

impl ImportSet {
    /// Append an import path
    pub fn push(&mut self, path: impl Into<String>) {
        self.0.push(path.into());
    }

    /// True when nothing is listed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when `path` is listed
    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Entries as a slice
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for ImportSet {
    fn from(paths: Vec<String>) -> Self {
        Self(paths)
    }
}

impl<S: Into<String>> FromIterator<S> for ImportSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ImportSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

/// What a path in a signature resolved to
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub enum TypeTarget {
    /// Primitive or prelude name
    Builtin(String),
    /// Generic parameter or `Self`, possibly with associated segments
    Generic(String),
    /// Type declared by a loaded package
    Declared {
        /// Package import path
        package: String,
        /// Type name
        name: String,
    },
    /// Standard library path, segments as written after import expansion
    External(Vec<String>),
    /// Resolution failed; a diagnostic was recorded
    Unresolved(Vec<String>),
}

/// Type expression with every path resolved
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub enum ResolvedType {
    /// Resolved path with generic arguments
    Path {
        /// Target of the path
        target: TypeTarget,
        /// Generic arguments
        args: Vec<ResolvedType>,
    },
    /// `&'a mut T`
    Reference {
        /// Lifetime, without the quote
        lifetime: Option<String>,
        /// `mut` reference
        mutable: bool,
        /// Referenced type
        inner: Box<ResolvedType>,
    },
    /// `[T]`
    Slice(Box<ResolvedType>),
    /// `[T; N]`
    Array {
        /// Element type
        element: Box<ResolvedType>,
        /// Length expression
        length: String,
    },
    /// `(A, B)`
    Tuple(Vec<ResolvedType>),
    /// `dyn Trait` / `impl Trait`
    TraitObject {
        /// `dyn` or `impl`
        keyword: String,
        /// Trait bound
        bound: Box<ResolvedType>,
    },
    /// Kept verbatim
    Opaque(String),
}

impl ResolvedType {
    /// Visit every resolved path target, outermost first
    pub fn walk_targets<'a>(&'a self, visit: &mut dyn FnMut(&'a TypeTarget)) {
        match self {
            ResolvedType::Path { target, args } => {
                visit(target);
                for arg in args {
                    arg.walk_targets(visit);
                }
            }
            ResolvedType::Reference { inner, .. } | ResolvedType::Slice(inner) => {
                inner.walk_targets(visit)
            }
            ResolvedType::Array { element, .. } => element.walk_targets(visit),
            ResolvedType::Tuple(elements) => {
                for element in elements {
                    element.walk_targets(visit);
                }
            }
            ResolvedType::TraitObject { bound, .. } => bound.walk_targets(visit),
            ResolvedType::Opaque(_) => {}
        }
    }
}

impl fmt::Display for TypeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTarget::Builtin(name) | TypeTarget::Generic(name) => write!(f, "{}", name),
            TypeTarget::Declared { package, name } => write!(f, "{}::{}", package, name),
            TypeTarget::External(path) | TypeTarget::Unresolved(path) => {
                write!(f, "{}", path.join("::"))
            }
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Path { target, args } => {
                write!(f, "{}", target)?;
                write_args(f, args)
            }
            ResolvedType::Reference {
                lifetime,
                mutable,
                inner,
            } => {
                write!(f, "&")?;
                if let Some(lifetime) = lifetime {
                    write!(f, "'{} ", lifetime)?;
                }
                if *mutable {
                    write!(f, "mut ")?;
                }
                write!(f, "{}", inner)
            }
            ResolvedType::Slice(inner) => write!(f, "[{}]", inner),
            ResolvedType::Array { element, length } => write!(f, "[{}; {}]", element, length),
            ResolvedType::Tuple(elements) => write_tuple(f, elements),
            ResolvedType::TraitObject { keyword, bound } => write!(f, "{} {}", keyword, bound),
            ResolvedType::Opaque(text) => write!(f, "{}", text),
        }
    }
}

/// A field of a model fragment
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedField {
    /// Field name
    pub name: String,
    /// Resolved type
    pub ty: ResolvedType,
    /// Doc comment lines
    pub docs: Vec<String>,
    /// 1-based line
    pub line: usize,
}

/// Shape of a model fragment's body
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum FragmentShape {
    /// `struct X { .. }`
    Named,
    /// `struct X(..);`
    Tuple,
    /// `struct X;`
    Unit,
}

/// One `#[model]` struct as declared by one package
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelFragment {
    /// Model name
    pub name: String,
    /// Doc comment lines
    pub docs: Vec<String>,
    /// Generic parameters
    pub generics: Vec<String>,
    /// Body shape
    pub shape: FragmentShape,
    /// Fields, empty unless the shape is [`FragmentShape::Named`]
    pub fields: Vec<ResolvedField>,
    /// Declaring file
    pub file: PathBuf,
    /// 1-based line
    pub line: usize,
}

/// A loaded package
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    /// Package name
    pub name: String,
    /// Import path
    pub import_path: String,
    /// Package directory
    pub dir: PathBuf,
    /// Parsed files in file-name order
    pub files: Vec<SourceFile>,
    /// Declared imports
    pub imports: Vec<String>,
    /// Model fragments in file then source order
    pub models: Vec<ModelFragment>,
}

/// Result of one load: packages, dependencies first, plus diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct TypedProgram {
    /// Mode the program was loaded in
    pub mode: LoadMode,
    /// Import set the load started from
    pub imports: ImportSet,
    /// Packages in load order
    pub packages: Vec<Package>,
    /// Diagnostics in load order
    pub diagnostics: Vec<Diagnostic>,
}

impl TypedProgram {
    /// Look up a loaded package by import path
    pub fn package(&self, import_path: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.import_path == import_path)
    }

    /// True when any diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Every model fragment with its package, in load order
    pub fn fragments(&self) -> impl Iterator<Item = (&Package, &ModelFragment)> {
        self.packages
            .iter()
            .flat_map(|package| package.models.iter().map(move |model| (package, model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_set_keeps_order_and_duplicates() {
        let set: ImportSet = ["b", "a", "b"].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert!(set.contains("a"));
        assert_eq!(set.to_string(), "b, a, b");
    }

    #[test]
    fn resolved_type_display() {
        let ty = ResolvedType::Path {
            target: TypeTarget::Builtin("Option".into()),
            args: vec![ResolvedType::Path {
                target: TypeTarget::Declared {
                    package: "modules::base".into(),
                    name: "Partner".into(),
                },
                args: vec![],
            }],
        };
        assert_eq!(ty.to_string(), "Option<modules::base::Partner>");

        let mut targets = Vec::new();
        ty.walk_targets(&mut |target| targets.push(target.to_string()));
        assert_eq!(targets, vec!["Option", "modules::base::Partner"]);
    }
}
