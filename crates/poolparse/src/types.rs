// Type expressions as they appear in item signatures

use serde::{Deserialize, Serialize};
use std::fmt;
use tree_sitter::Node;

/// Structured form of a type written in a signature.
///
/// Only the shapes the checker resolves are modelled; anything else
/// (function pointers, raw pointers, macro invocations) is kept verbatim in
/// [`TypeExpr::Opaque`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// `a::b::Name<Args>`; generic arguments belong to the last segment
    Path {
        /// Path segments
        segments: Vec<String>,
        /// Generic type arguments
        args: Vec<TypeExpr>,
    },
    /// `&'a mut T`
    Reference {
        /// Lifetime, without the quote
        lifetime: Option<String>,
        /// `mut` reference
        mutable: bool,
        /// Referenced type
        inner: Box<TypeExpr>,
    },
    /// `[T]`
    Slice(Box<TypeExpr>),
    /// `[T; N]`
    Array {
        /// Element type
        element: Box<TypeExpr>,
        /// Length expression as written
        length: String,
    },
    /// `(A, B)`; `()` is the empty tuple
    Tuple(Vec<TypeExpr>),
    /// `dyn Trait` / `impl Trait`
    TraitObject {
        /// `dyn` or `impl`
        keyword: String,
        /// Trait bound
        bound: Box<TypeExpr>,
    },
    /// Any other type, as written
    Opaque(String),
}

impl TypeExpr {
    /// Single-segment path with no generic arguments.
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Path {
            segments: vec![name.into()],
            args: Vec::new(),
        }
    }

    /// Build a type expression from a grammar node.
    pub fn from_node(node: Node, source: &[u8]) -> Self {
        match node.kind() {
            "primitive_type" | "type_identifier" => TypeExpr::Path {
                segments: vec![node_text(node, source).trim().to_string()],
                args: Vec::new(),
            },
            "scoped_type_identifier" | "scoped_identifier" | "identifier" => TypeExpr::Path {
                segments: split_path(node_text(node, source)),
                args: Vec::new(),
            },
            "generic_type" => {
                let segments = node
                    .child_by_field_name("type")
                    .map(|base| split_path(node_text(base, source)))
                    .unwrap_or_default();
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|list| type_arguments(list, source))
                    .unwrap_or_default();
                TypeExpr::Path { segments, args }
            }
            "reference_type" => {
                let mut lifetime = None;
                let mut mutable = false;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "lifetime" => {
                            lifetime = Some(
                                node_text(child, source)
                                    .trim_start_matches('\'')
                                    .to_string(),
                            )
                        }
                        "mutable_specifier" => mutable = true,
                        _ => {}
                    }
                }
                match node.child_by_field_name("type") {
                    Some(inner) => TypeExpr::Reference {
                        lifetime,
                        mutable,
                        inner: Box::new(TypeExpr::from_node(inner, source)),
                    },
                    None => TypeExpr::Opaque(node_text(node, source).to_string()),
                }
            }
            "array_type" => {
                let Some(element) = node.child_by_field_name("element") else {
                    return TypeExpr::Opaque(node_text(node, source).to_string());
                };
                let element = Box::new(TypeExpr::from_node(element, source));
                match node.child_by_field_name("length") {
                    Some(length) => TypeExpr::Array {
                        element,
                        length: node_text(length, source).trim().to_string(),
                    },
                    None => TypeExpr::Slice(element),
                }
            }
            "tuple_type" => {
                let mut cursor = node.walk();
                let elements = node
                    .named_children(&mut cursor)
                    .filter(|child| !child.is_extra())
                    .map(|child| TypeExpr::from_node(child, source))
                    .collect();
                TypeExpr::Tuple(elements)
            }
            "unit_type" => TypeExpr::Tuple(Vec::new()),
            "dynamic_type" | "abstract_type" => {
                let keyword = if node.kind() == "dynamic_type" {
                    "dyn"
                } else {
                    "impl"
                };
                match node.child_by_field_name("trait") {
                    Some(bound) => TypeExpr::TraitObject {
                        keyword: keyword.to_string(),
                        bound: Box::new(TypeExpr::from_node(bound, source)),
                    },
                    None => TypeExpr::Opaque(node_text(node, source).to_string()),
                }
            }
            _ => TypeExpr::Opaque(node_text(node, source).trim().to_string()),
        }
    }

    /// Visit every path in the expression, outermost first.
    pub fn walk_paths<'a>(&'a self, visit: &mut dyn FnMut(&'a [String], &'a [TypeExpr])) {
        match self {
            TypeExpr::Path { segments, args } => {
                visit(segments, args);
                for arg in args {
                    arg.walk_paths(visit);
                }
            }
            TypeExpr::Reference { inner, .. } | TypeExpr::Slice(inner) => inner.walk_paths(visit),
            TypeExpr::Array { element, .. } => element.walk_paths(visit),
            TypeExpr::Tuple(elements) => {
                for element in elements {
                    element.walk_paths(visit);
                }
            }
            TypeExpr::TraitObject { bound, .. } => bound.walk_paths(visit),
            TypeExpr::Opaque(_) => {}
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Path { segments, args } => {
                write!(f, "{}", segments.join("::"))?;
                write_args(f, args)
            }
            TypeExpr::Reference {
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
            TypeExpr::Slice(inner) => write!(f, "[{}]", inner),
            TypeExpr::Array { element, length } => write!(f, "[{}; {}]", element, length),
            TypeExpr::Tuple(elements) => write_tuple(f, elements),
            TypeExpr::TraitObject { keyword, bound } => write!(f, "{} {}", keyword, bound),
            TypeExpr::Opaque(text) => write!(f, "{}", text),
        }
    }
}

/// Write `<A, B>` (nothing for an empty list).
pub fn write_args<T: fmt::Display>(f: &mut fmt::Formatter<'_>, args: &[T]) -> fmt::Result {
    if args.is_empty() {
        return Ok(());
    }
    write!(f, "<")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    write!(f, ">")
}

/// Write `(A, B)`, `(A,)` or `()`.
pub fn write_tuple<T: fmt::Display>(f: &mut fmt::Formatter<'_>, elements: &[T]) -> fmt::Result {
    write!(f, "(")?;
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", element)?;
    }
    if elements.len() == 1 {
        write!(f, ",")?;
    }
    write!(f, ")")
}

fn type_arguments(list: Node, source: &[u8]) -> Vec<TypeExpr> {
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|child| !child.is_extra() && child.kind() != "lifetime")
        .map(|child| match child.kind() {
            "type_binding" | "trait_bounds" => {
                TypeExpr::Opaque(node_text(child, source).trim().to_string())
            }
            _ => TypeExpr::from_node(child, source),
        })
        .collect()
}

/// Split `a::b :: C` into `["a", "b", "C"]`, dropping a leading `::`.
pub fn split_path(text: &str) -> Vec<String> {
    text.split("::")
        .map(|segment| segment.split_whitespace().collect::<String>())
        .filter(|segment| !segment.is_empty())
        .collect()
}

pub(crate) fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}
