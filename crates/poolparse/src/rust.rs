// Declaration extraction for module sources

use crate::grammar::new_parser;
use crate::traits::{
    Attribute, Error, Field, Fields, FnSignature, ImplBlock, ImplMember, Item, ItemKind, Result,
    SourceUnit, SyntaxError, UseEntry, Variant,
};
use crate::types::{node_text, split_path, TypeExpr};
use tree_sitter::{Node, Parser};

/// Reusable parser for module sources
pub struct SourceParser {
    parser: Parser,
}

impl SourceParser {
    /// Create a parser with the module grammar installed
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: new_parser()?,
        })
    }

    /// Parse one source text into a [`SourceUnit`].
    ///
    /// A source with syntax errors still yields a unit: the grammar recovers
    /// and the errors are listed in [`SourceUnit::syntax_errors`].
    pub fn parse(&mut self, source: &str) -> Result<SourceUnit> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::ParseFailed("parser returned no tree".to_string()))?;

        let root = tree.root_node();
        let bytes = source.as_bytes();

        let mut unit = extract_unit(root, bytes);
        collect_syntax_errors(root, bytes, &mut unit.syntax_errors);
        tracing::debug!(
            items = unit.items.len(),
            errors = unit.syntax_errors.len(),
            "parsed module source"
        );
        Ok(unit)
    }
}

/// Parse a single source text with a throwaway parser
pub fn parse_source(source: &str) -> Result<SourceUnit> {
    SourceParser::new()?.parse(source)
}

#[derive(Default)]
struct Pending {
    attributes: Vec<Attribute>,
    docs: Vec<String>,
}

fn extract_unit(root: Node, source: &[u8]) -> SourceUnit {
    let mut unit = SourceUnit::default();
    let mut pending = Pending::default();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "inner_attribute_item" => {
                if let Some(attr) = Attribute::from_source(node_text(child, source)) {
                    if attr.name == crate::PACKAGE_ATTRIBUTE {
                        unit.package = attr
                            .args
                            .as_deref()
                            .map(str::trim)
                            .filter(|name| !name.is_empty())
                            .map(str::to_string);
                    }
                    unit.inner_attributes.push(attr);
                }
            }
            "attribute_item" => {
                if let Some(attr) = Attribute::from_source(node_text(child, source)) {
                    pending.attributes.push(attr);
                }
            }
            "line_comment" | "block_comment" => {
                if let Some(doc) = doc_line(node_text(child, source)) {
                    pending.docs.push(doc);
                }
            }
            "use_declaration" => {
                let line = line_of(child);
                if let Some(argument) = child.child_by_field_name("argument") {
                    flatten_use(argument, &[], line, source, &mut unit.uses);
                }
                pending = Pending::default();
            }
            "impl_item" => {
                if let Some(block) = extract_impl(child, source) {
                    unit.impls.push(block);
                }
                pending = Pending::default();
            }
            _ => {
                let taken = std::mem::take(&mut pending);
                if let Some(item) = extract_item(child, source, taken) {
                    unit.items.push(item);
                }
            }
        }
    }

    unit
}

fn extract_item(node: Node, source: &[u8], pending: Pending) -> Option<Item> {
    let kind = match node.kind() {
        "struct_item" => ItemKind::Struct(extract_fields(node.child_by_field_name("body"), source)),
        "enum_item" => ItemKind::Enum(extract_variants(node, source)),
        "union_item" => ItemKind::Union,
        "type_item" => ItemKind::TypeAlias(field_type(node, "type", source)?),
        "trait_item" => ItemKind::Trait,
        "function_item" | "function_signature_item" => {
            ItemKind::Function(extract_signature(node, source))
        }
        "const_item" => ItemKind::Const(field_type(node, "type", source)?),
        "static_item" => ItemKind::Static(field_type(node, "type", source)?),
        "mod_item" => ItemKind::Module,
        "macro_definition" => ItemKind::Macro,
        _ => return None,
    };

    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source).trim().to_string())
        .filter(|n| !n.is_empty())?;

    Some(Item {
        name,
        kind,
        generics: extract_generics(node, source),
        attributes: pending.attributes,
        docs: pending.docs,
        public: is_public(node),
        line: line_of(node),
    })
}

fn field_type(node: Node, field: &str, source: &[u8]) -> Option<TypeExpr> {
    node.child_by_field_name(field)
        .map(|ty| TypeExpr::from_node(ty, source))
}

fn extract_fields(body: Option<Node>, source: &[u8]) -> Fields {
    let Some(body) = body else {
        return Fields::Unit;
    };

    match body.kind() {
        "field_declaration_list" => {
            let mut fields = Vec::new();
            let mut docs = Vec::new();
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                match child.kind() {
                    "line_comment" | "block_comment" => {
                        if let Some(doc) = doc_line(node_text(child, source)) {
                            docs.push(doc);
                        }
                    }
                    "attribute_item" => {}
                    "field_declaration" => {
                        let name = child
                            .child_by_field_name("name")
                            .map(|n| node_text(n, source).trim().to_string());
                        let ty = field_type(child, "type", source);
                        if let (Some(name), Some(ty)) = (name, ty) {
                            fields.push(Field {
                                name,
                                ty,
                                docs: std::mem::take(&mut docs),
                                line: line_of(child),
                            });
                        }
                        docs.clear();
                    }
                    _ => docs.clear(),
                }
            }
            Fields::Named(fields)
        }
        "ordered_field_declaration_list" => {
            let mut cursor = body.walk();
            let types = body
                .children_by_field_name("type", &mut cursor)
                .map(|ty| TypeExpr::from_node(ty, source))
                .collect();
            Fields::Tuple(types)
        }
        _ => Fields::Unit,
    }
}

fn extract_variants(node: Node, source: &[u8]) -> Vec<Variant> {
    let Some(body) = node.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut variants = Vec::new();
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        if child.kind() != "enum_variant" {
            continue;
        }
        let Some(name) = child.child_by_field_name("name") else {
            continue;
        };
        variants.push(Variant {
            name: node_text(name, source).trim().to_string(),
            fields: extract_fields(child.child_by_field_name("body"), source),
        });
    }
    variants
}

fn extract_signature(node: Node, source: &[u8]) -> FnSignature {
    let mut params = Vec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            if param.kind() != "parameter" {
                continue;
            }
            if let Some(ty) = field_type(param, "type", source) {
                params.push(ty);
            }
        }
    }

    FnSignature {
        generics: extract_generics(node, source),
        params,
        output: field_type(node, "return_type", source),
    }
}

fn extract_impl(node: Node, source: &[u8]) -> Option<ImplBlock> {
    let self_ty = field_type(node, "type", source)?;
    let trait_ref = field_type(node, "trait", source);

    let mut members = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            let name = child
                .child_by_field_name("name")
                .map(|n| node_text(n, source).trim().to_string());
            let Some(name) = name else {
                continue;
            };
            let line = line_of(child);
            match child.kind() {
                "function_item" | "function_signature_item" => {
                    members.push(ImplMember::Function {
                        name,
                        signature: extract_signature(child, source),
                        line,
                    });
                }
                "const_item" => {
                    if let Some(ty) = field_type(child, "type", source) {
                        members.push(ImplMember::Const { name, ty, line });
                    }
                }
                "type_item" => {
                    if let Some(ty) = field_type(child, "type", source) {
                        members.push(ImplMember::Type { name, ty, line });
                    }
                }
                _ => {}
            }
        }
    }

    Some(ImplBlock {
        generics: extract_generics(node, source),
        trait_ref,
        self_ty,
        members,
        line: line_of(node),
    })
}

fn extract_generics(node: Node, source: &[u8]) -> Vec<String> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };

    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter_map(|param| {
            let name_node = match param.kind() {
                "lifetime" | "lifetime_parameter" | "attribute_item" => return None,
                "type_identifier" | "identifier" => Some(param),
                _ => param
                    .child_by_field_name("name")
                    .or_else(|| param.child_by_field_name("left")),
            }?;
            let name = node_text(name_node, source).trim();
            if name.is_empty() || name.starts_with('\'') {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect()
}

fn flatten_use(node: Node, prefix: &[String], line: usize, source: &[u8], out: &mut Vec<UseEntry>) {
    match node.kind() {
        "identifier" | "scoped_identifier" | "crate" | "self" | "super" | "metavariable" => {
            out.push(UseEntry {
                path: join_prefix(prefix, split_path(node_text(node, source))),
                alias: None,
                glob: false,
                line,
            });
        }
        "use_as_clause" => {
            let Some(path) = node.child_by_field_name("path") else {
                return;
            };
            let alias = node
                .child_by_field_name("alias")
                .map(|a| node_text(a, source).trim().to_string());
            out.push(UseEntry {
                path: join_prefix(prefix, split_path(node_text(path, source))),
                alias,
                glob: false,
                line,
            });
        }
        "use_wildcard" => {
            let text = node_text(node, source).trim();
            let base = text.strip_suffix('*').unwrap_or(text);
            out.push(UseEntry {
                path: join_prefix(prefix, split_path(base)),
                alias: None,
                glob: true,
                line,
            });
        }
        "scoped_use_list" => {
            let mut nested = prefix.to_vec();
            if let Some(path) = node.child_by_field_name("path") {
                nested.extend(split_path(node_text(path, source)));
            }
            if let Some(list) = node.child_by_field_name("list") {
                flatten_use(list, &nested, line, source, out);
            }
        }
        "use_list" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if !child.is_extra() {
                    flatten_use(child, prefix, line, source, out);
                }
            }
        }
        _ => {}
    }
}

/// `{self}` inside a use list names the prefix itself.
fn join_prefix(prefix: &[String], segments: Vec<String>) -> Vec<String> {
    if segments.len() == 1 && segments[0] == "self" && !prefix.is_empty() {
        return prefix.to_vec();
    }
    let mut path = prefix.to_vec();
    path.extend(segments);
    path
}

fn doc_line(text: &str) -> Option<String> {
    let text = text.trim_end();
    if let Some(rest) = text.strip_prefix("///") {
        if rest.starts_with('/') {
            return None;
        }
        return Some(rest.strip_prefix(' ').unwrap_or(rest).to_string());
    }
    if let Some(rest) = text.strip_prefix("/**") {
        if rest.starts_with('*') {
            return None;
        }
        return Some(rest.trim_end_matches("*/").trim().to_string());
    }
    None
}

fn is_public(node: Node) -> bool {
    let mut cursor = node.walk();
    let public = node
        .children(&mut cursor)
        .any(|child| child.kind() == "visibility_modifier");
    public
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

fn collect_syntax_errors(node: Node, source: &[u8], out: &mut Vec<SyntaxError>) {
    if node.is_error() {
        let snippet: String = node_text(node, source)
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(32)
            .collect();
        out.push(SyntaxError {
            line: line_of(node),
            column: node.start_position().column + 1,
            message: format!("unexpected `{}`", snippet.trim()),
        });
        return;
    }

    if node.is_missing() {
        out.push(SyntaxError {
            line: line_of(node),
            column: node.start_position().column + 1,
            message: format!("missing `{}`", node.kind()),
        });
        return;
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_syntax_errors(child, source, out);
    }
}
