// Integration and unit tests for poolparse

use crate::prelude::*;
use rstest::rstest;

fn parse(source: &str) -> SourceUnit {
    parse_source(source).expect("parse")
}

#[cfg(test)]
mod attribute_tests {
    use super::*;

    #[rstest]
    #[case("#[model]", "model", None)]
    #[case("#![package(pool)]", "package", Some("pool"))]
    #[case("#[doc = \"hello\"]", "doc", Some("\"hello\""))]
    #[case("#[derive(Debug, Clone)]", "derive", Some("Debug, Clone"))]
    fn test_attribute_from_source(
        #[case] text: &str,
        #[case] name: &str,
        #[case] args: Option<&str>,
    ) {
        let attr = Attribute::from_source(text).expect("attribute");
        assert_eq!(attr.name, name);
        assert_eq!(attr.args.as_deref(), args);
    }

    #[test]
    fn test_attribute_rejects_garbage() {
        assert!(Attribute::from_source("model").is_none());
        assert!(Attribute::from_source("#[]").is_none());
    }
}

#[cfg(test)]
mod package_tests {
    use super::*;

    #[test]
    fn test_package_attribute_sets_identity() {
        let unit = parse("#![package(pool)]\n\npub struct A;\n");
        assert_eq!(unit.package.as_deref(), Some("pool"));
        assert_eq!(unit.inner_attributes.len(), 1);
    }

    #[test]
    fn test_missing_package_attribute() {
        let unit = parse("pub struct A;\n");
        assert!(unit.package.is_none());
    }
}

#[cfg(test)]
mod use_tests {
    use super::*;

    fn paths(unit: &SourceUnit) -> Vec<String> {
        unit.uses.iter().map(UseEntry::display_path).collect()
    }

    #[test]
    fn test_simple_and_aliased_uses() {
        let unit = parse("use modules::base;\nuse modules::sale::Order as SaleOrder;\n");
        assert_eq!(paths(&unit), vec!["modules::base", "modules::sale::Order"]);
        assert_eq!(unit.uses[0].binding_name(), Some("base"));
        assert_eq!(unit.uses[1].binding_name(), Some("SaleOrder"));
        assert_eq!(unit.uses[1].line, 2);
    }

    #[test]
    fn test_use_lists_are_flattened() {
        let unit = parse("use modules::{base, sale::{self, Order}, stock::*};\n");
        assert_eq!(
            paths(&unit),
            vec![
                "modules::base",
                "modules::sale",
                "modules::sale::Order",
                "modules::stock::*",
            ]
        );
        assert!(unit.uses[3].glob);
        assert_eq!(unit.uses[3].binding_name(), None);
    }

    #[test]
    fn test_std_uses_are_kept() {
        let unit = parse("use std::collections::HashMap;\n");
        assert_eq!(paths(&unit), vec!["std::collections::HashMap"]);
    }
}

#[cfg(test)]
mod item_tests {
    use super::*;

    const PARTNER: &str = r#"
#![package(base)]

use std::collections::HashMap;

/// A business partner
#[model]
pub struct Partner {
    /// Display name
    pub name: String,
    pub tags: Vec<String>,
    pub extra: HashMap<String, i64>,
}

pub struct Helper(u32, bool);

pub enum Kind {
    Person,
    Company { size: u32 },
}

pub type Partners = Vec<Partner>;

pub const LIMIT: usize = 10;

fn private<T: Clone>(value: &T, count: usize) -> Option<T> {
    None
}

impl Partner {
    pub const TABLE: &'static str = "partner";

    pub fn display(&self) -> String {
        self.name.clone()
    }
}
"#;

    #[test]
    fn test_items_are_extracted_in_order() {
        let unit = parse(PARTNER);
        assert!(unit.is_well_formed());
        let names: Vec<_> = unit.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Partner", "Helper", "Kind", "Partners", "LIMIT", "private"]
        );
    }

    #[test]
    fn test_model_fragment_detection() {
        let unit = parse(PARTNER);
        let models: Vec<_> = unit.models().collect();
        assert_eq!(models.len(), 1);

        let partner = models[0];
        assert!(partner.public);
        assert_eq!(partner.docs, vec!["A business partner"]);
        match &partner.kind {
            ItemKind::Struct(Fields::Named(fields)) => {
                let rendered: Vec<_> = fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.ty))
                    .collect();
                assert_eq!(
                    rendered,
                    vec![
                        "name: String",
                        "tags: Vec<String>",
                        "extra: HashMap<String, i64>",
                    ]
                );
                assert_eq!(fields[0].docs, vec!["Display name"]);
                assert!(fields[1].docs.is_empty());
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_tuple_struct_and_enum() {
        let unit = parse(PARTNER);
        match &unit.items[1].kind {
            ItemKind::Struct(Fields::Tuple(types)) => assert_eq!(types.len(), 2),
            other => panic!("unexpected kind: {:?}", other),
        }
        match &unit.items[2].kind {
            ItemKind::Enum(variants) => {
                assert_eq!(variants.len(), 2);
                assert_eq!(variants[0].fields, Fields::Unit);
                assert!(matches!(variants[1].fields, Fields::Named(_)));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_function_signature_and_generics() {
        let unit = parse(PARTNER);
        let private = &unit.items[5];
        assert!(!private.public);
        assert_eq!(private.generics, vec!["T"]);
        match &private.kind {
            ItemKind::Function(sig) => {
                let params: Vec<_> = sig.params.iter().map(ToString::to_string).collect();
                assert_eq!(params, vec!["&T", "usize"]);
                assert_eq!(
                    sig.output.as_ref().map(ToString::to_string).as_deref(),
                    Some("Option<T>")
                );
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_impl_blocks() {
        let unit = parse(PARTNER);
        assert_eq!(unit.impls.len(), 1);
        let block = &unit.impls[0];
        assert_eq!(block.self_ty.to_string(), "Partner");
        assert!(block.trait_ref.is_none());
        assert_eq!(block.members.len(), 2);
        match &block.members[1] {
            ImplMember::Function { name, signature, .. } => {
                assert_eq!(name, "display");
                assert!(signature.params.is_empty());
            }
            other => panic!("unexpected member: {:?}", other),
        }
    }
}

#[cfg(test)]
mod syntax_error_tests {
    use super::*;

    #[test]
    fn test_syntax_errors_are_reported_with_positions() {
        let unit = parse("pub struct Broken {\n    name: String,\n\nfn other() {}\n");
        assert!(!unit.is_well_formed());
        assert!(unit.syntax_errors.iter().all(|e| e.line >= 1 && e.column >= 1));
    }

    #[test]
    fn test_parser_is_reusable() {
        let mut parser = SourceParser::new().expect("parser");
        let first = parser.parse("pub struct A;").expect("first");
        let second = parser.parse("pub struct B;").expect("second");
        assert_eq!(first.items[0].name, "A");
        assert_eq!(second.items[0].name, "B");
    }
}
