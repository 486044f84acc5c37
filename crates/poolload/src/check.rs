// Signature checking: use entries, declarations and type references

use crate::context::{BuildContext, PackageInfo, SourceFile, UseTarget, EXTERNAL_ROOTS};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::program::{FragmentShape, ModelFragment, ResolvedField, ResolvedType, TypeTarget};
use poolparse::{Fields, ImplMember, Item, ItemKind, TypeExpr};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Names usable without any import.
const BUILTINS: &[&str] = &[
    "bool", "char", "str", "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64",
    "i128", "isize", "f32", "f64", "String", "Vec", "Option", "Result", "Box",
];

/// Prelude traits, so impl headers and trait objects resolve.
const PRELUDE_TRAITS: &[&str] = &[
    "Clone", "Copy", "Default", "Drop", "Eq", "PartialEq", "Ord", "PartialOrd", "Send", "Sync",
    "Sized", "Unpin", "Fn", "FnMut", "FnOnce", "From", "Into", "TryFrom", "TryInto", "AsRef",
    "AsMut", "Iterator", "IntoIterator", "DoubleEndedIterator", "ExactSizeIterator", "Extend",
    "ToOwned", "ToString",
];

/// Names declared by one package, split by namespace
#[derive(Debug, Default)]
pub(crate) struct Declarations {
    types: HashSet<String>,
    values: HashSet<String>,
}

impl Declarations {
    /// Index a package's items, reporting names declared twice
    pub(crate) fn index(
        info: &PackageInfo,
        package: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut decls = Self::default();
        for file in &info.files {
            for item in &file.unit.items {
                let namespace = if item.kind.is_type() {
                    &mut decls.types
                } else {
                    &mut decls.values
                };
                if !namespace.insert(item.name.clone()) {
                    diagnostics.push(
                        Diagnostic::package(
                            DiagnosticKind::Redeclared,
                            package,
                            format!("`{}` redeclared in this package", item.name),
                        )
                        .at(&file.path, item.line),
                    );
                }
            }
        }
        decls
    }

    fn contains(&self, name: &str) -> bool {
        self.types.contains(name) || self.values.contains(name)
    }

    fn has_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Package(String),
    Item { package: String, name: String },
    External(Vec<String>),
    Unresolved,
}

struct FileScope<'a> {
    package: &'a str,
    file: &'a Path,
    bindings: HashMap<String, Binding>,
    globs: Vec<String>,
}

/// Checks one package at a time against the declarations of the whole program
pub(crate) struct Checker<'a> {
    context: &'a BuildContext,
    declarations: &'a HashMap<String, Declarations>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(
        context: &'a BuildContext,
        declarations: &'a HashMap<String, Declarations>,
        diagnostics: &'a mut Vec<Diagnostic>,
    ) -> Self {
        Self {
            context,
            declarations,
            diagnostics,
        }
    }

    /// Check every file of a package and return its resolved model fragments
    pub(crate) fn check_package(
        &mut self,
        package: &str,
        info: &PackageInfo,
    ) -> Vec<ModelFragment> {
        let mut models = Vec::new();
        for file in &info.files {
            let scope = self.file_scope(package, file);
            for item in &file.unit.items {
                if let Some(model) = self.check_item(&scope, item) {
                    models.push(model);
                }
            }
            for block in &file.unit.impls {
                let generics = &block.generics;
                self.resolve(&scope, &block.self_ty, generics, block.line);
                if let Some(trait_ref) = &block.trait_ref {
                    self.resolve(&scope, trait_ref, generics, block.line);
                }
                for member in &block.members {
                    match member {
                        ImplMember::Function {
                            signature, line, ..
                        } => {
                            let mut scoped = generics.clone();
                            scoped.extend(signature.generics.iter().cloned());
                            for param in &signature.params {
                                self.resolve(&scope, param, &scoped, *line);
                            }
                            if let Some(output) = &signature.output {
                                self.resolve(&scope, output, &scoped, *line);
                            }
                        }
                        ImplMember::Const { ty, line, .. } | ImplMember::Type { ty, line, .. } => {
                            self.resolve(&scope, ty, generics, *line);
                        }
                    }
                }
            }
        }
        models
    }

    fn file_scope<'f>(&mut self, package: &'f str, file: &'f SourceFile) -> FileScope<'f> {
        let declarations = self.declarations;
        let own = declarations.get(package);
        let mut scope = FileScope {
            package,
            file: &file.path,
            bindings: HashMap::new(),
            globs: Vec::new(),
        };

        for entry in &file.unit.uses {
            let target = self.context.classify_use(entry);
            let binding = match target {
                UseTarget::Package { path } => Binding::Package(path),
                UseTarget::Item { package: from, name } => {
                    let declared = declarations
                        .get(&from)
                        .map(|decls| decls.contains(&name))
                        .unwrap_or(false);
                    if !declared {
                        self.report(
                            &scope,
                            DiagnosticKind::MissingItem,
                            entry.line,
                            format!("`{}` is not declared in package `{}`", name, from),
                        );
                    }
                    Binding::Item { package: from, name }
                }
                UseTarget::Glob { package: from } => {
                    if !scope.globs.contains(&from) {
                        scope.globs.push(from);
                    }
                    continue;
                }
                UseTarget::External => Binding::External(entry.path.clone()),
                UseTarget::Unsupported => {
                    self.report(
                        &scope,
                        DiagnosticKind::UnsupportedImport,
                        entry.line,
                        format!(
                            "relative import `{}` is not supported; use a path from a source root",
                            entry.display_path()
                        ),
                    );
                    Binding::Unresolved
                }
                UseTarget::Unresolved => {
                    self.report(
                        &scope,
                        DiagnosticKind::UnresolvedImport,
                        entry.line,
                        format!("cannot resolve import `{}`", entry.display_path()),
                    );
                    Binding::Unresolved
                }
            };

            let Some(name) = entry.binding_name().map(str::to_string) else {
                continue;
            };
            if name == "_" {
                continue;
            }
            let clashes_with_item = own.map(|decls| decls.contains(&name)).unwrap_or(false);
            if clashes_with_item || scope.bindings.contains_key(&name) {
                self.report(
                    &scope,
                    DiagnosticKind::Redeclared,
                    entry.line,
                    format!("`{}` is imported more than once", name),
                );
                continue;
            }
            scope.bindings.insert(name, binding);
        }

        scope
    }

    fn check_item(&mut self, scope: &FileScope<'_>, item: &Item) -> Option<ModelFragment> {
        let generics = &item.generics;
        match &item.kind {
            ItemKind::Struct(fields) => {
                let resolved = self.check_fields(scope, fields, generics, item.line);
                if !item.is_model() {
                    return None;
                }
                let shape = match fields {
                    Fields::Named(_) => FragmentShape::Named,
                    Fields::Tuple(_) => FragmentShape::Tuple,
                    Fields::Unit => FragmentShape::Unit,
                };
                Some(ModelFragment {
                    name: item.name.clone(),
                    docs: item.docs.clone(),
                    generics: generics.clone(),
                    shape,
                    fields: resolved,
                    file: scope.file.to_path_buf(),
                    line: item.line,
                })
            }
            ItemKind::Enum(variants) => {
                for variant in variants {
                    self.check_fields(scope, &variant.fields, generics, item.line);
                }
                None
            }
            ItemKind::TypeAlias(ty) | ItemKind::Const(ty) | ItemKind::Static(ty) => {
                self.resolve(scope, ty, generics, item.line);
                None
            }
            ItemKind::Function(signature) => {
                for param in &signature.params {
                    self.resolve(scope, param, generics, item.line);
                }
                if let Some(output) = &signature.output {
                    self.resolve(scope, output, generics, item.line);
                }
                None
            }
            ItemKind::Union | ItemKind::Trait | ItemKind::Module | ItemKind::Macro => None,
        }
    }

    fn check_fields(
        &mut self,
        scope: &FileScope<'_>,
        fields: &Fields,
        generics: &[String],
        line: usize,
    ) -> Vec<ResolvedField> {
        match fields {
            Fields::Named(fields) => fields
                .iter()
                .map(|field| ResolvedField {
                    name: field.name.clone(),
                    ty: self.resolve(scope, &field.ty, generics, field.line),
                    docs: field.docs.clone(),
                    line: field.line,
                })
                .collect(),
            Fields::Tuple(types) => {
                for ty in types {
                    self.resolve(scope, ty, generics, line);
                }
                Vec::new()
            }
            Fields::Unit => Vec::new(),
        }
    }

    fn resolve(
        &mut self,
        scope: &FileScope<'_>,
        ty: &TypeExpr,
        generics: &[String],
        line: usize,
    ) -> ResolvedType {
        match ty {
            TypeExpr::Path { segments, args } => ResolvedType::Path {
                target: self.resolve_path(scope, segments, generics, line),
                args: args
                    .iter()
                    .map(|arg| self.resolve(scope, arg, generics, line))
                    .collect(),
            },
            TypeExpr::Reference {
                lifetime,
                mutable,
                inner,
            } => ResolvedType::Reference {
                lifetime: lifetime.clone(),
                mutable: *mutable,
                inner: Box::new(self.resolve(scope, inner, generics, line)),
            },
            TypeExpr::Slice(inner) => {
                ResolvedType::Slice(Box::new(self.resolve(scope, inner, generics, line)))
            }
            TypeExpr::Array { element, length } => ResolvedType::Array {
                element: Box::new(self.resolve(scope, element, generics, line)),
                length: length.clone(),
            },
            TypeExpr::Tuple(elements) => ResolvedType::Tuple(
                elements
                    .iter()
                    .map(|element| self.resolve(scope, element, generics, line))
                    .collect(),
            ),
            TypeExpr::TraitObject { keyword, bound } => ResolvedType::TraitObject {
                keyword: keyword.clone(),
                bound: Box::new(self.resolve(scope, bound, generics, line)),
            },
            TypeExpr::Opaque(text) => ResolvedType::Opaque(text.clone()),
        }
    }

    fn resolve_path(
        &mut self,
        scope: &FileScope<'_>,
        segments: &[String],
        generics: &[String],
        line: usize,
    ) -> TypeTarget {
        let Some((first, rest)) = segments.split_first() else {
            return TypeTarget::Unresolved(Vec::new());
        };

        if first == "Self" || generics.contains(first) {
            return TypeTarget::Generic(segments.join("::"));
        }

        if rest.is_empty() {
            return self.resolve_name(scope, first, line);
        }

        if EXTERNAL_ROOTS.contains(&first.as_str()) {
            return TypeTarget::External(segments.to_vec());
        }

        match scope.bindings.get(first) {
            Some(Binding::Package(path)) => {
                if let [name] = rest {
                    return self.declared_in(scope, path, name, line);
                }
                let nested: Vec<String> = path
                    .split("::")
                    .map(str::to_string)
                    .chain(rest.iter().cloned())
                    .collect();
                self.resolve_qualified(scope, &nested, line)
            }
            Some(Binding::External(path)) => {
                let mut full = path.clone();
                full.extend(rest.iter().cloned());
                TypeTarget::External(full)
            }
            Some(Binding::Item { package, name }) => {
                self.report(
                    scope,
                    DiagnosticKind::UndefinedType,
                    line,
                    format!(
                        "cannot resolve type path `{}`: `{}` is an item of `{}`, not a package",
                        segments.join("::"),
                        name,
                        package
                    ),
                );
                TypeTarget::Unresolved(segments.to_vec())
            }
            Some(Binding::Unresolved) => TypeTarget::Unresolved(segments.to_vec()),
            None => self.resolve_qualified(scope, segments, line),
        }
    }

    /// `a::b::Name` written against the source roots
    fn resolve_qualified(
        &mut self,
        scope: &FileScope<'_>,
        segments: &[String],
        line: usize,
    ) -> TypeTarget {
        let Some((name, package)) = segments.split_last() else {
            return TypeTarget::Unresolved(Vec::new());
        };
        let package = package.join("::");
        if self.declarations.contains_key(&package) {
            return self.declared_in(scope, &package, name, line);
        }
        self.report(
            scope,
            DiagnosticKind::UndefinedType,
            line,
            format!("cannot resolve type path `{}`", segments.join("::")),
        );
        TypeTarget::Unresolved(segments.to_vec())
    }

    /// Type `name` of `package`; a missing type is reported but still targets the package
    fn declared_in(
        &mut self,
        scope: &FileScope<'_>,
        package: &str,
        name: &str,
        line: usize,
    ) -> TypeTarget {
        let declared = self
            .declarations
            .get(package)
            .map(|decls| decls.has_type(name))
            .unwrap_or(false);
        if !declared {
            self.report(
                scope,
                DiagnosticKind::MissingItem,
                line,
                format!("type `{}` is not declared in package `{}`", name, package),
            );
        }
        TypeTarget::Declared {
            package: package.to_string(),
            name: name.to_string(),
        }
    }

    fn resolve_name(&mut self, scope: &FileScope<'_>, name: &str, line: usize) -> TypeTarget {
        let own = self.declarations.get(scope.package);
        if own.map(|decls| decls.has_type(name)).unwrap_or(false) {
            return TypeTarget::Declared {
                package: scope.package.to_string(),
                name: name.to_string(),
            };
        }

        match scope.bindings.get(name) {
            Some(Binding::Item { package, name }) => {
                return TypeTarget::Declared {
                    package: package.clone(),
                    name: name.clone(),
                };
            }
            Some(Binding::External(path)) => return TypeTarget::External(path.clone()),
            Some(Binding::Unresolved) => return TypeTarget::Unresolved(vec![name.to_string()]),
            Some(Binding::Package(path)) => {
                self.report(
                    scope,
                    DiagnosticKind::UndefinedType,
                    line,
                    format!("`{}` names package `{}`, not a type", name, path),
                );
                return TypeTarget::Unresolved(vec![name.to_string()]);
            }
            None => {}
        }

        if BUILTINS.contains(&name) || PRELUDE_TRAITS.contains(&name) {
            return TypeTarget::Builtin(name.to_string());
        }

        let from_glob = scope.globs.iter().find(|package| {
            self.declarations
                .get(package.as_str())
                .map(|decls| decls.has_type(name))
                .unwrap_or(false)
        });
        if let Some(package) = from_glob {
            return TypeTarget::Declared {
                package: package.clone(),
                name: name.to_string(),
            };
        }

        self.report(
            scope,
            DiagnosticKind::UndefinedType,
            line,
            format!("undefined type `{}`", name),
        );
        TypeTarget::Unresolved(vec![name.to_string()])
    }

    fn report(
        &mut self,
        scope: &FileScope<'_>,
        kind: DiagnosticKind,
        line: usize,
        message: String,
    ) {
        self.diagnostics
            .push(Diagnostic::package(kind, scope.package, message).at(scope.file, line));
    }
}
