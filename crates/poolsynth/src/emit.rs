// Rendering merged models as pool sources

use crate::merge::MergedModel;
use crate::{SynthError, GENERATED_HEADER, REGISTRY_FILE};
use poolload::{ResolvedType, TypeTarget};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// File stems owned by the pool itself.
const RESERVED_STEMS: &[&str] = &["temp", "registry"];

/// Names an alias may never take.
const RESERVED_ALIASES: &[&str] = &["std", "core", "alloc", "self", "crate", "super", "Self"];

/// Convert a model name to snake case: `SaleOrder` -> `sale_order`, `HTTPServer` -> `http_server`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_uppercase() {
            out.push(c);
            continue;
        }
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();
        let boundary = match prev {
            Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
            Some(p) if p.is_uppercase() => next.map(char::is_lowercase).unwrap_or(false),
            _ => false,
        };
        if boundary && !out.ends_with('_') {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// File stem for a model, steering clear of the pool's own files.
pub fn file_stem(model: &str) -> String {
    let stem = snake_case(model);
    if RESERVED_STEMS.contains(&stem.as_str()) {
        format!("{}_model", stem)
    } else {
        stem
    }
}

pub(crate) struct Emitter<'a> {
    models: &'a [MergedModel],
    pool_import_path: &'a str,
    pool_name: &'a str,
    aliases: BTreeMap<String, String>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(
        models: &'a [MergedModel],
        pool_import_path: &'a str,
        pool_name: &'a str,
    ) -> Self {
        let mut packages = BTreeSet::new();
        for model in models {
            for field in &model.fields {
                field.ty.walk_targets(&mut |target| {
                    if let TypeTarget::Declared { package, .. } = target {
                        if package != pool_import_path {
                            packages.insert(package.clone());
                        }
                    }
                });
            }
        }

        let mut taken: HashSet<String> = models.iter().map(|m| m.name.clone()).collect();
        taken.extend(RESERVED_ALIASES.iter().map(|s| s.to_string()));

        let mut aliases = BTreeMap::new();
        for package in packages {
            let base = last_segment(&package).to_string();
            let mut alias = base.clone();
            let mut suffix = 2;
            while taken.contains(&alias) {
                alias = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            taken.insert(alias.clone());
            aliases.insert(package, alias);
        }

        Self {
            models,
            pool_import_path,
            pool_name,
            aliases,
        }
    }

    /// Render every file as `(file name, content)`, models first, registry last
    pub(crate) fn render(&self) -> Result<Vec<(String, String)>, SynthError> {
        let mut stems: HashMap<String, &str> = HashMap::new();
        let mut files = Vec::with_capacity(self.models.len() + 1);

        for model in self.models {
            let file_name = format!("{}.rs", file_stem(&model.name));
            if let Some(first) = stems.insert(file_name.clone(), &model.name) {
                return Err(SynthError::FileNameCollision {
                    file: file_name,
                    first: first.to_string(),
                    second: model.name.clone(),
                });
            }
            files.push((file_name, self.render_model(model)?));
        }

        files.push((REGISTRY_FILE.to_string(), self.render_registry()));
        Ok(files)
    }

    fn preamble(&self) -> String {
        format!("{}#![package({})]\n", GENERATED_HEADER, self.pool_name)
    }

    fn render_model(&self, model: &MergedModel) -> Result<String, SynthError> {
        let mut used = BTreeSet::new();
        let mut fields = Vec::with_capacity(model.fields.len());
        for field in &model.fields {
            let ty = self.render_type(&model.name, &field.name, &field.ty, &mut used)?;
            fields.push((field, ty));
        }

        let mut out = self.preamble();

        if !used.is_empty() {
            out.push('\n');
            for package in &used {
                let alias = self.alias(package);
                if alias == last_segment(package) {
                    out.push_str(&format!("use {};\n", package));
                } else {
                    out.push_str(&format!("use {} as {};\n", package, alias));
                }
            }
        }

        out.push('\n');
        for line in &model.docs {
            push_doc(&mut out, "", line);
        }
        if !model.docs.is_empty() {
            push_doc(&mut out, "", "");
        }
        let sources: Vec<String> = model.packages.iter().map(|p| format!("`{}`", p)).collect();
        push_doc(&mut out, "", &format!("Merged from: {}", sources.join(", ")));

        out.push_str(&format!("pub struct {} {{\n", model.name));
        for (field, ty) in &fields {
            for line in &field.docs {
                push_doc(&mut out, "    ", line);
            }
            out.push_str(&format!("    pub {}: {},\n", field.name, ty));
        }
        out.push_str("}\n\n");

        let names: Vec<String> = model
            .fields
            .iter()
            .map(|f| format!("\"{}\"", f.name.trim_start_matches("r#")))
            .collect();
        out.push_str(&format!("impl {} {{\n", model.name));
        out.push_str("    /// Name of the model\n");
        out.push_str(&format!(
            "    pub const MODEL_NAME: &'static str = \"{}\";\n\n",
            model.name
        ));
        out.push_str("    /// Names of the merged fields, in declaration order\n");
        out.push_str(&format!(
            "    pub const FIELD_NAMES: &'static [&'static str] = &[{}];\n",
            names.join(", ")
        ));
        out.push_str("}\n");

        Ok(out)
    }

    fn render_registry(&self) -> String {
        let names: Vec<String> = self.models.iter().map(|m| format!("\"{}\"", m.name)).collect();
        let mut out = self.preamble();
        out.push('\n');
        out.push_str("/// Every model of the pool, in merge order\n");
        out.push_str(&format!(
            "pub const MODEL_NAMES: &[&str] = &[{}];\n",
            names.join(", ")
        ));
        out
    }

    fn render_type(
        &self,
        model: &str,
        field: &str,
        ty: &ResolvedType,
        used: &mut BTreeSet<String>,
    ) -> Result<String, SynthError> {
        let rendered = match ty {
            ResolvedType::Path { target, args } => {
                let mut out = self.render_target(model, field, target, used)?;
                if !args.is_empty() {
                    let args = args
                        .iter()
                        .map(|arg| self.render_type(model, field, arg, used))
                        .collect::<Result<Vec<_>, _>>()?;
                    out.push_str(&format!("<{}>", args.join(", ")));
                }
                out
            }
            ResolvedType::Reference {
                lifetime,
                mutable,
                inner,
            } => {
                let mut out = String::from("&");
                if let Some(lifetime) = lifetime {
                    out.push_str(&format!("'{} ", lifetime));
                }
                if *mutable {
                    out.push_str("mut ");
                }
                out.push_str(&self.render_type(model, field, inner, used)?);
                out
            }
            ResolvedType::Slice(inner) => {
                format!("[{}]", self.render_type(model, field, inner, used)?)
            }
            ResolvedType::Array { element, length } => format!(
                "[{}; {}]",
                self.render_type(model, field, element, used)?,
                length
            ),
            ResolvedType::Tuple(elements) => {
                let elements = elements
                    .iter()
                    .map(|element| self.render_type(model, field, element, used))
                    .collect::<Result<Vec<_>, _>>()?;
                match elements.len() {
                    1 => format!("({},)", elements[0]),
                    _ => format!("({})", elements.join(", ")),
                }
            }
            ResolvedType::TraitObject { keyword, bound } => format!(
                "{} {}",
                keyword,
                self.render_type(model, field, bound, used)?
            ),
            ResolvedType::Opaque(text) => text.clone(),
        };
        Ok(rendered)
    }

    fn render_target(
        &self,
        model: &str,
        field: &str,
        target: &TypeTarget,
        used: &mut BTreeSet<String>,
    ) -> Result<String, SynthError> {
        match target {
            TypeTarget::Builtin(name) | TypeTarget::Generic(name) => Ok(name.clone()),
            TypeTarget::Declared { package, name } if package == self.pool_import_path => {
                if self.models.iter().any(|m| &m.name == name) {
                    Ok(name.clone())
                } else {
                    Err(SynthError::UnknownModel {
                        model: model.to_string(),
                        field: field.to_string(),
                        name: name.clone(),
                    })
                }
            }
            TypeTarget::Declared { package, name } => {
                used.insert(package.clone());
                Ok(format!("{}::{}", self.alias(package), name))
            }
            TypeTarget::External(path) => Ok(path.join("::")),
            TypeTarget::Unresolved(path) => Err(SynthError::UnresolvedType {
                model: model.to_string(),
                field: field.to_string(),
                ty: path.join("::"),
            }),
        }
    }

    fn alias<'s>(&'s self, package: &'s str) -> &'s str {
        self.aliases
            .get(package)
            .map(String::as_str)
            .unwrap_or_else(|| last_segment(package))
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn push_doc(out: &mut String, indent: &str, line: &str) {
    if line.is_empty() {
        out.push_str(&format!("{}///\n", indent));
    } else {
        out.push_str(&format!("{}/// {}\n", indent, line));
    }
}
