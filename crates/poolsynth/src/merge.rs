// Merge model fragments in load order

use crate::SynthError;
use poolload::{FragmentShape, ResolvedType, TypedProgram};
use serde::Serialize;

/// A field of a merged model
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MergedField {
    /// Field name
    pub name: String,
    /// Resolved type from the first fragment declaring it
    pub ty: ResolvedType,
    /// Doc lines from the first fragment declaring it
    pub docs: Vec<String>,
    /// Package of the first fragment declaring it
    pub package: String,
}

/// A model with every fragment folded in
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MergedModel {
    /// Model name
    pub name: String,
    /// Doc lines of every fragment, in merge order
    pub docs: Vec<String>,
    /// Contributing packages, in merge order
    pub packages: Vec<String>,
    /// Fields in first-declaration order
    pub fields: Vec<MergedField>,
}

impl MergedModel {
    fn field(&self, name: &str) -> Option<&MergedField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Fold every model fragment of `program` into merged models.
///
/// Packages are walked in load order (the pool itself is skipped), files in
/// name order and fragments in source order. Models appear in the order of
/// their first fragment.
pub fn merge_models(
    program: &TypedProgram,
    pool_import_path: &str,
) -> Result<Vec<MergedModel>, SynthError> {
    let mut models: Vec<MergedModel> = Vec::new();

    for (package, fragment) in program.fragments() {
        if package.import_path == pool_import_path {
            continue;
        }
        if !fragment.generics.is_empty() {
            return Err(SynthError::GenericModel {
                model: fragment.name.clone(),
                package: package.import_path.clone(),
            });
        }
        if fragment.shape != FragmentShape::Named {
            return Err(SynthError::UnsupportedShape {
                model: fragment.name.clone(),
                package: package.import_path.clone(),
            });
        }

        let index = match models.iter().position(|m| m.name == fragment.name) {
            Some(index) => index,
            None => {
                models.push(MergedModel {
                    name: fragment.name.clone(),
                    docs: Vec::new(),
                    packages: Vec::new(),
                    fields: Vec::new(),
                });
                models.len() - 1
            }
        };
        let model = &mut models[index];

        if !fragment.docs.is_empty() {
            if !model.docs.is_empty() {
                model.docs.push(String::new());
            }
            model.docs.extend(fragment.docs.iter().cloned());
        }
        if !model.packages.contains(&package.import_path) {
            model.packages.push(package.import_path.clone());
        }

        for field in &fragment.fields {
            if let Some(existing) = model.field(&field.name) {
                if existing.ty != field.ty {
                    return Err(SynthError::ConflictingField {
                        model: model.name.clone(),
                        field: field.name.clone(),
                        first: existing.ty.to_string(),
                        first_package: existing.package.clone(),
                        second: field.ty.to_string(),
                        second_package: package.import_path.clone(),
                    });
                }
                continue;
            }
            model.fields.push(MergedField {
                name: field.name.clone(),
                ty: field.ty.clone(),
                docs: field.docs.clone(),
                package: package.import_path.clone(),
            });
        }

        tracing::debug!(
            model = %fragment.name,
            package = %package.import_path,
            fields = fragment.fields.len(),
            "merged fragment"
        );
    }

    Ok(models)
}
