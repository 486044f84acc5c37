//! poolsynth - Pool Synthesis
//!
//! Merges the model fragments of a typed program and writes them out as the
//! pool package: one source file per model plus a registry.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Fragment merging across packages.
pub mod merge;
/// Rendering and writing of pool sources.
pub mod emit;

pub use emit::{file_stem, snake_case};
pub use merge::{merge_models, MergedField, MergedModel};

use poolload::TypedProgram;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header written at the top of every generated file.
pub const GENERATED_HEADER: &str = "// This file is autogenerated by poolgen\n\
// DO NOT MODIFY THIS FILE - ANY CHANGES WILL BE OVERWRITTEN\n";

/// Placeholder file written by the stager.
pub const PLACEHOLDER_FILE: &str = "temp.rs";

/// Registry file listing every model.
pub const REGISTRY_FILE: &str = "registry.rs";

/// Errors raised while synthesizing the pool
#[derive(Debug, Error)]
pub enum SynthError {
    /// Two fragments declare the same field with different types
    #[error("model {model}: field `{field}` is `{first}` in {first_package} but `{second}` in {second_package}")]
    ConflictingField {
        /// Model name
        model: String,
        /// Field name
        field: String,
        /// Type from the first fragment
        first: String,
        /// Package of the first fragment
        first_package: String,
        /// Conflicting type
        second: String,
        /// Package of the conflicting fragment
        second_package: String,
    },

    /// Model fragments may not take generic parameters
    #[error("model {model} in {package} is generic, which the pool cannot express")]
    GenericModel {
        /// Model name
        model: String,
        /// Declaring package
        package: String,
    },

    /// Model fragments must have named fields
    #[error("model {model} in {package} must declare named fields")]
    UnsupportedShape {
        /// Model name
        model: String,
        /// Declaring package
        package: String,
    },

    /// A field refers to a pool type that no fragment declares
    #[error("model {model}: field `{field}` refers to unknown pool model `{name}`")]
    UnknownModel {
        /// Model name
        model: String,
        /// Field name
        field: String,
        /// Missing pool model
        name: String,
    },

    /// A field type could not be resolved while loading
    #[error("model {model}: field `{field}` has unresolved type `{ty}`")]
    UnresolvedType {
        /// Model name
        model: String,
        /// Field name
        field: String,
        /// Type as written
        ty: String,
    },

    /// Two models map to the same file name
    #[error("models {first} and {second} both map to {file}")]
    FileNameCollision {
        /// Colliding file name
        file: String,
        /// First model
        first: String,
        /// Second model
        second: String,
    },

    /// Writing a generated file failed
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Target file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// What a synthesizer produced
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SynthesisOutput {
    /// Model names in merge order
    pub models: Vec<String>,
    /// Files written, in write order
    pub files: Vec<PathBuf>,
}

/// Turns a typed program into pool sources.
///
/// Implementations must be deterministic, must accept a program that still
/// carries tolerant-mode diagnostics, and may only write below `out_dir`.
pub trait PoolSynthesizer {
    /// Write the pool package for `program` into `out_dir`
    fn synthesize(
        &self,
        program: &TypedProgram,
        out_dir: &Path,
    ) -> Result<SynthesisOutput, SynthError>;
}

/// Synthesizer producing one struct per merged model
#[derive(Debug, Clone)]
pub struct DefaultSynthesizer {
    pool_import_path: String,
    pool_name: String,
}

impl DefaultSynthesizer {
    /// Create a synthesizer for the pool at `pool_import_path` named `pool_name`
    pub fn new(pool_import_path: impl Into<String>, pool_name: impl Into<String>) -> Self {
        Self {
            pool_import_path: pool_import_path.into(),
            pool_name: pool_name.into(),
        }
    }
}

impl PoolSynthesizer for DefaultSynthesizer {
    fn synthesize(
        &self,
        program: &TypedProgram,
        out_dir: &Path,
    ) -> Result<SynthesisOutput, SynthError> {
        let models = merge_models(program, &self.pool_import_path)?;
        tracing::info!(models = models.len(), "merged model fragments");

        let emitter = emit::Emitter::new(&models, &self.pool_import_path, &self.pool_name);
        let sources = emitter.render()?;

        let mut files = Vec::with_capacity(sources.len());
        for (file_name, content) in sources {
            let path = out_dir.join(&file_name);
            std::fs::write(&path, content).map_err(|source| SynthError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(file = %path.display(), "wrote pool source");
            files.push(path);
        }

        Ok(SynthesisOutput {
            models: models.into_iter().map(|model| model.name).collect(),
            files,
        })
    }
}
