// poolgen - Pool Generation CLI
//
// Framework configuration, error reporting and the command-line front end
// of the pool generation pipeline.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

//! Command-line front end of the pool generation pipeline.

/// Command-line interface
pub mod cli;

/// poolgen.toml and framework root detection
pub mod config;

/// Error types and formatting
pub mod errors;

pub use cli::Cli;
pub use config::{detect_framework_root, PoolgenConfig, CONFIG_FILE, ROOT_ENV};
pub use errors::{format_error, PoolgenError, Result};
