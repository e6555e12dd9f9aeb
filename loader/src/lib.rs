//! Prompt file parsing and store configuration for promptdb.
//!
//! This crate turns files on disk into the inputs the versioning engine
//! expects:
//!
//! - [`PromptFile`]: the YAML prompt file format, parsed strictly into a
//!   [`PromptDefinition`](promptdb_core::PromptDefinition) and serialized
//!   back for export.
//! - [`load_prompt_dir`]: every prompt file in a directory, in path order.
//! - [`StoreConfig`]: database path, table prefix, and busy timeout, read
//!   from YAML.
//!
//! # Quick start
//!
//! ```no_run
//! use promptdb_loader::{StoreConfig, load_definition};
//!
//! let config = StoreConfig::load("store.yaml").unwrap();
//! let definition = load_definition("prompts/summarize.yaml").unwrap();
//! println!("{} -> {}", definition.name(), config.path.display());
//! ```

mod config;
mod error;
mod loader;
mod prompt_file;

pub use config::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_TABLE_PREFIX, StoreConfig};
pub use error::{LoaderError, Result};
pub use loader::{LoadedPrompt, PROMPT_EXTENSIONS, load_definition, load_prompt_dir};
pub use prompt_file::{InputSchema, PromptConfig, PromptFile, Prompts};
