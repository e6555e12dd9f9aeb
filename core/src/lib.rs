//! Core types and the pure half of the prompt versioning engine.
//!
//! This crate defines the data model for versioned prompt definitions and
//! the two storage-independent pieces of the versioning engine:
//!
//! - [`PromptDefinition`]: an immutable prompt header plus parameter and
//!   default maps, as supplied by a caller.
//! - [`StoredVersion`]: a persisted snapshot with its surrogate
//!   [`VersionId`], per-name version ordinal, and timestamps.
//! - [`should_create_version`] / [`changed_fields`]: change detection
//!   between an incoming definition and the latest stored version.
//! - [`assemble`]: reconstruction of stored versions from the flattened
//!   rows of a header × parameters × defaults outer join.
//!
//! Validation ([`validate_definition`]) reports empty names and orphaned
//! defaults before a definition reaches the store.
//!
//! # Example
//!
//! ```
//! use promptdb_core::*;
//!
//! let def = PromptDefinition::new("myprompt", "json", 500, "You are helpful.", "Answer {{q}}")
//!     .with_parameter("q", "string");
//!
//! assert!(validate_definition(&def).is_empty());
//! assert!(should_create_version(&def, None));
//! ```

mod assemble;
mod change;
mod types;
mod validate;

pub use assemble::assemble;
pub use change::{ChangedField, changed_fields, should_create_version};
pub use types::*;
pub use validate::{ValidationError, validate_definition};
