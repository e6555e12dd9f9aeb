//! Change detection between an incoming definition and the latest version.
//!
//! The store writes a new version only when the incoming definition differs
//! materially from the latest stored version for the same name. Header
//! fields are compared by value; parameters and defaults are compared as
//! sets of (name, value) pairs, so ordering never matters and an empty map
//! equals an absent one.
//!
//! Incoming defaults are compared through
//! [`PromptDefinition::effective_defaults`]: orphaned defaults are never
//! persisted, so they must not count as a difference either.
//!
//! # Examples
//!
//! ```
//! use promptdb_core::{PromptDefinition, should_create_version};
//!
//! let def = PromptDefinition::new("myprompt", "text", 500, "sys", "user");
//! assert!(should_create_version(&def, None));
//! ```

use std::fmt;

use serde::Serialize;

use crate::{PromptDefinition, StoredVersion};

/// A field that differs between an incoming definition and a stored version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangedField {
    Model,
    OutputFormat,
    MaxTokens,
    SystemPrompt,
    UserPrompt,
    Parameters,
    Defaults,
}

impl fmt::Display for ChangedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangedField::Model => "model",
            ChangedField::OutputFormat => "output_format",
            ChangedField::MaxTokens => "max_tokens",
            ChangedField::SystemPrompt => "system_prompt",
            ChangedField::UserPrompt => "user_prompt",
            ChangedField::Parameters => "parameters",
            ChangedField::Defaults => "defaults",
        };
        f.write_str(name)
    }
}

/// Returns `true` when `incoming` warrants a new stored version.
///
/// The first version of a name (`latest` is `None`) is always created.
pub fn should_create_version(incoming: &PromptDefinition, latest: Option<&StoredVersion>) -> bool {
    match latest {
        None => true,
        Some(stored) => !changed_fields(incoming, &stored.definition).is_empty(),
    }
}

/// Lists the fields of `incoming` that differ from `stored`.
///
/// The name is not compared: callers look up `stored` by name.
pub fn changed_fields(incoming: &PromptDefinition, stored: &PromptDefinition) -> Vec<ChangedField> {
    let mut changed = Vec::new();

    if incoming.model() != stored.model() {
        changed.push(ChangedField::Model);
    }
    if incoming.output_format() != stored.output_format() {
        changed.push(ChangedField::OutputFormat);
    }
    if incoming.max_tokens() != stored.max_tokens() {
        changed.push(ChangedField::MaxTokens);
    }
    if incoming.system_prompt() != stored.system_prompt() {
        changed.push(ChangedField::SystemPrompt);
    }
    if incoming.user_prompt() != stored.user_prompt() {
        changed.push(ChangedField::UserPrompt);
    }
    if incoming.parameters() != stored.parameters() {
        changed.push(ChangedField::Parameters);
    }
    if !incoming.effective_defaults().eq(stored.effective_defaults()) {
        changed.push(ChangedField::Defaults);
    }

    changed
}
