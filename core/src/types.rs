//! Prompt definition and stored version types.
//!
//! A [`PromptDefinition`] is the logical entity handed to the store: a header
//! (name, model, output format, token budget, prompt texts) plus a parameter
//! map and a default-value map. A [`StoredVersion`] is one persisted,
//! immutable snapshot of a definition together with the storage-assigned
//! surrogate key and timestamps.
//!
//! Both maps are [`BTreeMap`]s: they are semantically unordered bags of
//! name → value, and the ordered representation keeps equality and
//! serialization deterministic.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Parameter or default map keyed by parameter name.
pub type ValueMap = BTreeMap<String, String>;

/// Surrogate key of a stored version, assigned by the storage backend.
///
/// Ids are monotonically increasing; for a given prompt name the version
/// with the greatest id is the latest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionId(pub i64);

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A prompt definition as supplied by the caller.
///
/// Definitions are immutable once built: use [`PromptDefinition::new`] and
/// the consuming `with_*` builders, then read through the accessors. Every
/// write to the store produces a new version instead of editing an old one.
///
/// # Examples
///
/// ```
/// use promptdb_core::PromptDefinition;
///
/// let def = PromptDefinition::new("summarize", "text", 500, "You are terse.", "Summarize {{doc}}")
///     .with_model("gpt-4o")
///     .with_parameter("doc", "string")
///     .with_default("doc", "(empty)");
///
/// assert_eq!(def.name(), "summarize");
/// assert_eq!(def.model(), Some("gpt-4o"));
/// assert_eq!(def.parameters().get("doc").map(String::as_str), Some("string"));
/// assert_eq!(def.defaults().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptDefinition {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    output_format: String,
    max_tokens: u32,
    system_prompt: String,
    user_prompt: String,
    parameters: ValueMap,
    defaults: ValueMap,
}

impl PromptDefinition {
    /// Creates a definition with the mandatory header fields and no
    /// parameters, defaults, or model.
    pub fn new(
        name: impl Into<String>,
        output_format: impl Into<String>,
        max_tokens: u32,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: None,
            output_format: output_format.into(),
            max_tokens,
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            parameters: ValueMap::new(),
            defaults: ValueMap::new(),
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets an optional model, clearing it when `None`.
    pub fn with_optional_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Adds (or replaces) a single parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Replaces the full parameter map.
    pub fn with_parameters(mut self, parameters: ValueMap) -> Self {
        self.parameters = parameters;
        self
    }

    /// Adds (or replaces) a single default value.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Replaces the full default map.
    pub fn with_defaults(mut self, defaults: ValueMap) -> Self {
        self.defaults = defaults;
        self
    }

    /// Logical prompt name, shared by all versions of the prompt.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn output_format(&self) -> &str {
        &self.output_format
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn user_prompt(&self) -> &str {
        &self.user_prompt
    }

    pub fn parameters(&self) -> &ValueMap {
        &self.parameters
    }

    /// Default values as supplied, including orphaned entries.
    pub fn defaults(&self) -> &ValueMap {
        &self.defaults
    }

    /// Defaults whose name is a key of the parameter map.
    ///
    /// This is what the store persists; orphaned defaults are dropped.
    pub fn effective_defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults
            .iter()
            .filter(|(name, _)| self.parameters.contains_key(name.as_str()))
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Names of defaults that reference no parameter.
    pub fn orphaned_defaults(&self) -> impl Iterator<Item = &str> {
        self.defaults
            .keys()
            .filter(|name| !self.parameters.contains_key(name.as_str()))
            .map(String::as_str)
    }
}

/// Header columns of a stored version, as read from a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHeader {
    pub version_id: VersionId,
    pub name: String,
    pub version: u32,
    pub model: Option<String>,
    pub output_format: String,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub user_prompt: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// One row of the header × parameters × defaults outer join.
///
/// Header data repeats once per parameter row; the child columns are `None`
/// for a version without parameters, and `default_value` is `None` for a
/// parameter without a default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub header: VersionHeader,
    pub parameter_name: Option<String>,
    pub parameter_value: Option<String>,
    pub default_value: Option<String>,
}

/// A persisted snapshot of a [`PromptDefinition`].
///
/// Versions are append-only: once committed they are never updated or
/// deleted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredVersion {
    /// Storage-assigned surrogate key.
    pub version_id: VersionId,
    /// Per-name ordinal, starting at 1.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// The stored definition.
    pub definition: PromptDefinition,
}

impl StoredVersion {
    /// Seeds a version from its header with empty parameter and default maps.
    pub fn from_header(header: VersionHeader) -> Self {
        let definition = PromptDefinition::new(
            header.name,
            header.output_format,
            header.max_tokens,
            header.system_prompt,
            header.user_prompt,
        )
        .with_optional_model(header.model);

        Self {
            version_id: header.version_id,
            version: header.version,
            created_at: header.created_at,
            modified_at: header.modified_at,
            definition,
        }
    }

    /// Logical prompt name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }
}

/// Result of recording a definition in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    /// Whether a new version was written.
    pub created: bool,
    /// Id of the new version, or of the unchanged latest version.
    pub version_id: VersionId,
    /// Per-name ordinal of that version.
    pub version: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(id: i64) -> VersionHeader {
        let now = Utc::now();
        VersionHeader {
            version_id: VersionId(id),
            name: "greeting".to_string(),
            version: 1,
            model: Some("gpt-4".to_string()),
            output_format: "text".to_string(),
            max_tokens: 128,
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            created_at: now,
            modified_at: now,
        }
    }

    #[test]
    fn test_builder_sets_fields() {
        let def = PromptDefinition::new("p", "json", 10, "s", "u")
            .with_model("m")
            .with_parameter("a", "1")
            .with_default("a", "x");

        assert_eq!(def.name(), "p");
        assert_eq!(def.output_format(), "json");
        assert_eq!(def.max_tokens(), 10);
        assert_eq!(def.model(), Some("m"));
        assert_eq!(def.system_prompt(), "s");
        assert_eq!(def.user_prompt(), "u");
        assert_eq!(def.parameters().len(), 1);
        assert_eq!(def.defaults().len(), 1);
    }

    #[test]
    fn test_effective_defaults_skip_orphans() {
        let def = PromptDefinition::new("p", "json", 10, "s", "u")
            .with_parameter("a", "1")
            .with_default("a", "x")
            .with_default("ghost", "y");

        let effective: Vec<_> = def.effective_defaults().collect();
        assert_eq!(effective, vec![("a", "x")]);
        let orphans: Vec<_> = def.orphaned_defaults().collect();
        assert_eq!(orphans, vec!["ghost"]);
    }

    #[test]
    fn test_from_header_copies_fields() {
        let stored = StoredVersion::from_header(header(7));
        assert_eq!(stored.version_id, VersionId(7));
        assert_eq!(stored.name(), "greeting");
        assert_eq!(stored.definition.model(), Some("gpt-4"));
        assert!(stored.definition.parameters().is_empty());
        assert!(stored.definition.defaults().is_empty());
    }

    #[test]
    fn test_definition_serializes_without_missing_model() {
        let def = PromptDefinition::new("p", "text", 1, "s", "u");
        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("model").is_none());
        assert_eq!(json["max_tokens"], 1);
    }
}
