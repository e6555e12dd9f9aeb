//! Prompt file parsing and serialization.
//!
//! A prompt file is a YAML document describing one prompt definition:
//!
//! ```yaml
//! model: gpt-4
//! config:
//!   name: TestPrompt
//!   outputFormat: json
//!   maxTokens: 200
//!   input:
//!     parameters:
//!       param1: value1
//!     default:
//!       param1: default1
//! prompts:
//!   system: System message
//!   user: User message
//! ```
//!
//! `model` and `config.input` are optional; every other key is mandatory.
//! Parsing goes through an all-optional raw structure first so that any
//! absent mandatory key surfaces as a single
//! [`MissingField`](crate::LoaderError::MissingField) error carrying its
//! dotted path. Scalar parameter and default values (strings, numbers,
//! booleans) are stored as text.

use std::collections::BTreeMap;
use std::path::Path;

use promptdb_core::{PromptDefinition, ValueMap};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{LoaderError, Result};

/// A validated prompt file.
///
/// # Examples
///
/// ```
/// use promptdb_loader::PromptFile;
///
/// let yaml = r#"
/// config:
///   name: greet
///   outputFormat: text
///   maxTokens: 64
/// prompts:
///   system: Be kind.
///   user: Say hi to {{who}}.
/// "#;
///
/// let file = PromptFile::from_yaml_str(yaml).unwrap();
/// let def = file.into_definition();
/// assert_eq!(def.name(), "greet");
/// assert_eq!(def.model(), None);
/// assert!(def.parameters().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub config: PromptConfig,
    pub prompts: Prompts,
}

/// The `config` section of a prompt file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    pub name: String,
    pub output_format: String,
    pub max_tokens: u32,
    pub input: InputSchema,
}

/// Declared parameters and their default values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputSchema {
    pub parameters: ValueMap,
    pub default: ValueMap,
}

/// System and user prompt templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompts {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Deserialize)]
struct RawPromptFile {
    model: Option<String>,
    config: Option<RawConfig>,
    prompts: Option<RawPrompts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    name: Option<String>,
    output_format: Option<String>,
    max_tokens: Option<u32>,
    input: Option<RawInput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    parameters: Option<BTreeMap<String, Value>>,
    default: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawPrompts {
    system: Option<String>,
    user: Option<String>,
}

impl PromptFile {
    /// Reads and parses a prompt file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::FileNotFound`] if `path` does not exist,
    /// [`LoaderError::IoError`] if it cannot be read, and any error of
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parses a prompt file from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::YamlError`] for malformed YAML or wrongly typed
    /// values (e.g. a non-numeric `maxTokens`), [`LoaderError::MissingField`]
    /// for an absent mandatory key, and [`LoaderError::InvalidValue`] for a
    /// non-scalar parameter or default value.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: RawPromptFile = serde_yaml::from_str(text)?;

        let config = raw.config.ok_or_else(|| missing("config"))?;
        let prompts = raw.prompts.ok_or_else(|| missing("prompts"))?;

        let input = match config.input {
            Some(input) => InputSchema {
                parameters: scalar_map("config.input.parameters", input.parameters)?,
                default: scalar_map("config.input.default", input.default)?,
            },
            None => InputSchema::default(),
        };

        Ok(Self {
            model: raw.model,
            config: PromptConfig {
                name: config.name.ok_or_else(|| missing("config.name"))?,
                output_format: config
                    .output_format
                    .ok_or_else(|| missing("config.outputFormat"))?,
                max_tokens: config
                    .max_tokens
                    .ok_or_else(|| missing("config.maxTokens"))?,
                input,
            },
            prompts: Prompts {
                system: prompts.system.ok_or_else(|| missing("prompts.system"))?,
                user: prompts.user.ok_or_else(|| missing("prompts.user"))?,
            },
        })
    }

    /// Builds the file representation of a definition.
    pub fn from_definition(definition: &PromptDefinition) -> Self {
        Self {
            model: definition.model().map(String::from),
            config: PromptConfig {
                name: definition.name().to_string(),
                output_format: definition.output_format().to_string(),
                max_tokens: definition.max_tokens(),
                input: InputSchema {
                    parameters: definition.parameters().clone(),
                    default: definition.defaults().clone(),
                },
            },
            prompts: Prompts {
                system: definition.system_prompt().to_string(),
                user: definition.user_prompt().to_string(),
            },
        }
    }

    /// Converts the file into an immutable [`PromptDefinition`].
    pub fn into_definition(self) -> PromptDefinition {
        PromptDefinition::new(
            self.config.name,
            self.config.output_format,
            self.config.max_tokens,
            self.prompts.system,
            self.prompts.user,
        )
        .with_optional_model(self.model)
        .with_parameters(self.config.input.parameters)
        .with_defaults(self.config.input.default)
    }

    /// Serializes the file back to YAML in the same layout it is read from.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::YamlError`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn missing(path: &str) -> LoaderError {
    LoaderError::MissingField(path.to_string())
}

fn scalar_map(field: &str, raw: Option<BTreeMap<String, Value>>) -> Result<ValueMap> {
    let mut map = ValueMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = match value {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s,
            _ => {
                return Err(LoaderError::InvalidValue {
                    field: format!("{field}.{key}"),
                    reason: "expected a scalar value".to_string(),
                });
            }
        };
        map.insert(key, text);
    }
    Ok(map)
}
