//! Prompt definition validation.
//!
//! Reports structural problems in a [`PromptDefinition`] before it reaches
//! the store. Orphaned defaults are reported as findings but are not fatal
//! to a write: the store drops them and keeps going.
//!
//! # Examples
//!
//! ```
//! use promptdb_core::*;
//!
//! let def = PromptDefinition::new("greet", "text", 100, "sys", "user")
//!     .with_parameter("who", "string");
//! assert!(validate_definition(&def).is_empty());
//!
//! let orphan = def.clone().with_default("ghost", "boo");
//! assert_eq!(
//!     validate_definition(&orphan),
//!     vec![ValidationError::OrphanedDefault("ghost".into())]
//! );
//! ```

use thiserror::Error;

use crate::PromptDefinition;

/// Definition validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Prompt name is empty or whitespace-only.
    #[error("prompt name cannot be empty")]
    EmptyName,
    /// Output format is empty or whitespace-only.
    #[error("output format cannot be empty")]
    EmptyOutputFormat,
    /// A parameter key is empty or whitespace-only.
    #[error("parameter name cannot be empty")]
    EmptyParameterName,
    /// A default refers to a parameter that is not declared.
    #[error("default for undeclared parameter: {0}")]
    OrphanedDefault(String),
}

impl ValidationError {
    /// Whether the store refuses definitions carrying this error.
    ///
    /// Orphaned defaults are dropped at write time instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ValidationError::OrphanedDefault(_))
    }
}

/// Validates a prompt definition, returning every problem found.
pub fn validate_definition(definition: &PromptDefinition) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if definition.name().trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    if definition.output_format().trim().is_empty() {
        errors.push(ValidationError::EmptyOutputFormat);
    }
    if definition
        .parameters()
        .keys()
        .any(|name| name.trim().is_empty())
    {
        errors.push(ValidationError::EmptyParameterName);
    }

    errors.extend(
        definition
            .orphaned_defaults()
            .map(|name| ValidationError::OrphanedDefault(name.to_string())),
    );

    errors
}
