//! Error types for prompt file and configuration loading.
//!
//! Provides a unified error type covering I/O, YAML parsing, and the
//! structural checks applied to prompt files.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading prompt files or store configuration.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure, including wrongly typed values.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The requested file does not exist.
    #[error("the specified file was not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A mandatory key is absent; holds the dotted key path.
    #[error("mandatory key not present: {0}")]
    MissingField(String),

    /// A key is present but its value cannot be used.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Convenience alias for results with [`LoaderError`].
pub type Result<T> = std::result::Result<T, LoaderError>;
