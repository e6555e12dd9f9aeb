//! Error types for SQLite prompt store operations.
//!
//! Provides a unified error type covering database access, the
//! transactional write path, row conversion, and table provisioning.

use thiserror::Error;

/// Errors that can occur during prompt store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// The transactional write of a prompt version failed and was rolled back.
    #[error("error inserting data for prompt '{name}': {source}")]
    WriteError {
        name: String,
        #[source]
        source: Box<StoreError>,
    },

    /// The definition fails validation and is refused before any write.
    #[error("invalid prompt definition: {0}")]
    InvalidDefinition(#[from] promptdb_core::ValidationError),

    /// A stored row cannot be converted into a prompt version.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// Table provisioning failure.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Error loading prompt files for seeding.
    #[error("loader error: {0}")]
    LoaderError(#[from] promptdb_loader::LoaderError),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
