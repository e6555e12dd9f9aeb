//! Store configuration.
//!
//! Defines the YAML-serializable settings used to open a prompt store:
//! the database file, the table prefix, and how long a writer waits for the
//! database write lock held by another connection.
//!
//! # Example YAML
//!
//! ```yaml
//! path: /var/lib/promptdb/prompts.db
//! table_prefix: prompt_
//! busy_timeout_ms: 5000
//! ```
//!
//! Only `path` is required. Unknown keys are ignored.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default prefix for the store's tables.
pub const DEFAULT_TABLE_PREFIX: &str = "prompt_";

/// Default time a writer waits on a locked database, in milliseconds.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Settings for opening a prompt store.
///
/// # Examples
///
/// ```
/// use promptdb_loader::{DEFAULT_TABLE_PREFIX, StoreConfig};
///
/// let config: StoreConfig = serde_yaml::from_str("path: prompts.db").unwrap();
/// assert_eq!(config.table_prefix, DEFAULT_TABLE_PREFIX);
/// assert_eq!(config.busy_timeout().as_millis(), 5_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
    /// Prefix prepended to every table and index name.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    /// How long a writer waits for another connection's write lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_table_prefix() -> String {
    DEFAULT_TABLE_PREFIX.to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl StoreConfig {
    /// Creates a configuration for `path` with default prefix and timeout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table_prefix: default_table_prefix(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::LoaderError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::LoaderError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::LoaderError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Busy timeout as a [`Duration`].
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
