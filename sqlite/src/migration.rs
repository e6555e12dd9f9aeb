//! Table provisioning and seeding.
//!
//! Provides [`Migration`] for creating, dropping, and seeding the prompt
//! tables. Table creation and removal run in a transaction; seeding goes
//! through [`PromptVersionRepository`], so every seeded file is versioned
//! exactly like a single `add`.
//!
//! # Example
//!
//! ```no_run
//! use promptdb_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("prompts.db").unwrap();
//! let mut migration = Migration::new(conn, "prompt_").unwrap();
//!
//! migration.up().unwrap();
//! let report = migration.seed("prompts/").unwrap();
//! println!("{} created, {} unchanged", report.created, report.unchanged);
//!
//! let status = migration.status().unwrap();
//! assert!(status.tables_exist);
//! ```

use std::path::Path;

use promptdb_loader::load_prompt_dir;
use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::repository::PromptVersionRepository;
use crate::schema::{generate_drop_sql, generate_schema_sql, validate_prefix};

/// Manages the lifecycle of the prompt tables.
pub struct Migration {
    conn: Connection,
    prefix: String,
}

impl Migration {
    /// Creates a new migration manager for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, prefix })
    }

    /// Creates all tables and indexes.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` so it is safe to call multiple times.
    pub fn up(&mut self) -> Result<()> {
        let sql = generate_schema_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| StoreError::MigrationError(format!("failed to create tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "prompt tables created");
        Ok(())
    }

    /// Drops all tables in reverse dependency order.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| StoreError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "prompt tables dropped");
        Ok(())
    }

    /// Reports whether the tables exist and how many rows they hold.
    pub fn status(&self) -> Result<MigrationStatus> {
        if !self.tables_exist()? {
            return Ok(MigrationStatus::default());
        }

        let prompt_count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(DISTINCT name) FROM {}versions", self.prefix),
            [],
            |row| row.get(0),
        )?;

        Ok(MigrationStatus {
            tables_exist: true,
            prompt_count: prompt_count as usize,
            version_count: self.count_rows("versions")?,
            parameter_count: self.count_rows("parameters")?,
            default_count: self.count_rows("parameter_defaults")?,
        })
    }

    /// Adds every prompt file of `source_dir`, in path order.
    ///
    /// Each file is an independent versioned write: a failure stops the seed
    /// but leaves the versions written before it in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::LoaderError`] if a file cannot be loaded, or
    /// [`StoreError::WriteError`] if a write fails.
    pub fn seed(&mut self, source_dir: impl AsRef<Path>) -> Result<SeedReport> {
        let prompts = load_prompt_dir(source_dir)?;
        let repo = PromptVersionRepository::new(&self.conn, self.prefix.as_str())?;

        let mut report = SeedReport::default();
        for prompt in &prompts {
            report.files += 1;
            if repo.add(&prompt.definition)? {
                report.created += 1;
            } else {
                report.unchanged += 1;
            }
        }

        info!(
            files = report.files,
            created = report.created,
            unchanged = report.unchanged,
            "seed complete"
        );
        Ok(report)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn tables_exist(&self) -> Result<bool> {
        let table_name = format!("{}versions", self.prefix);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
            [&table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Counts rows in a prefixed table.
    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}{}", self.prefix, table),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Snapshot of the provisioning state, returned by [`Migration::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    pub tables_exist: bool,
    /// Distinct prompt names.
    pub prompt_count: usize,
    /// Stored versions across all names.
    pub version_count: usize,
    pub parameter_count: usize,
    pub default_count: usize,
}

/// Outcome of [`Migration::seed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Prompt files read.
    pub files: usize,
    /// Files that produced a new version.
    pub created: usize,
    /// Files equal to the latest stored version.
    pub unchanged: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_new_validates_prefix() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "valid_prefix_").is_ok());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "").is_err());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "drop;--").is_err());
    }

    #[test]
    fn test_status_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::new(conn, "prompt_").unwrap();
        assert_eq!(migration.status().unwrap(), MigrationStatus::default());
    }

    #[test]
    fn test_up_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "prompt_").unwrap();
        migration.up().unwrap();
        migration.up().unwrap();
        let status = migration.status().unwrap();
        assert!(status.tables_exist);
        assert_eq!(status.version_count, 0);
    }

    #[test]
    fn test_down_removes_tables() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "prompt_").unwrap();
        migration.up().unwrap();
        migration.down().unwrap();
        assert!(!migration.status().unwrap().tables_exist);
        migration.down().unwrap();
    }

    #[test]
    fn test_prefixes_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");

        let mut a = Migration::new(Connection::open(&path).unwrap(), "a_").unwrap();
        a.up().unwrap();
        let b = Migration::new(Connection::open(&path).unwrap(), "b_").unwrap();
        assert!(a.status().unwrap().tables_exist);
        assert!(!b.status().unwrap().tables_exist);
    }

    #[test]
    fn test_seed_missing_directory_is_loader_error() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "prompt_").unwrap();
        migration.up().unwrap();
        let err = migration.seed("/nonexistent/prompts").unwrap_err();
        assert!(matches!(err, StoreError::LoaderError(_)));
    }
}
