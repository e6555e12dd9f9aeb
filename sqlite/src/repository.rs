//! Runtime access to stored prompt versions.
//!
//! Provides [`PromptVersionRepository`], the entry point for writing and
//! reading prompt versions in the prefixed SQLite tables.
//!
//! # Example
//!
//! ```no_run
//! use promptdb_core::PromptDefinition;
//! use promptdb_sqlite::PromptVersionRepository;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("prompts.db").unwrap();
//! let repo = PromptVersionRepository::new(&conn, "prompt_").unwrap();
//!
//! let def = PromptDefinition::new("summarize", "text", 500, "Be brief.", "Summarize {{doc}}")
//!     .with_parameter("doc", "string");
//! let created = repo.add(&def).unwrap();
//! assert!(created);
//!
//! // Adding the same definition again is a no-op
//! assert!(!repo.add(&def).unwrap());
//!
//! let latest = repo.get_latest_by_name("summarize").unwrap().unwrap();
//! assert_eq!(latest.version, 1);
//! ```

use promptdb_core::{AddOutcome, PromptDefinition, StoredVersion};
use rusqlite::Connection;

use crate::convert;
use crate::error::Result;
use crate::queries::QueryCatalog;
use crate::writer::VersionedWriter;

/// Versioned prompt storage over a borrowed connection.
///
/// Writes are append-only: [`add`](Self::add) stores a new version only when
/// the definition differs from the latest stored one. Reads always return
/// the latest version of a name.
pub struct PromptVersionRepository<'a> {
    conn: &'a Connection,
    catalog: QueryCatalog,
}

impl<'a> PromptVersionRepository<'a> {
    /// Creates a repository for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPrefix`](crate::StoreError::InvalidPrefix)
    /// if the prefix is invalid.
    pub fn new(conn: &'a Connection, prefix: impl Into<String>) -> Result<Self> {
        let catalog = QueryCatalog::new(prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, catalog })
    }

    /// Stores `definition` if it differs from the latest stored version.
    ///
    /// Returns `true` when a new version was written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteError`](crate::StoreError::WriteError) if
    /// the write failed; nothing is stored in that case.
    pub fn add(&self, definition: &PromptDefinition) -> Result<bool> {
        Ok(self.add_version(definition)?.created)
    }

    /// Like [`add`](Self::add), also reporting the id and ordinal of the
    /// resulting latest version.
    pub fn add_version(&self, definition: &PromptDefinition) -> Result<AddOutcome> {
        VersionedWriter::new(self.conn, &self.catalog).add(definition)
    }

    /// Loads the latest version of every stored name, ordered by version id.
    pub fn load_latest_per_name(&self) -> Result<Vec<StoredVersion>> {
        convert::fetch_latest_per_name(self.conn, &self.catalog)
    }

    /// Loads the latest version of `name`.
    ///
    /// Returns `None` if no version of `name` was ever stored.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use promptdb_sqlite::PromptVersionRepository;
    /// # use rusqlite::Connection;
    /// # let conn = Connection::open("prompts.db").unwrap();
    /// # let repo = PromptVersionRepository::new(&conn, "prompt_").unwrap();
    /// match repo.get_latest_by_name("classify").unwrap() {
    ///     Some(stored) => println!("v{} has {} parameters", stored.version, stored.definition.parameters().len()),
    ///     None => println!("classify not found"),
    /// }
    /// ```
    pub fn get_latest_by_name(&self, name: &str) -> Result<Option<StoredVersion>> {
        convert::fetch_latest(self.conn, &self.catalog, name)
    }

    /// Number of stored versions of `name`.
    pub fn version_count(&self, name: &str) -> Result<usize> {
        convert::count_versions(self.conn, &self.catalog, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::generate_schema_sql;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_schema_sql("r_").unwrap()).unwrap();
        conn
    }

    #[test]
    fn test_new_validates_prefix() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(PromptVersionRepository::new(&conn, "ok_").is_ok());
        assert!(PromptVersionRepository::new(&conn, "").is_err());
        assert!(PromptVersionRepository::new(&conn, "x y").is_err());
    }

    #[test]
    fn test_new_enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        PromptVersionRepository::new(&conn, "r_").unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_add_reports_creation() {
        let conn = setup();
        let repo = PromptVersionRepository::new(&conn, "r_").unwrap();
        let def = PromptDefinition::new("p", "text", 5, "s", "u");
        assert!(repo.add(&def).unwrap());
        assert!(!repo.add(&def).unwrap());
        assert_eq!(repo.version_count("p").unwrap(), 1);
    }

    #[test]
    fn test_missing_tables_surface_as_write_error() {
        let conn = Connection::open_in_memory().unwrap();
        let repo = PromptVersionRepository::new(&conn, "r_").unwrap();
        let err = repo.add(&PromptDefinition::new("p", "text", 5, "s", "u")).unwrap_err();
        assert!(err.to_string().contains("error inserting data for prompt 'p'"));
    }
}
