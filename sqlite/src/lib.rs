//! SQLite storage backend for versioned prompt definitions.
//!
//! Every write of a [`PromptDefinition`](promptdb_core::PromptDefinition)
//! is compared with the latest stored version of the same name; a new,
//! immutable version is appended only when something changed. Each version
//! is stored as a header row plus parameter and default rows, and read back
//! through a single outer join that is folded into
//! [`StoredVersion`](promptdb_core::StoredVersion)s.
//!
//! # Architecture
//!
//! - **`schema`**: table and index DDL with customizable prefixes
//! - **`queries`**: the prefixed SQL of every statement, indexed by [`QueryId`]
//! - **`convert`**: row-level reads and inserts
//! - **`writer`**: the transactional, change-detected write path
//! - **`repository`**: the public read/write interface
//! - **`migration`**: provisioning (up/down/status) and seeding from files
//!
//! # Quick start
//!
//! ```no_run
//! use promptdb_sqlite::{Migration, PromptVersionRepository};
//! use rusqlite::Connection;
//!
//! let mut migration = Migration::new(Connection::open("prompts.db").unwrap(), "prompt_").unwrap();
//! migration.up().unwrap();
//! migration.seed("prompts/").unwrap();
//!
//! let conn = migration.into_connection();
//! let repo = PromptVersionRepository::new(&conn, "prompt_").unwrap();
//! for stored in repo.load_latest_per_name().unwrap() {
//!     println!("{} v{}", stored.name(), stored.version);
//! }
//! ```
//!
//! # Concurrency
//!
//! Writers on separate connections to the same database file are
//! serialized by SQLite's write lock, taken at the start of each write.
//! Set [`Connection::busy_timeout`](rusqlite::Connection::busy_timeout) so a
//! writer waits for the lock instead of failing immediately; [`open_store`]
//! does this from a [`StoreConfig`](promptdb_loader::StoreConfig).

mod convert;
mod error;
mod migration;
mod queries;
mod repository;
mod schema;
mod writer;

use promptdb_loader::StoreConfig;
use rusqlite::Connection;

pub use error::{Result, StoreError};
pub use migration::{Migration, MigrationStatus, SeedReport};
pub use queries::{QueryCatalog, QueryId};
pub use repository::PromptVersionRepository;
pub use schema::{generate_drop_sql, generate_schema_sql};
pub use writer::VersionedWriter;

/// Opens the database named by `config` with its busy timeout applied.
///
/// # Errors
///
/// Returns [`StoreError::DatabaseError`] if the file cannot be opened.
pub fn open_store(config: &StoreConfig) -> Result<Connection> {
    let conn = Connection::open(&config.path)?;
    conn.busy_timeout(config.busy_timeout())?;
    Ok(conn)
}
