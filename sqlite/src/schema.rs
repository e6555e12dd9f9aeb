//! SQL schema generation with customizable table prefixes.
//!
//! Generates the `CREATE TABLE` and `CREATE INDEX` statements for the three
//! tables of a prompt store. All names are prefixed with a configurable
//! string so several isolated stores can share one SQLite database.
//!
//! # Table structure
//!
//! - `{prefix}versions`: one header row per stored version; many rows per
//!   prompt name, ordered by `id`, with a per-name `version` ordinal
//! - `{prefix}parameters`: parameters of exactly one version
//! - `{prefix}parameter_defaults`: at most one default per parameter row
//!
//! Child rows reference their parent's surrogate key with `ON DELETE
//! CASCADE`, so a parameter or default can never exist without its version.
//! `UNIQUE (name, version)` stops the database from ever holding two rows
//! for the same version of a prompt.

use crate::error::{Result, StoreError};

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(StoreError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Generates the complete SQL schema for all tables with the given prefix.
///
/// # Errors
///
/// Returns [`StoreError::InvalidPrefix`] if the prefix contains characters
/// other than alphanumerics and underscores, or if it is empty.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
CREATE TABLE IF NOT EXISTS {prefix}versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    version INTEGER NOT NULL CHECK (version >= 1),
    model TEXT,
    output_format TEXT NOT NULL DEFAULT '',
    max_tokens INTEGER NOT NULL CHECK (max_tokens >= 0),
    system_prompt TEXT NOT NULL DEFAULT '',
    user_prompt TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    modified_at TEXT NOT NULL,
    UNIQUE (name, version)
);

CREATE TABLE IF NOT EXISTS {prefix}parameters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    UNIQUE (version_id, name),
    FOREIGN KEY (version_id) REFERENCES {prefix}versions(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}parameter_defaults (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parameter_id INTEGER NOT NULL UNIQUE,
    value TEXT NOT NULL,
    FOREIGN KEY (parameter_id) REFERENCES {prefix}parameters(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_{prefix}versions_name ON {prefix}versions(name, id);
CREATE INDEX IF NOT EXISTS idx_{prefix}parameters_version ON {prefix}parameters(version_id);
"#,
        prefix = prefix
    );

    Ok(sql)
}

/// Generates SQL to drop all schema tables in reverse dependency order.
///
/// # Errors
///
/// Returns [`StoreError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
DROP TABLE IF EXISTS {prefix}parameter_defaults;
DROP TABLE IF EXISTS {prefix}parameters;
DROP TABLE IF EXISTS {prefix}versions;
"#,
        prefix = prefix
    );

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prefix() {
        assert!(validate_prefix("prompt_").is_ok());
        assert!(validate_prefix("test123").is_ok());
        assert!(validate_prefix("A_B_C").is_ok());
    }

    #[test]
    fn test_invalid_prefix_empty() {
        assert!(validate_prefix("").is_err());
    }

    #[test]
    fn test_invalid_prefix_special_chars() {
        assert!(validate_prefix("drop;--").is_err());
        assert!(validate_prefix("hello world").is_err());
        assert!(validate_prefix("test-prefix").is_err());
    }

    #[test]
    fn test_generate_schema_sql_contains_tables() {
        let sql = generate_schema_sql("p_").unwrap();
        assert!(sql.contains("p_versions"));
        assert!(sql.contains("p_parameters"));
        assert!(sql.contains("p_parameter_defaults"));
        assert!(sql.contains("idx_p_versions_name"));
        assert!(sql.contains("idx_p_parameters_version"));
    }

    #[test]
    fn test_generate_drop_sql_contains_all_tables() {
        let sql = generate_drop_sql("p_").unwrap();
        assert!(sql.contains("DROP TABLE IF EXISTS p_versions"));
        assert!(sql.contains("DROP TABLE IF EXISTS p_parameters"));
        assert!(sql.contains("DROP TABLE IF EXISTS p_parameter_defaults"));
    }

    #[test]
    fn test_generate_drop_sql_invalid_prefix() {
        assert!(generate_drop_sql("").is_err());
    }

    fn provisioned() -> rusqlite::Connection {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(&generate_schema_sql("t_").unwrap())
            .unwrap();
        conn
    }

    fn insert_version(conn: &rusqlite::Connection, name: &str, version: i64) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO t_versions (name, version, output_format, max_tokens, system_prompt, user_prompt, created_at, modified_at) \
             VALUES (?1, ?2, 'text', 10, 's', 'u', '2024-01-01', '2024-01-01')",
            rusqlite::params![name, version],
        )
    }

    #[test]
    fn test_same_name_and_version_is_rejected() {
        let conn = provisioned();
        assert!(insert_version(&conn, "p", 1).is_ok());
        assert!(insert_version(&conn, "p", 2).is_ok());
        assert!(insert_version(&conn, "q", 1).is_ok());
        assert!(insert_version(&conn, "p", 1).is_err());
    }

    #[test]
    fn test_parameter_requires_existing_version() {
        let conn = provisioned();
        let orphan = conn.execute(
            "INSERT INTO t_parameters (version_id, name, value) VALUES (42, 'a', 'string')",
            [],
        );
        assert!(orphan.is_err());
    }

    #[test]
    fn test_deleting_version_cascades_to_children() {
        let conn = provisioned();
        insert_version(&conn, "p", 1).unwrap();
        let version_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO t_parameters (version_id, name, value) VALUES (?1, 'a', 'string')",
            [version_id],
        )
        .unwrap();
        let parameter_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO t_parameter_defaults (parameter_id, value) VALUES (?1, 'x')",
            [parameter_id],
        )
        .unwrap();

        conn.execute("DELETE FROM t_versions", []).unwrap();
        let remaining: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM t_parameters) + (SELECT COUNT(*) FROM t_parameter_defaults)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
