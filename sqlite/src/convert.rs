//! Row-level transformations between prompt types and SQL rows.
//!
//! Reading goes through the flat outer-join shape: every query of the
//! `Latest*` family yields one [`FlatRow`] per parameter (or one bare row
//! for a version without parameters), which [`assemble`] folds back into
//! [`StoredVersion`]s. Writing inserts one row per header, parameter, and
//! default.

use chrono::{DateTime, Utc};
use promptdb_core::{FlatRow, PromptDefinition, StoredVersion, VersionHeader, VersionId, assemble};
use rusqlite::{Connection, Params, Row, params};

use crate::error::{Result, StoreError};
use crate::queries::{QueryCatalog, QueryId};

/// Columns of one joined row, before integer range checks.
struct RawRow {
    id: i64,
    name: String,
    version: i64,
    model: Option<String>,
    output_format: String,
    max_tokens: i64,
    system_prompt: String,
    user_prompt: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    parameter_name: Option<String>,
    parameter_value: Option<String>,
    default_value: Option<String>,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        model: row.get(3)?,
        output_format: row.get(4)?,
        max_tokens: row.get(5)?,
        system_prompt: row.get(6)?,
        user_prompt: row.get(7)?,
        created_at: row.get(8)?,
        modified_at: row.get(9)?,
        parameter_name: row.get(10)?,
        parameter_value: row.get(11)?,
        default_value: row.get(12)?,
    })
}

impl RawRow {
    fn into_flat_row(self) -> Result<FlatRow> {
        let version = u32::try_from(self.version).map_err(|_| {
            StoreError::ConversionError(format!(
                "version {} of prompt '{}' is out of range",
                self.version, self.name
            ))
        })?;
        let max_tokens = u32::try_from(self.max_tokens).map_err(|_| {
            StoreError::ConversionError(format!(
                "maxTokens {} of prompt '{}' is out of range",
                self.max_tokens, self.name
            ))
        })?;

        Ok(FlatRow {
            header: VersionHeader {
                version_id: VersionId(self.id),
                name: self.name,
                version,
                model: self.model,
                output_format: self.output_format,
                max_tokens,
                system_prompt: self.system_prompt,
                user_prompt: self.user_prompt,
                created_at: self.created_at,
                modified_at: self.modified_at,
            },
            parameter_name: self.parameter_name,
            parameter_value: self.parameter_value,
            default_value: self.default_value,
        })
    }
}

/// Runs a joined query and converts every row.
fn query_flat_rows<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<FlatRow>> {
    let mut stmt = conn.prepare(sql)?;
    let raw = stmt
        .query_map(params, raw_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    raw.into_iter().map(RawRow::into_flat_row).collect()
}

/// Loads the latest version of `name`, or `None` if it was never stored.
pub(crate) fn fetch_latest(
    conn: &Connection,
    catalog: &QueryCatalog,
    name: &str,
) -> Result<Option<StoredVersion>> {
    let rows = query_flat_rows(conn, catalog.sql(QueryId::LatestByName), params![name])?;
    Ok(assemble(rows).into_iter().next())
}

/// Loads the latest version of every stored name, ordered by version id.
pub(crate) fn fetch_latest_per_name(
    conn: &Connection,
    catalog: &QueryCatalog,
) -> Result<Vec<StoredVersion>> {
    let rows = query_flat_rows(conn, catalog.sql(QueryId::LatestPerName), [])?;
    Ok(assemble(rows))
}

pub(crate) fn count_versions(conn: &Connection, catalog: &QueryCatalog, name: &str) -> Result<usize> {
    let count: i64 = conn.query_row(catalog.sql(QueryId::CountVersions), params![name], |row| {
        row.get(0)
    })?;
    Ok(count as usize)
}

/// Inserts a version header and returns its surrogate key.
pub(crate) fn insert_version(
    conn: &Connection,
    catalog: &QueryCatalog,
    definition: &PromptDefinition,
    version: u32,
    now: DateTime<Utc>,
) -> Result<VersionId> {
    conn.execute(
        catalog.sql(QueryId::InsertVersion),
        params![
            definition.name(),
            version,
            definition.model(),
            definition.output_format(),
            definition.max_tokens(),
            definition.system_prompt(),
            definition.user_prompt(),
            now,
            now,
        ],
    )?;
    Ok(VersionId(conn.last_insert_rowid()))
}

/// Inserts one parameter row and returns its surrogate key.
pub(crate) fn insert_parameter(
    conn: &Connection,
    catalog: &QueryCatalog,
    version_id: VersionId,
    name: &str,
    value: &str,
) -> Result<i64> {
    conn.execute(
        catalog.sql(QueryId::InsertParameter),
        params![version_id.0, name, value],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_default(
    conn: &Connection,
    catalog: &QueryCatalog,
    parameter_id: i64,
    value: &str,
) -> Result<()> {
    conn.execute(catalog.sql(QueryId::InsertDefault), params![parameter_id, value])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::generate_schema_sql;

    fn setup() -> (Connection, QueryCatalog) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_schema_sql("c_").unwrap()).unwrap();
        (conn, QueryCatalog::new("c_").unwrap())
    }

    #[test]
    fn test_insert_and_fetch_latest() {
        let (conn, catalog) = setup();
        let def = PromptDefinition::new("p", "json", 200, "sys", "usr")
            .with_model("gpt-4")
            .with_parameter("a", "string")
            .with_parameter("b", "number")
            .with_default("a", "hello");

        let id = insert_version(&conn, &catalog, &def, 1, Utc::now()).unwrap();
        let a = insert_parameter(&conn, &catalog, id, "a", "string").unwrap();
        insert_parameter(&conn, &catalog, id, "b", "number").unwrap();
        insert_default(&conn, &catalog, a, "hello").unwrap();

        let latest = fetch_latest(&conn, &catalog, "p").unwrap().unwrap();
        assert_eq!(latest.version_id, id);
        assert_eq!(latest.version, 1);
        assert_eq!(latest.definition, def);
    }

    #[test]
    fn test_fetch_latest_unknown_name() {
        let (conn, catalog) = setup();
        assert!(fetch_latest(&conn, &catalog, "missing").unwrap().is_none());
        assert_eq!(count_versions(&conn, &catalog, "missing").unwrap(), 0);
    }

    #[test]
    fn test_version_without_parameters_is_loaded() {
        let (conn, catalog) = setup();
        let def = PromptDefinition::new("bare", "text", 10, "s", "u");
        insert_version(&conn, &catalog, &def, 1, Utc::now()).unwrap();

        let all = fetch_latest_per_name(&conn, &catalog).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].definition.parameters().is_empty());
        assert_eq!(all[0].definition.model(), None);
    }

    #[test]
    fn test_timestamps_survive_storage() {
        let (conn, catalog) = setup();
        let now = Utc::now();
        let def = PromptDefinition::new("t", "text", 10, "s", "u");
        insert_version(&conn, &catalog, &def, 1, now).unwrap();

        let latest = fetch_latest(&conn, &catalog, "t").unwrap().unwrap();
        assert_eq!(latest.created_at, now);
        assert_eq!(latest.modified_at, now);
    }

    #[test]
    fn test_negative_max_tokens_is_conversion_error() {
        let (conn, catalog) = setup();
        conn.execute_batch(
            "PRAGMA ignore_check_constraints = ON;
             INSERT INTO c_versions (name, version, output_format, max_tokens, system_prompt, user_prompt, created_at, modified_at)
             VALUES ('neg', 1, 'text', -5, 's', 'u', '2024-01-01 00:00:00+00:00', '2024-01-01 00:00:00+00:00');",
        )
        .unwrap();

        let err = fetch_latest(&conn, &catalog, "neg").unwrap_err();
        assert!(matches!(err, StoreError::ConversionError(_)));
    }
}
