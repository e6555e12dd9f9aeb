//! Prefixed SQL text for every statement the store runs.
//!
//! Each statement is identified by a [`QueryId`] and rendered once, when the
//! [`QueryCatalog`] is built, by substituting the validated table prefix into
//! its template. Lookups afterwards are a plain array index.

use crate::error::Result;
use crate::schema::validate_prefix;

/// Identifies one statement of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryId {
    /// Outer join of the latest version of every name with its children.
    LatestPerName,
    /// Outer join of the latest version of one name (`?1`) with its children.
    LatestByName,
    /// Inserts a version header.
    InsertVersion,
    /// Inserts one parameter of a version.
    InsertParameter,
    /// Inserts the default value of one parameter.
    InsertDefault,
    /// Counts the stored versions of one name (`?1`).
    CountVersions,
}

const QUERY_COUNT: usize = 6;

impl QueryId {
    /// Every identifier, in discriminant order.
    pub const ALL: [QueryId; QUERY_COUNT] = [
        QueryId::LatestPerName,
        QueryId::LatestByName,
        QueryId::InsertVersion,
        QueryId::InsertParameter,
        QueryId::InsertDefault,
        QueryId::CountVersions,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn template(self) -> &'static str {
        match self {
            QueryId::LatestPerName => LATEST_PER_NAME,
            QueryId::LatestByName => LATEST_BY_NAME,
            QueryId::InsertVersion => INSERT_VERSION,
            QueryId::InsertParameter => INSERT_PARAMETER,
            QueryId::InsertDefault => INSERT_DEFAULT,
            QueryId::CountVersions => COUNT_VERSIONS,
        }
    }
}

const PLACEHOLDER: &str = "{prefix}";

// Column order is relied upon by `convert::raw_row`.
const JOINED_COLUMNS: &str = "h.id, h.name, h.version, h.model, h.output_format, h.max_tokens, \
     h.system_prompt, h.user_prompt, h.created_at, h.modified_at, \
     p.name, p.value, d.value";

const LATEST_PER_NAME: &str = "SELECT {columns}
FROM {prefix}versions h
LEFT JOIN {prefix}parameters p ON p.version_id = h.id
LEFT JOIN {prefix}parameter_defaults d ON d.parameter_id = p.id
WHERE h.id IN (SELECT MAX(id) FROM {prefix}versions GROUP BY name)
ORDER BY h.id, p.id";

const LATEST_BY_NAME: &str = "SELECT {columns}
FROM {prefix}versions h
LEFT JOIN {prefix}parameters p ON p.version_id = h.id
LEFT JOIN {prefix}parameter_defaults d ON d.parameter_id = p.id
WHERE h.id = (SELECT MAX(id) FROM {prefix}versions WHERE name = ?1)
ORDER BY p.id";

const INSERT_VERSION: &str = "INSERT INTO {prefix}versions \
     (name, version, model, output_format, max_tokens, system_prompt, user_prompt, created_at, modified_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const INSERT_PARAMETER: &str =
    "INSERT INTO {prefix}parameters (version_id, name, value) VALUES (?1, ?2, ?3)";

const INSERT_DEFAULT: &str =
    "INSERT INTO {prefix}parameter_defaults (parameter_id, value) VALUES (?1, ?2)";

const COUNT_VERSIONS: &str = "SELECT COUNT(*) FROM {prefix}versions WHERE name = ?1";

/// Rendered SQL for one table prefix.
///
/// # Examples
///
/// ```
/// use promptdb_sqlite::{QueryCatalog, QueryId};
///
/// let catalog = QueryCatalog::new("prompt_").unwrap();
/// assert!(catalog.sql(QueryId::CountVersions).contains("prompt_versions"));
/// assert!(QueryCatalog::new("bad prefix").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: [String; QUERY_COUNT],
}

impl QueryCatalog {
    /// Renders every query for `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPrefix`](crate::StoreError::InvalidPrefix)
    /// if the prefix is empty or contains characters other than
    /// alphanumerics and underscores.
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;

        let queries = QueryId::ALL.map(|id| {
            id.template()
                .replace("{columns}", JOINED_COLUMNS)
                .replace(PLACEHOLDER, &prefix)
        });
        Ok(Self { queries })
    }

    /// SQL text for `id`.
    pub fn sql(&self, id: QueryId) -> &str {
        &self.queries[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (i, id) in QueryId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_every_query_is_fully_rendered() {
        let catalog = QueryCatalog::new("x_").unwrap();
        for id in QueryId::ALL {
            let sql = catalog.sql(id);
            assert!(!sql.contains(PLACEHOLDER), "{id:?} still has a placeholder");
            assert!(!sql.contains("{columns}"), "{id:?} still has a column list placeholder");
            assert!(sql.contains("x_"), "{id:?} does not use the prefix");
        }
    }

    #[test]
    fn test_invalid_prefix_fails_construction() {
        assert!(QueryCatalog::new("").is_err());
        assert!(QueryCatalog::new("a;b").is_err());
    }

    #[test]
    fn test_queries_prepare_against_schema() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&crate::schema::generate_schema_sql("q_").unwrap())
            .unwrap();
        let catalog = QueryCatalog::new("q_").unwrap();
        for id in QueryId::ALL {
            conn.prepare(catalog.sql(id))
                .unwrap_or_else(|e| panic!("{id:?} does not prepare: {e}"));
        }
    }

    #[test]
    fn test_latest_queries_select_max_id() {
        let catalog = QueryCatalog::new("prompt_").unwrap();
        assert!(catalog.sql(QueryId::LatestPerName).contains("GROUP BY name"));
        assert!(catalog.sql(QueryId::LatestByName).contains("WHERE name = ?1"));
    }
}
