//! Reconstruction of stored versions from flattened join rows.
//!
//! Reading a version means an outer join of header × parameters × defaults,
//! which repeats the header columns once per parameter row. [`assemble`]
//! folds that stream back into one [`StoredVersion`] per `version_id`:
//!
//! - a record is seeded on the first row carrying its `version_id`;
//! - parameters and defaults are merged with first-seen-wins semantics;
//! - headers without any parameter rows still produce a record;
//! - records come out in first-appearance order of their `version_id`.
//!
//! The function never fails: every row shape a left join can produce is
//! valid input.

use std::collections::HashMap;

use tracing::debug;

use crate::{FlatRow, StoredVersion, ValueMap, VersionId};

/// Folds flattened join rows into hierarchical stored versions.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use promptdb_core::{FlatRow, VersionHeader, VersionId, assemble};
///
/// let header = VersionHeader {
///     version_id: VersionId(1),
///     name: "greet".into(),
///     version: 1,
///     model: None,
///     output_format: "text".into(),
///     max_tokens: 100,
///     system_prompt: "sys".into(),
///     user_prompt: "Hi {{who}}".into(),
///     created_at: Utc::now(),
///     modified_at: Utc::now(),
/// };
/// let rows = vec![FlatRow {
///     header,
///     parameter_name: Some("who".into()),
///     parameter_value: Some("string".into()),
///     default_value: Some("world".into()),
/// }];
///
/// let versions = assemble(rows);
/// assert_eq!(versions.len(), 1);
/// assert_eq!(versions[0].definition.defaults()["who"], "world");
/// ```
pub fn assemble(rows: impl IntoIterator<Item = FlatRow>) -> Vec<StoredVersion> {
    let mut records: Vec<Record> = Vec::new();
    let mut index: HashMap<VersionId, usize> = HashMap::new();
    let mut row_count = 0usize;

    for row in rows {
        row_count += 1;
        let FlatRow {
            header,
            parameter_name,
            parameter_value,
            default_value,
        } = row;

        let slot = match index.get(&header.version_id) {
            Some(&slot) => slot,
            None => {
                index.insert(header.version_id, records.len());
                records.push(Record::new(StoredVersion::from_header(header)));
                records.len() - 1
            }
        };

        let Some(name) = parameter_name else {
            continue;
        };
        let record = &mut records[slot];

        record
            .parameters
            .entry(name.clone())
            .or_insert_with(|| parameter_value.unwrap_or_default());
        if let Some(value) = default_value {
            record.defaults.entry(name).or_insert(value);
        }
    }

    debug!(
        rows = row_count,
        versions = records.len(),
        "assembled stored versions"
    );

    records.into_iter().map(Record::finish).collect()
}

/// A version under construction; maps are attached once all rows are seen.
struct Record {
    version: StoredVersion,
    parameters: ValueMap,
    defaults: ValueMap,
}

impl Record {
    fn new(version: StoredVersion) -> Self {
        Self {
            version,
            parameters: ValueMap::new(),
            defaults: ValueMap::new(),
        }
    }

    fn finish(self) -> StoredVersion {
        let Record {
            mut version,
            parameters,
            defaults,
        } = self;
        version.definition = version
            .definition
            .with_parameters(parameters)
            .with_defaults(defaults);
        version
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::VersionHeader;

    fn header(id: i64, name: &str) -> VersionHeader {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        VersionHeader {
            version_id: VersionId(id),
            name: name.to_string(),
            version: 1,
            model: Some("gpt-4".to_string()),
            output_format: "json".to_string(),
            max_tokens: 200,
            system_prompt: format!("{name} system"),
            user_prompt: format!("{name} user"),
            created_at: ts,
            modified_at: ts,
        }
    }

    fn row(id: i64, name: &str, param: Option<(&str, &str)>, default: Option<&str>) -> FlatRow {
        FlatRow {
            header: header(id, name),
            parameter_name: param.map(|(n, _)| n.to_string()),
            parameter_value: param.map(|(_, v)| v.to_string()),
            default_value: default.map(String::from),
        }
    }

    #[test]
    fn test_empty_input_yields_no_versions() {
        assert!(assemble(Vec::new()).is_empty());
    }

    #[test]
    fn test_header_without_children_has_empty_maps() {
        let versions = assemble(vec![row(1, "bare", None, None)]);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].name(), "bare");
        assert!(versions[0].definition.parameters().is_empty());
        assert!(versions[0].definition.defaults().is_empty());
    }

    #[test]
    fn test_repeated_header_rows_merge_into_one_record() {
        let versions = assemble(vec![
            row(1, "p", Some(("a", "string")), Some("x")),
            row(1, "p", Some(("b", "number")), None),
            row(1, "p", Some(("c", "bool")), Some("true")),
        ]);

        assert_eq!(versions.len(), 1);
        let def = &versions[0].definition;
        assert_eq!(def.parameters().len(), 3);
        assert_eq!(def.defaults().len(), 2);
        assert_eq!(def.defaults()["a"], "x");
        assert_eq!(def.defaults()["c"], "true");
        assert!(!def.defaults().contains_key("b"));
    }

    #[test]
    fn test_first_seen_wins_for_duplicates() {
        let versions = assemble(vec![
            row(1, "p", Some(("a", "first")), Some("d1")),
            row(1, "p", Some(("a", "second")), Some("d2")),
        ]);

        let def = &versions[0].definition;
        assert_eq!(def.parameters()["a"], "first");
        assert_eq!(def.defaults()["a"], "d1");
    }

    #[test]
    fn test_default_on_later_duplicate_row_is_kept() {
        let versions = assemble(vec![
            row(1, "p", Some(("a", "string")), None),
            row(1, "p", Some(("a", "string")), Some("late")),
        ]);
        assert_eq!(versions[0].definition.defaults()["a"], "late");
    }

    #[test]
    fn test_missing_parameter_value_becomes_empty() {
        let mut r = row(1, "p", None, None);
        r.parameter_name = Some("a".to_string());
        let versions = assemble(vec![r]);
        assert_eq!(versions[0].definition.parameters()["a"], "");
    }

    #[test]
    fn test_output_follows_first_appearance_order() {
        let versions = assemble(vec![
            row(5, "e", None, None),
            row(2, "b", Some(("x", "1")), None),
            row(5, "e", Some(("y", "2")), None),
            row(9, "z", None, None),
            row(2, "b", Some(("w", "3")), None),
        ]);

        let ids: Vec<i64> = versions.iter().map(|v| v.version_id.0).collect();
        assert_eq!(ids, vec![5, 2, 9]);
        assert_eq!(versions[0].definition.parameters().len(), 1);
        assert_eq!(versions[1].definition.parameters().len(), 2);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let rows = vec![
            row(3, "c", Some(("k2", "v2")), Some("d2")),
            row(3, "c", Some(("k1", "v1")), None),
            row(1, "a", None, None),
        ];

        let first = assemble(rows.clone());
        let second = assemble(rows);
        assert_eq!(first, second);
    }
}
