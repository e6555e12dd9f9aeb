//! Transactional, change-detected writes of prompt versions.
//!
//! A write is one `IMMEDIATE` transaction: the database write lock is taken
//! before the latest version is read, so concurrent writers of the same
//! name are serialized and every one of them compares against the latest
//! committed state. A failure anywhere rolls the whole version back.

use std::collections::HashMap;

use chrono::Utc;
use promptdb_core::{AddOutcome, PromptDefinition, ValidationError, changed_fields, validate_definition};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::convert;
use crate::error::{Result, StoreError};
use crate::queries::QueryCatalog;

/// Appends a new version of a definition when it differs from the latest one.
pub struct VersionedWriter<'a> {
    conn: &'a Connection,
    catalog: &'a QueryCatalog,
}

impl<'a> VersionedWriter<'a> {
    pub fn new(conn: &'a Connection, catalog: &'a QueryCatalog) -> Self {
        Self { conn, catalog }
    }

    /// Stores `definition` as a new version unless it equals the latest one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDefinition`] for the first fatal
    /// validation finding, before any transaction is opened. Orphaned
    /// defaults are not fatal. Otherwise returns [`StoreError::WriteError`]
    /// wrapping the underlying failure; nothing of the attempted version is
    /// left in the database.
    pub fn add(&self, definition: &PromptDefinition) -> Result<AddOutcome> {
        if let Some(fatal) = validate_definition(definition)
            .into_iter()
            .find(ValidationError::is_fatal)
        {
            return Err(StoreError::InvalidDefinition(fatal));
        }

        self.write(definition).map_err(|source| StoreError::WriteError {
            name: definition.name().to_string(),
            source: Box::new(source),
        })
    }

    fn write(&self, definition: &PromptDefinition) -> Result<AddOutcome> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        match self.write_in(&tx, definition) {
            Ok(outcome) => {
                tx.commit()?;
                Ok(outcome)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        prompt = definition.name(),
                        error = %rollback_err,
                        "rollback failed"
                    );
                }
                Err(err)
            }
        }
    }

    fn write_in(&self, tx: &Transaction<'_>, definition: &PromptDefinition) -> Result<AddOutcome> {
        let name = definition.name();
        let latest = convert::fetch_latest(tx, self.catalog, name)?;

        let changed = latest
            .as_ref()
            .map(|latest| changed_fields(definition, &latest.definition));

        if let Some(latest) = latest
            .as_ref()
            .filter(|_| changed.as_ref().is_some_and(Vec::is_empty))
        {
            debug!(prompt = name, version = latest.version, "definition unchanged");
            return Ok(AddOutcome {
                created: false,
                version_id: latest.version_id,
                version: latest.version,
            });
        }

        let version = match &latest {
            Some(latest) => latest.version.checked_add(1).ok_or_else(|| {
                StoreError::ConversionError(format!("version counter of '{name}' overflowed"))
            })?,
            None => 1,
        };

        let version_id = convert::insert_version(tx, self.catalog, definition, version, Utc::now())?;

        let mut parameter_ids = HashMap::with_capacity(definition.parameters().len());
        for (param, value) in definition.parameters() {
            let id = convert::insert_parameter(tx, self.catalog, version_id, param, value)?;
            parameter_ids.insert(param.as_str(), id);
        }

        for (param, value) in definition.effective_defaults() {
            if let Some(&parameter_id) = parameter_ids.get(param) {
                convert::insert_default(tx, self.catalog, parameter_id, value)?;
            }
        }
        for orphan in definition.orphaned_defaults() {
            debug!(prompt = name, default = orphan, "skipping default without parameter");
        }

        match changed {
            Some(changed) => {
                let changed: Vec<String> = changed.iter().map(ToString::to_string).collect();
                info!(prompt = name, version, changed = ?changed, "created prompt version");
            }
            None => info!(prompt = name, version, "created first prompt version"),
        }

        Ok(AddOutcome {
            created: true,
            version_id,
            version,
        })
    }
}
