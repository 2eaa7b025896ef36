//! The tracked schema model.
//!
//! A [`Schema`] is an immutable snapshot: databases hold tables behind
//! `Arc`s, and every change produces a new snapshot that shares whatever it
//! did not touch. Mutation goes through `Arc::make_mut`, so a snapshot that
//! is still referenced elsewhere is never changed in place.

mod capture;
mod column_list;
mod database;
mod diff;
mod table;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use capture::{
    CaptureRows, CapturedColumn, CapturedDatabase, CapturedPrimaryKey, CapturedTable,
    SchemaCapturer,
};
pub use column_list::{column_names_equal, ColumnList};
pub use database::Database;
pub use diff::{Discrepancy, SchemaDiff, Side};
pub use table::Table;

use crate::config::CaseSensitivity;
use crate::error::{InvariantError, TargetRef};

/// A snapshot of every tracked database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Schema {
    /// Server default charset.
    pub charset: String,
    /// Name comparison mode for databases and tables.
    #[serde(default)]
    pub case_sensitivity: CaseSensitivity,
    #[serde(default)]
    databases: Vec<Arc<Database>>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new(charset: impl Into<String>, case_sensitivity: CaseSensitivity) -> Self {
        Self {
            charset: charset.into(),
            case_sensitivity,
            databases: Vec::new(),
        }
    }

    /// Databases in order.
    #[must_use]
    pub fn databases(&self) -> &[Arc<Database>] {
        &self.databases
    }

    /// Database names in order.
    #[must_use]
    pub fn database_names(&self) -> Vec<&str> {
        self.databases.iter().map(|d| d.name.as_str()).collect()
    }

    /// Index of the named database.
    #[must_use]
    pub fn database_index(&self, name: &str) -> Option<usize> {
        self.databases
            .iter()
            .position(|d| self.case_sensitivity.names_equal(&d.name, name))
    }

    /// The named database.
    #[must_use]
    pub fn database(&self, name: &str) -> Option<&Arc<Database>> {
        self.database_index(name).map(|i| &self.databases[i])
    }

    /// True if the named database exists.
    #[must_use]
    pub fn has_database(&self, name: &str) -> bool {
        self.database_index(name).is_some()
    }

    /// The named table.
    #[must_use]
    pub fn table(&self, database: &str, table: &str) -> Option<&Arc<Table>> {
        self.database(database)
            .and_then(|db| db.table(table, self.case_sensitivity))
    }

    /// True if the named table exists.
    #[must_use]
    pub fn has_table(&self, database: &str, table: &str) -> bool {
        self.table(database, table).is_some()
    }

    /// Like [`Schema::table`], but a missing database or table is an error.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::DatabaseNotFound`] or
    /// [`InvariantError::TableNotFound`].
    pub fn require_table(&self, database: &str, table: &str) -> Result<&Arc<Table>, InvariantError> {
        let db = self
            .database(database)
            .ok_or_else(|| InvariantError::database_not_found(database))?;
        db.table(table, self.case_sensitivity)
            .ok_or_else(|| InvariantError::table_not_found(database, table))
    }

    pub(crate) fn push_database(&mut self, database: Database) {
        self.databases.push(Arc::new(database));
    }

    pub(crate) fn remove_database(&mut self, index: usize) -> Arc<Database> {
        self.databases.remove(index)
    }

    /// Copy-on-write access to a database.
    pub(crate) fn database_mut(&mut self, name: &str) -> Result<&mut Database, InvariantError> {
        let index = self
            .database_index(name)
            .ok_or_else(|| InvariantError::database_not_found(name))?;
        Ok(Arc::make_mut(&mut self.databases[index]))
    }

    /// A one-line description of the schema around `target`, for errors.
    #[must_use]
    pub fn summarize(&self, target: Option<&TargetRef>) -> String {
        let mut parts = vec![format!("{} databases", self.databases.len())];
        if let Some(target) = target {
            match self.database(&target.database) {
                None => parts.push(format!("no database `{}`", target.database)),
                Some(db) => {
                    parts.push(format!(
                        "`{}` tables [{}]",
                        db.name,
                        db.table_names().join(", ")
                    ));
                    if let Some(name) = &target.table {
                        if let Some(table) = db.table(name, self.case_sensitivity) {
                            parts.push(format!(
                                "`{}`.`{}` columns [{}]",
                                db.name,
                                table.name,
                                table.column_summary()
                            ));
                        }
                    }
                }
            }
        }
        parts.join("; ")
    }
}
