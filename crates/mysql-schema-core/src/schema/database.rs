//! Databases and their tables.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Table;
use crate::config::CaseSensitivity;

/// A database: name, default charset, and tables in creation order.
///
/// Tables are shared between schema snapshots; changing one replaces its
/// `Arc` in a copy of the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Database name.
    pub name: String,
    /// Default charset for new tables.
    pub charset: String,
    #[serde(default)]
    tables: Vec<Arc<Table>>,
}

impl Database {
    /// Creates an empty database.
    #[must_use]
    pub fn new(name: impl Into<String>, charset: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            charset: charset.into(),
            tables: Vec::new(),
        }
    }

    /// Tables in order.
    #[must_use]
    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    /// Table names in order.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Index of the named table.
    #[must_use]
    pub fn table_index(&self, name: &str, case: CaseSensitivity) -> Option<usize> {
        self.tables.iter().position(|t| case.names_equal(&t.name, name))
    }

    /// The named table.
    #[must_use]
    pub fn table(&self, name: &str, case: CaseSensitivity) -> Option<&Arc<Table>> {
        self.table_index(name, case).map(|i| &self.tables[i])
    }

    /// True if the named table exists.
    #[must_use]
    pub fn has_table(&self, name: &str, case: CaseSensitivity) -> bool {
        self.table_index(name, case).is_some()
    }

    pub(crate) fn push_table(&mut self, table: Arc<Table>) {
        self.tables.push(table);
    }

    pub(crate) fn remove_table(&mut self, index: usize) -> Arc<Table> {
        self.tables.remove(index)
    }

    pub(crate) fn replace_table(&mut self, index: usize, table: Arc<Table>) {
        self.tables[index] = table;
    }

    /// Copy-on-write access to the table at `index`.
    pub(crate) fn table_at_mut(&mut self, index: usize) -> &mut Table {
        Arc::make_mut(&mut self.tables[index])
    }
}
