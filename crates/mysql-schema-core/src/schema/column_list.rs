//! Ordered column storage with a case-insensitive name index.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::columndef::ColumnDef;

/// The columns of a table, in ordinal order.
///
/// Every mutation renumbers positions so that `columns[i].position() == i`
/// and rebuilds the name index. Column names compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ColumnDef>", into = "Vec<ColumnDef>")]
pub struct ColumnList {
    columns: Vec<ColumnDef>,
    by_name: HashMap<String, usize>,
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Column name equality, under the same folding as the name index.
#[must_use]
pub fn column_names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || (!(a.is_ascii() && b.is_ascii()) && fold(a) == fold(b))
}

impl ColumnList {
    /// Creates a list, renumbering the given columns.
    #[must_use]
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        let mut list = Self {
            columns,
            by_name: HashMap::new(),
        };
        list.reindex();
        list
    }

    fn reindex(&mut self) {
        self.by_name.clear();
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.set_position(i);
            self.by_name.entry(fold(column.name())).or_insert(i);
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if there are no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates columns in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDef> {
        self.columns.iter()
    }

    /// The column at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    /// Index of the named column.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(&fold(name)).copied()
    }

    /// The named column.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ColumnDef> {
        self.index_of(name).and_then(|i| self.columns.get(i))
    }

    /// True if a column with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Column names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnDef::name).collect()
    }

    /// Inserts `column` at `index`, clamped to the end of the list.
    pub(crate) fn insert(&mut self, index: usize, column: ColumnDef) {
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        self.reindex();
    }

    /// Removes and returns the column at `index`.
    pub(crate) fn remove(&mut self, index: usize) -> Option<ColumnDef> {
        if index >= self.columns.len() {
            return None;
        }
        let removed = self.columns.remove(index);
        self.reindex();
        Some(removed)
    }

    /// Applies `f` to every column. Names may change, so the index is rebuilt.
    pub(crate) fn update_each(&mut self, f: impl FnMut(&mut ColumnDef)) {
        self.columns.iter_mut().for_each(f);
        self.reindex();
    }
}

impl From<Vec<ColumnDef>> for ColumnList {
    fn from(columns: Vec<ColumnDef>) -> Self {
        Self::new(columns)
    }
}

impl From<ColumnList> for Vec<ColumnDef> {
    fn from(list: ColumnList) -> Self {
        list.columns
    }
}

impl<'a> IntoIterator for &'a ColumnList {
    type Item = &'a ColumnDef;
    type IntoIter = std::slice::Iter<'a, ColumnDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
