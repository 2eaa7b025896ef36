//! Excluding databases and tables from tracking.

use std::collections::HashSet;

/// Decides which tables the tracker ignores.
///
/// Changes to an excluded table are skipped before resolution, so the
/// tracked schema never contains it.
pub trait SchemaFilter {
    /// True if every table of the database is excluded.
    fn is_database_excluded(&self, database: &str) -> bool;

    /// True if the table is excluded.
    fn is_table_excluded(&self, database: &str, _table: &str) -> bool {
        self.is_database_excluded(database)
    }
}

/// A filter built from explicit exclusion lists.
///
/// Names compare case-insensitively. A table entry is `db.table`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    databases: HashSet<String>,
    tables: HashSet<(String, String)>,
}

impl ExclusionFilter {
    /// Creates an empty filter that excludes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes a whole database.
    #[must_use]
    pub fn exclude_database(mut self, database: &str) -> Self {
        self.databases.insert(database.to_lowercase());
        self
    }

    /// Excludes one table.
    #[must_use]
    pub fn exclude_table(mut self, database: &str, table: &str) -> Self {
        self.tables
            .insert((database.to_lowercase(), table.to_lowercase()));
        self
    }

    /// Parses `db` and `db.table` entries.
    #[must_use]
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a str>) -> Self {
        entries
            .into_iter()
            .fold(Self::new(), |filter, entry| match entry.split_once('.') {
                Some((database, table)) => filter.exclude_table(database, table),
                None => filter.exclude_database(entry),
            })
    }
}

impl SchemaFilter for ExclusionFilter {
    fn is_database_excluded(&self, database: &str) -> bool {
        self.databases.contains(&database.to_lowercase())
    }

    fn is_table_excluded(&self, database: &str, table: &str) -> bool {
        self.is_database_excluded(database)
            || self
                .tables
                .contains(&(database.to_lowercase(), table.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_filter() {
        let filter = ExclusionFilter::from_entries(["audit", "shop.Sessions"]);
        assert!(filter.is_database_excluded("AUDIT"));
        assert!(filter.is_table_excluded("audit", "anything"));
        assert!(filter.is_table_excluded("shop", "sessions"));
        assert!(!filter.is_table_excluded("shop", "orders"));
        assert!(!filter.is_database_excluded("shop"));
    }
}
