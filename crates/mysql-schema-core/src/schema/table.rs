//! Table definitions.

use serde::{Deserialize, Serialize};

use super::{column_names_equal, ColumnList};
use crate::columndef::ColumnDef;

/// A table: its database, name, default charset, primary key, and columns.
///
/// The database is recorded by name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Table {
    /// Owning database name.
    pub database: String,
    /// Table name.
    #[serde(rename = "table")]
    pub name: String,
    /// Default charset for string columns.
    pub charset: String,
    /// Primary key column names, in key order.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Columns.
    pub columns: ColumnList,
}

impl Table {
    /// Creates a table. String columns without a charset inherit `charset`.
    #[must_use]
    pub fn new(
        database: impl Into<String>,
        name: impl Into<String>,
        charset: impl Into<String>,
        columns: Vec<ColumnDef>,
        primary_key: Vec<String>,
    ) -> Self {
        let charset = charset.into();
        let mut columns = ColumnList::new(columns);
        columns.update_each(|c| c.inherit_charset(&charset));
        Self {
            database: database.into(),
            name: name.into(),
            charset,
            primary_key,
            columns,
        }
    }

    /// The named column, compared case-insensitively.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.find(name)
    }

    /// True if the column is part of the primary key.
    #[must_use]
    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|pk| column_names_equal(pk, column))
    }

    /// A copy of this table under another database and name.
    #[must_use]
    pub fn relocated(&self, database: &str, name: &str) -> Self {
        Self {
            database: database.to_string(),
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Column names joined for diagnostics, e.g. `id int, name varchar`.
    #[must_use]
    pub fn column_summary(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{} {}", c.name(), c.type_name()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Converts every text column and the table default to `charset`.
    pub(crate) fn convert_to(&mut self, charset: &str) {
        self.columns.update_each(|c| c.convert_charset(charset));
        self.charset = charset.to_string();
    }

    /// Follows a column rename in the primary key.
    pub(crate) fn rename_key_column(&mut self, old: &str, new: &str) {
        for pk in &mut self.primary_key {
            if column_names_equal(pk, old) {
                *pk = new.to_string();
            }
        }
    }

    /// Drops a removed column from the primary key.
    pub(crate) fn forget_key_column(&mut self, column: &str) {
        self.primary_key.retain(|pk| !column_names_equal(pk, column));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columndef::TypeAttributes;

    fn sample() -> Table {
        let columns = vec![
            ColumnDef::build("id", "int", 0, TypeAttributes::default()).unwrap(),
            ColumnDef::build("name", "varchar", 0, TypeAttributes::default()).unwrap(),
            ColumnDef::build("raw", "blob", 0, TypeAttributes::default()).unwrap(),
        ];
        Table::new("shop", "orders", "latin1", columns, vec![String::from("id")])
    }

    #[test]
    fn test_string_columns_inherit_table_charset() {
        let table = sample();
        assert_eq!(table.column("name").unwrap().charset(), Some("latin1"));
        assert_eq!(table.column("raw").unwrap().charset(), Some("binary"));
    }

    #[test]
    fn test_convert_to_skips_binary() {
        let mut table = sample();
        table.convert_to("utf8mb4");
        assert_eq!(table.charset, "utf8mb4");
        assert_eq!(table.column("name").unwrap().charset(), Some("utf8mb4"));
        assert_eq!(table.column("raw").unwrap().charset(), Some("binary"));
    }

    #[test]
    fn test_primary_key_follows_columns() {
        let mut table = sample();
        assert!(table.is_primary_key("ID"));
        table.rename_key_column("ID", "order_id");
        assert_eq!(table.primary_key, vec!["order_id"]);
        table.forget_key_column("order_id");
        assert!(table.primary_key.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["database"], "shop");
        assert_eq!(value["table"], "orders");
        assert_eq!(value["primary-key"], serde_json::json!(["id"]));
        assert_eq!(value["columns"][1]["name"], "name");
        let back: Table = serde_json::from_value(value).unwrap();
        assert_eq!(back, sample());
    }
}
