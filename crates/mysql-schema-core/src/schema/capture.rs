//! Assembling a schema from `information_schema` rows.
//!
//! Live capture needs a database connection and lives outside this crate;
//! a [`SchemaCapturer`] hands over the raw rows and [`Schema::from_capture`]
//! classifies them with the same rules the DDL path uses, so a replayed
//! schema and a captured one compare field for field.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Database, Schema, Table};
use crate::columndef::{ColumnDef, TypeAttributes};
use crate::config::CaseSensitivity;
use crate::error::{InvariantError, Result, SchemaError};
use crate::lexer::{Lexer, TokenKind};

const SYSTEM_DATABASES: [&str; 2] = ["information_schema", "performance_schema"];

/// A row of `SCHEMATA`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CapturedDatabase {
    pub name: String,
    pub charset: String,
}

/// A row of `TABLES`, joined with its collation's charset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CapturedTable {
    pub database: String,
    pub name: String,
    pub charset: String,
}

/// A row of `COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CapturedColumn {
    pub database: String,
    pub table: String,
    pub name: String,
    /// One-based `ORDINAL_POSITION`.
    pub ordinal_position: usize,
    /// `DATA_TYPE`, e.g. `int`.
    pub data_type: String,
    /// `COLUMN_TYPE`, e.g. `int(10) unsigned` or `enum('a','b')`.
    pub column_type: String,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub datetime_precision: Option<u64>,
}

/// A `KEY_COLUMN_USAGE` row of a `PRIMARY` constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CapturedPrimaryKey {
    pub database: String,
    pub table: String,
    pub column: String,
    /// One-based position within the key.
    pub ordinal_position: usize,
}

/// Everything a capture reads from the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CaptureRows {
    pub server_charset: String,
    pub databases: Vec<CapturedDatabase>,
    pub tables: Vec<CapturedTable>,
    pub columns: Vec<CapturedColumn>,
    pub primary_keys: Vec<CapturedPrimaryKey>,
}

/// Source of a baseline schema.
pub trait SchemaCapturer {
    /// Capture failure.
    type Error: From<SchemaError>;

    /// Reads the raw metadata rows.
    ///
    /// # Errors
    ///
    /// Whatever the underlying source fails with.
    fn capture_rows(&mut self) -> std::result::Result<CaptureRows, Self::Error>;

    /// Reads the rows and assembles a schema.
    ///
    /// # Errors
    ///
    /// Source failures, or a column type that cannot be classified.
    fn capture(&mut self, case: CaseSensitivity) -> std::result::Result<Schema, Self::Error> {
        let rows = self.capture_rows()?;
        Ok(Schema::from_capture(&rows, case)?)
    }
}

impl SchemaCapturer for CaptureRows {
    type Error = SchemaError;

    fn capture_rows(&mut self) -> Result<CaptureRows> {
        Ok(self.clone())
    }
}

/// Parses the quoted value list of an `enum(...)`/`set(...)` column type.
fn enum_values(column_type: &str) -> Vec<String> {
    let Some(open) = column_type.find('(') else {
        return Vec::new();
    };
    let inner = column_type.get(open + 1..column_type.rfind(')').unwrap_or(column_type.len()));
    Lexer::new(inner.unwrap_or_default())
        .tokenize()
        .into_iter()
        .filter_map(|token| match token.kind {
            TokenKind::String(value) => Some(value),
            _ => None,
        })
        .collect()
}

fn captured_column(row: &CapturedColumn) -> Result<ColumnDef> {
    let lowered = row.column_type.to_ascii_lowercase();
    let attrs = TypeAttributes {
        signed: !lowered.contains("unsigned"),
        charset: row.charset.clone(),
        column_length: row.datetime_precision,
        enum_values: enum_values(&row.column_type),
        byte: false,
    };
    ColumnDef::build(
        row.name.as_str(),
        &row.data_type,
        row.ordinal_position.saturating_sub(1),
        attrs,
    )
}

impl Schema {
    /// Builds a schema from captured metadata rows.
    ///
    /// System databases are skipped. Columns are ordered by ordinal position
    /// and primary key columns by their key position.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] for a column type with no
    /// mapping, or an invariant error for rows that reference a database or
    /// table not present in the capture.
    pub fn from_capture(rows: &CaptureRows, case: CaseSensitivity) -> Result<Self> {
        let is_system = |name: &str| SYSTEM_DATABASES.iter().any(|s| s.eq_ignore_ascii_case(name));

        let mut columns: HashMap<(&str, &str), Vec<&CapturedColumn>> = HashMap::new();
        for column in rows.columns.iter().filter(|c| !is_system(&c.database)) {
            columns
                .entry((column.database.as_str(), column.table.as_str()))
                .or_default()
                .push(column);
        }
        let mut keys: HashMap<(&str, &str), Vec<&CapturedPrimaryKey>> = HashMap::new();
        for key in rows.primary_keys.iter().filter(|k| !is_system(&k.database)) {
            keys.entry((key.database.as_str(), key.table.as_str()))
                .or_default()
                .push(key);
        }

        let mut schema = Self::new(rows.server_charset.as_str(), case);
        for db in rows.databases.iter().filter(|d| !is_system(&d.name)) {
            schema.push_database(Database::new(db.name.as_str(), db.charset.as_str()));
        }

        for row in rows.tables.iter().filter(|t| !is_system(&t.database)) {
            let key = (row.database.as_str(), row.name.as_str());
            let mut table_columns = columns.remove(&key).unwrap_or_default();
            table_columns.sort_by_key(|c| c.ordinal_position);
            let defs = table_columns
                .into_iter()
                .map(captured_column)
                .collect::<Result<Vec<_>>>()?;

            let mut pk = keys.remove(&key).unwrap_or_default();
            pk.sort_by_key(|k| k.ordinal_position);
            let primary_key = pk.into_iter().map(|k| k.column.clone()).collect();

            let table = Table::new(
                row.database.as_str(),
                row.name.as_str(),
                row.charset.as_str(),
                defs,
                primary_key,
            );
            schema.database_mut(&row.database)?.push_table(Arc::new(table));
        }

        if let Some(((database, table), _)) = columns.into_iter().next() {
            return Err(InvariantError::table_not_found(database, table).into());
        }

        debug!(
            databases = schema.databases().len(),
            "Assembled schema from capture"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(table: &str, name: &str, pos: usize, data: &str, full: &str) -> CapturedColumn {
        CapturedColumn {
            database: String::from("shop"),
            table: table.to_string(),
            name: name.to_string(),
            ordinal_position: pos,
            data_type: data.to_string(),
            column_type: full.to_string(),
            charset: None,
            datetime_precision: None,
        }
    }

    fn rows() -> CaptureRows {
        CaptureRows {
            server_charset: String::from("utf8mb4"),
            databases: vec![
                CapturedDatabase {
                    name: String::from("shop"),
                    charset: String::from("utf8mb4"),
                },
                CapturedDatabase {
                    name: String::from("information_schema"),
                    charset: String::from("utf8"),
                },
            ],
            tables: vec![CapturedTable {
                database: String::from("shop"),
                name: String::from("orders"),
                charset: String::from("latin1"),
            }],
            columns: vec![
                column("orders", "status", 3, "enum", "enum('new','it''s done')"),
                column("orders", "id", 1, "int", "int(10) unsigned"),
                column("orders", "note", 2, "varchar", "varchar(255)"),
            ],
            primary_keys: vec![CapturedPrimaryKey {
                database: String::from("shop"),
                table: String::from("orders"),
                column: String::from("id"),
                ordinal_position: 1,
            }],
        }
    }

    #[test]
    fn test_from_capture() {
        let schema = Schema::from_capture(&rows(), CaseSensitivity::CaseSensitive).unwrap();
        assert_eq!(schema.database_names(), vec!["shop"]);

        let table = schema.table("shop", "orders").unwrap();
        assert_eq!(table.columns.names(), vec!["id", "note", "status"]);
        assert_eq!(table.column("id").unwrap().signed(), Some(false));
        assert_eq!(table.column("note").unwrap().charset(), Some("latin1"));
        assert_eq!(
            table.column("status").unwrap().enum_values(),
            Some(&[String::from("new"), String::from("it's done")][..])
        );
        assert_eq!(table.primary_key, vec!["id"]);
    }

    #[test]
    fn test_orphan_columns_are_rejected() {
        let mut rows = rows();
        rows.columns.push(column("ghost", "x", 1, "int", "int"));
        assert!(Schema::from_capture(&rows, CaseSensitivity::CaseSensitive).is_err());
    }

    #[test]
    fn test_capturer_for_rows() {
        let mut rows = rows();
        let schema = rows.capture(CaseSensitivity::CaseSensitive).unwrap();
        assert!(schema.has_table("shop", "orders"));
    }
}
