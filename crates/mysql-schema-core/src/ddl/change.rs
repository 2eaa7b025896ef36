//! Parsed schema changes.
//!
//! These describe what a statement asks for, with nothing looked up yet.
//! Column positions are still symbolic (`AFTER x`) and names are as written.

use std::fmt;

use crate::columndef::ColumnDef;
use crate::error::{InvariantError, TargetRef};
use crate::filter::SchemaFilter;
use crate::schema::ColumnList;

/// A table name qualified by its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    /// Database name.
    pub database: String,
    /// Table name.
    pub table: String,
}

impl TableName {
    /// Creates a qualified table name.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// The name as an error target.
    #[must_use]
    pub fn target(&self) -> TargetRef {
        TargetRef {
            database: self.database.clone(),
            table: Some(self.table.clone()),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`.`{}`", self.database, self.table)
    }
}

/// Where an added or changed column goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnPosition {
    /// Append, or keep the current position for a changed column.
    #[default]
    Default,
    /// `FIRST`.
    First,
    /// `AFTER column`.
    After(String),
}

impl ColumnPosition {
    /// Resolves to an absolute index in `columns`.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::ColumnNotFound`] if the `AFTER` column does
    /// not exist.
    pub fn index(
        &self,
        columns: &ColumnList,
        default: usize,
        table: &TableName,
    ) -> Result<usize, InvariantError> {
        match self {
            Self::Default => Ok(default),
            Self::First => Ok(0),
            Self::After(name) => columns.index_of(name).map(|i| i + 1).ok_or_else(|| {
                InvariantError::ColumnNotFound {
                    database: table.database.clone(),
                    table: table.table.clone(),
                    column: name.clone(),
                }
            }),
        }
    }
}

impl fmt::Display for ColumnPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("DEFAULT"),
            Self::First => f.write_str("FIRST"),
            Self::After(column) => write!(f, "AFTER {column}"),
        }
    }
}

/// One column clause of an `ALTER TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMod {
    /// `ADD [COLUMN] [IF NOT EXISTS] def [FIRST | AFTER x]`.
    Add {
        column: ColumnDef,
        position: ColumnPosition,
        if_not_exists: bool,
    },
    /// `CHANGE [IF EXISTS] old def` or `MODIFY [IF EXISTS] def`, where
    /// `name` is the existing column.
    Change {
        name: String,
        column: ColumnDef,
        position: ColumnPosition,
        if_exists: bool,
    },
    /// `DROP [COLUMN] [IF EXISTS] name`.
    Remove { name: String, if_exists: bool },
    /// `RENAME COLUMN name TO new_name`.
    Rename { name: String, new_name: String },
}

/// The body of an `ALTER TABLE`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterTable {
    /// Database name.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Column clauses, applied in order.
    pub column_mods: Vec<ColumnMod>,
    /// `RENAME TO`.
    pub new_name: Option<TableName>,
    /// `CONVERT TO CHARACTER SET`.
    pub convert_charset: Option<String>,
    /// `[DEFAULT] CHARACTER SET`.
    pub default_charset: Option<String>,
    /// New primary key. `Some(vec![])` for `DROP PRIMARY KEY`.
    pub primary_key: Option<Vec<String>>,
}

impl AlterTable {
    /// True if no clause touches columns, keys, charsets or the name.
    #[must_use]
    pub fn is_table_options_only(&self) -> bool {
        self.column_mods.is_empty()
            && self.new_name.is_none()
            && self.convert_charset.is_none()
            && self.default_charset.is_none()
            && self.primary_key.is_none()
    }
}

/// A schema change as written in a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange {
    /// `CREATE DATABASE`.
    CreateDatabase {
        database: String,
        charset: Option<String>,
        if_not_exists: bool,
    },
    /// `ALTER DATABASE`.
    AlterDatabase {
        database: String,
        charset: Option<String>,
    },
    /// `DROP DATABASE`.
    DropDatabase { database: String, if_exists: bool },
    /// `CREATE TABLE`, either with a column list or `LIKE other`.
    CreateTable {
        database: String,
        table: String,
        columns: Vec<ColumnDef>,
        primary_key: Vec<String>,
        charset: Option<String>,
        if_not_exists: bool,
        like: Option<TableName>,
    },
    /// `ALTER TABLE`.
    AlterTable(AlterTable),
    /// `DROP TABLE`, one per named table.
    DropTable {
        database: String,
        table: String,
        if_exists: bool,
    },
    /// `RENAME TABLE a TO b, c TO d`, applied left to right.
    RenameTables { renames: Vec<(TableName, TableName)> },
}

impl SchemaChange {
    /// The object this change is aimed at.
    #[must_use]
    pub fn target(&self) -> TargetRef {
        let database_only = |database: &str| TargetRef {
            database: database.to_string(),
            table: None,
        };
        let table = |database: &str, table: &str| TargetRef {
            database: database.to_string(),
            table: Some(table.to_string()),
        };
        match self {
            Self::CreateDatabase { database, .. }
            | Self::AlterDatabase { database, .. }
            | Self::DropDatabase { database, .. } => database_only(database),
            Self::CreateTable {
                database, table: t, ..
            }
            | Self::DropTable {
                database, table: t, ..
            } => table(database, t),
            Self::AlterTable(alter) => table(&alter.database, &alter.table),
            Self::RenameTables { renames } => renames
                .first()
                .map_or_else(|| database_only(""), |(from, _)| from.target()),
        }
    }

    /// Short name of the change kind, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateDatabase { .. } => "create-database",
            Self::AlterDatabase { .. } => "alter-database",
            Self::DropDatabase { .. } => "drop-database",
            Self::CreateTable { .. } => "create-table",
            Self::AlterTable(_) => "alter-table",
            Self::DropTable { .. } => "drop-table",
            Self::RenameTables { .. } => "rename-tables",
        }
    }

    /// True if `filter` excludes the table this change touches.
    ///
    /// Database-level changes are never excluded. A rename is excluded only
    /// if every source table is.
    #[must_use]
    pub fn is_excluded(&self, filter: &dyn SchemaFilter) -> bool {
        match self {
            Self::CreateDatabase { .. } | Self::AlterDatabase { .. } | Self::DropDatabase { .. } => {
                false
            }
            Self::CreateTable {
                database, table, ..
            }
            | Self::DropTable {
                database, table, ..
            } => filter.is_table_excluded(database, table),
            Self::AlterTable(alter) => filter.is_table_excluded(&alter.database, &alter.table),
            Self::RenameTables { renames } => {
                !renames.is_empty()
                    && renames
                        .iter()
                        .all(|(from, _)| filter.is_table_excluded(&from.database, &from.table))
            }
        }
    }
}
