//! Resolved schema changes.
//!
//! A resolved change carries everything needed to apply it: full table
//! definitions instead of column clauses, absolute positions instead of
//! `AFTER x`. Applying one never consults the statement that produced it,
//! which is what lets a schema history be replayed from a checkpoint.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{InvariantError, Result, TargetRef};
use crate::schema::{Database, Schema, Table};

/// One table of a resolved rename: where it was and what it becomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRename {
    /// Database the table is renamed from.
    pub database: String,
    /// Table name before the rename.
    pub table: String,
    /// The table after the rename, carrying its new database and name.
    pub def: Table,
}

/// A schema change bound to concrete names and positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ResolvedSchemaChange {
    /// A new database.
    DatabaseCreate { database: String, charset: String },
    /// A database charset change. `tables` lists tables whose charset
    /// follows the database.
    DatabaseAlter {
        database: String,
        charset: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tables: Vec<String>,
    },
    /// A dropped database.
    DatabaseDrop { database: String },
    /// A new table.
    TableCreate {
        database: String,
        table: String,
        def: Table,
    },
    /// A table replaced by a new definition, possibly under a new name.
    TableAlter {
        database: String,
        table: String,
        old: Table,
        def: Table,
    },
    /// A dropped table.
    TableDrop { database: String, table: String },
    /// Tables renamed, in order.
    TableRename { renames: Vec<ResolvedRename> },
}

impl ResolvedSchemaChange {
    /// The database this change touches first.
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        match self {
            Self::DatabaseCreate { database, .. }
            | Self::DatabaseAlter { database, .. }
            | Self::DatabaseDrop { database }
            | Self::TableCreate { database, .. }
            | Self::TableAlter { database, .. }
            | Self::TableDrop { database, .. } => Some(database),
            Self::TableRename { renames } => renames.first().map(|r| r.database.as_str()),
        }
    }

    /// The table this change touches first, for table-level changes.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::DatabaseCreate { .. } | Self::DatabaseAlter { .. } | Self::DatabaseDrop { .. } => {
                None
            }
            Self::TableCreate { table, .. }
            | Self::TableAlter { table, .. }
            | Self::TableDrop { table, .. } => Some(table),
            Self::TableRename { renames } => renames.first().map(|r| r.table.as_str()),
        }
    }

    /// Short name of the change kind, matching the serialized `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseCreate { .. } => "database-create",
            Self::DatabaseAlter { .. } => "database-alter",
            Self::DatabaseDrop { .. } => "database-drop",
            Self::TableCreate { .. } => "table-create",
            Self::TableAlter { .. } => "table-alter",
            Self::TableDrop { .. } => "table-drop",
            Self::TableRename { .. } => "table-rename",
        }
    }

    /// The object this change is aimed at, for error context.
    #[must_use]
    pub fn target(&self) -> TargetRef {
        TargetRef {
            database: self.database().unwrap_or_default().to_string(),
            table: self.table().map(str::to_string),
        }
    }

    /// Applies this change, returning a new schema.
    ///
    /// The input is never modified; untouched databases and tables are
    /// shared with the result. Preconditions are checked again here, so a
    /// change read back from history is as safe to apply as a freshly
    /// resolved one.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] if the schema does not match the change.
    /// The input schema stays valid.
    pub fn apply(&self, schema: &Schema) -> Result<Schema> {
        let mut next = schema.clone();
        match self {
            Self::DatabaseCreate { database, charset } => {
                if next.has_database(database) {
                    return Err(InvariantError::DatabaseExists {
                        database: database.clone(),
                    }
                    .into());
                }
                next.push_database(Database::new(database.as_str(), charset.as_str()));
            }
            Self::DatabaseAlter {
                database,
                charset,
                tables,
            } => {
                let case = next.case_sensitivity;
                let db = next.database_mut(database)?;
                db.charset.clone_from(charset);
                for name in tables {
                    let index = db
                        .table_index(name, case)
                        .ok_or_else(|| InvariantError::table_not_found(database, name))?;
                    db.table_at_mut(index).charset.clone_from(charset);
                }
            }
            Self::DatabaseDrop { database } => {
                let index = next
                    .database_index(database)
                    .ok_or_else(|| InvariantError::database_not_found(database))?;
                next.remove_database(index);
            }
            Self::TableCreate { def, .. } => insert_table(&mut next, def)?,
            Self::TableAlter {
                database,
                table,
                def,
                ..
            } => replace_table(&mut next, database, table, def)?,
            Self::TableDrop { database, table } => {
                let case = next.case_sensitivity;
                let db = next.database_mut(database)?;
                let index = db
                    .table_index(table, case)
                    .ok_or_else(|| InvariantError::table_not_found(database, table))?;
                db.remove_table(index);
            }
            Self::TableRename { renames } => {
                for rename in renames {
                    replace_table(&mut next, &rename.database, &rename.table, &rename.def)?;
                }
            }
        }
        info!(
            change = self.kind(),
            database = self.database().unwrap_or_default(),
            table = self.table().unwrap_or_default(),
            "Applied schema change"
        );
        Ok(next)
    }
}

fn insert_table(schema: &mut Schema, def: &Table) -> Result<()> {
    let case = schema.case_sensitivity;
    let db = schema.database_mut(&def.database)?;
    if db.has_table(&def.name, case) {
        return Err(InvariantError::table_exists(&def.database, &def.name).into());
    }
    db.push_table(Arc::new(def.clone()));
    Ok(())
}

/// Replaces `database.table` with `def`, moving it if `def` names another
/// table. Stays in place when the database does not change.
fn replace_table(schema: &mut Schema, database: &str, table: &str, def: &Table) -> Result<()> {
    let case = schema.case_sensitivity;
    schema.require_table(database, table)?;

    let same_database = case.names_equal(database, &def.database);
    let same_name = same_database && case.names_equal(table, &def.name);
    if !same_name && schema.has_table(&def.database, &def.name) {
        return Err(InvariantError::table_exists(&def.database, &def.name).into());
    }

    if same_database {
        let db = schema.database_mut(database)?;
        let index = db
            .table_index(table, case)
            .ok_or_else(|| InvariantError::table_not_found(database, table))?;
        db.replace_table(index, Arc::new(def.clone()));
        return Ok(());
    }

    if !schema.has_database(&def.database) {
        return Err(InvariantError::database_not_found(&def.database).into());
    }
    let source = schema.database_mut(database)?;
    let index = source
        .table_index(table, case)
        .ok_or_else(|| InvariantError::table_not_found(database, table))?;
    source.remove_table(index);
    schema
        .database_mut(&def.database)?
        .push_table(Arc::new(def.clone()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columndef::{ColumnDef, TypeAttributes};
    use crate::config::CaseSensitivity;
    use crate::error::SchemaError;

    fn orders(database: &str, name: &str) -> Table {
        let columns = vec![
            ColumnDef::build("id", "int", 0, TypeAttributes::default()).unwrap(),
            ColumnDef::build("note", "varchar", 0, TypeAttributes::default()).unwrap(),
        ];
        Table::new(database, name, "utf8mb4", columns, vec![String::from("id")])
    }

    fn base() -> Schema {
        let schema = Schema::new("utf8mb4", CaseSensitivity::CaseSensitive);
        let schema = ResolvedSchemaChange::DatabaseCreate {
            database: String::from("shop"),
            charset: String::from("utf8mb4"),
        }
        .apply(&schema)
        .unwrap();
        ResolvedSchemaChange::TableCreate {
            database: String::from("shop"),
            table: String::from("orders"),
            def: orders("shop", "orders"),
        }
        .apply(&schema)
        .unwrap()
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let before = base();
        let after = ResolvedSchemaChange::TableDrop {
            database: String::from("shop"),
            table: String::from("orders"),
        }
        .apply(&before)
        .unwrap();
        assert!(before.has_table("shop", "orders"));
        assert!(!after.has_table("shop", "orders"));
    }

    #[test]
    fn test_apply_is_deterministic() {
        let change = ResolvedSchemaChange::TableAlter {
            database: String::from("shop"),
            table: String::from("orders"),
            old: orders("shop", "orders"),
            def: orders("shop", "orders_v2"),
        };
        let base = base();
        let a = change.apply(&base).unwrap();
        let b = change.apply(&base).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_apply_revalidates() {
        let schema = base();
        let create_again = ResolvedSchemaChange::TableCreate {
            database: String::from("shop"),
            table: String::from("orders"),
            def: orders("shop", "orders"),
        };
        assert!(matches!(
            create_again.apply(&schema),
            Err(SchemaError::Invariant(InvariantError::TableExists { .. }))
        ));

        let drop_missing = ResolvedSchemaChange::DatabaseDrop {
            database: String::from("crm"),
        };
        let err = drop_missing.apply(&schema).unwrap_err();
        assert!(err.is_fatal_to_stream());
    }

    #[test]
    fn test_rename_across_databases() {
        let schema = ResolvedSchemaChange::DatabaseCreate {
            database: String::from("archive"),
            charset: String::from("latin1"),
        }
        .apply(&base())
        .unwrap();
        let change = ResolvedSchemaChange::TableRename {
            renames: vec![ResolvedRename {
                database: String::from("shop"),
                table: String::from("orders"),
                def: orders("archive", "old_orders"),
            }],
        };
        let next = change.apply(&schema).unwrap();
        assert!(!next.has_table("shop", "orders"));
        assert!(next.has_table("archive", "old_orders"));
    }

    #[test]
    fn test_database_alter_cascades_listed_tables_only() {
        let change = ResolvedSchemaChange::DatabaseAlter {
            database: String::from("shop"),
            charset: String::from("latin1"),
            tables: vec![String::from("orders")],
        };
        let next = change.apply(&base()).unwrap();
        assert_eq!(next.database("shop").unwrap().charset, "latin1");
        let table = next.table("shop", "orders").unwrap();
        assert_eq!(table.charset, "latin1");
        assert_eq!(table.column("note").unwrap().charset(), Some("utf8mb4"));
    }

    #[test]
    fn test_serialized_shape() {
        let change = ResolvedSchemaChange::DatabaseCreate {
            database: String::from("shop"),
            charset: String::from("utf8mb4"),
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            serde_json::json!({"type": "database-create", "database": "shop", "charset": "utf8mb4"})
        );

        let alter = ResolvedSchemaChange::DatabaseAlter {
            database: String::from("shop"),
            charset: String::from("latin1"),
            tables: vec![],
        };
        let value = serde_json::to_value(&alter).unwrap();
        assert!(value.get("tables").is_none());
        assert_eq!(value["type"], "database-alter");
    }
}
