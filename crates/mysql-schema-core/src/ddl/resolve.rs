//! Resolving parsed changes against a schema snapshot.

use tracing::debug;

use super::change::{AlterTable, ColumnMod, SchemaChange, TableName};
use super::resolved::{ResolvedRename, ResolvedSchemaChange};
use crate::config::{CharsetCascade, EngineConfig};
use crate::error::{InvariantError, Result};
use crate::schema::{column_names_equal, Schema, Table};

impl SchemaChange {
    /// Binds this change to `schema`.
    ///
    /// Returns `Ok(None)` when the change is a no-op: `IF EXISTS` on a
    /// missing target, `IF NOT EXISTS` on a present one, or an
    /// `ALTER DATABASE` that sets nothing.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] if the schema does not hold what the
    /// change expects, e.g. a missing table or an existing column.
    pub fn resolve(
        &self,
        schema: &Schema,
        config: &EngineConfig,
    ) -> Result<Option<ResolvedSchemaChange>> {
        let case = config.case_sensitivity;
        let resolved = match self {
            Self::CreateDatabase {
                database,
                charset,
                if_not_exists,
            } => {
                if schema.has_database(database) {
                    if *if_not_exists {
                        return Ok(noop(self));
                    }
                    return Err(InvariantError::DatabaseExists {
                        database: database.clone(),
                    }
                    .into());
                }
                ResolvedSchemaChange::DatabaseCreate {
                    database: case.stored_name(database),
                    charset: charset.clone().unwrap_or_else(|| schema.charset.clone()),
                }
            }

            Self::AlterDatabase { database, charset } => {
                let db = schema
                    .database(database)
                    .ok_or_else(|| InvariantError::database_not_found(database))?;
                let Some(charset) = charset else {
                    return Ok(noop(self));
                };
                let tables = match config.charset_cascade {
                    CharsetCascade::Never => Vec::new(),
                    CharsetCascade::InheritingTables => db
                        .tables()
                        .iter()
                        .filter(|t| {
                            t.charset.eq_ignore_ascii_case(&db.charset)
                                && !t.charset.eq_ignore_ascii_case(charset)
                        })
                        .map(|t| t.name.clone())
                        .collect(),
                };
                ResolvedSchemaChange::DatabaseAlter {
                    database: db.name.clone(),
                    charset: charset.clone(),
                    tables,
                }
            }

            Self::DropDatabase {
                database,
                if_exists,
            } => match schema.database(database) {
                Some(db) => ResolvedSchemaChange::DatabaseDrop {
                    database: db.name.clone(),
                },
                None if *if_exists => return Ok(noop(self)),
                None => return Err(InvariantError::database_not_found(database).into()),
            },

            Self::CreateTable {
                database,
                table,
                columns,
                primary_key,
                charset,
                if_not_exists,
                like,
            } => {
                let db = schema
                    .database(database)
                    .ok_or_else(|| InvariantError::database_not_found(database))?;
                if db.has_table(table, schema.case_sensitivity) {
                    if *if_not_exists {
                        return Ok(noop(self));
                    }
                    return Err(InvariantError::table_exists(database, table).into());
                }
                let name = case.stored_name(table);
                let def = match like {
                    Some(source) => schema
                        .require_table(&source.database, &source.table)?
                        .relocated(&db.name, &name),
                    None => {
                        for (i, column) in columns.iter().enumerate() {
                            if columns[..i]
                                .iter()
                                .any(|c| column_names_equal(c.name(), column.name()))
                            {
                                return Err(InvariantError::ColumnExists {
                                    database: database.clone(),
                                    table: table.clone(),
                                    column: column.name().to_string(),
                                }
                                .into());
                            }
                        }
                        Table::new(
                            db.name.as_str(),
                            name.as_str(),
                            charset.clone().unwrap_or_else(|| db.charset.clone()),
                            columns.clone(),
                            primary_key.clone(),
                        )
                    }
                };
                ResolvedSchemaChange::TableCreate {
                    database: db.name.clone(),
                    table: name,
                    def,
                }
            }

            Self::AlterTable(alter) => resolve_alter(alter, schema, config)?,

            Self::DropTable {
                database,
                table,
                if_exists,
            } => match schema.require_table(database, table) {
                Ok(found) => ResolvedSchemaChange::TableDrop {
                    database: found.database.clone(),
                    table: found.name.clone(),
                },
                Err(_) if *if_exists => return Ok(noop(self)),
                Err(err) => return Err(err.into()),
            },

            Self::RenameTables { renames } => {
                let mut working = schema.clone();
                let mut resolved = Vec::with_capacity(renames.len());
                for (from, to) in renames {
                    let rename = resolve_rename(&working, from, to, config)?;
                    working = ResolvedSchemaChange::TableRename {
                        renames: vec![rename.clone()],
                    }
                    .apply(&working)?;
                    resolved.push(rename);
                }
                ResolvedSchemaChange::TableRename { renames: resolved }
            }
        };
        Ok(Some(resolved))
    }
}

fn noop(change: &SchemaChange) -> Option<ResolvedSchemaChange> {
    debug!(
        change = change.kind(),
        target = %change.target(),
        "Schema change resolved to a no-op"
    );
    None
}

fn resolve_rename(
    schema: &Schema,
    from: &TableName,
    to: &TableName,
    config: &EngineConfig,
) -> Result<ResolvedRename> {
    let table = schema.require_table(&from.database, &from.table)?;
    let target_db = schema
        .database(&to.database)
        .ok_or_else(|| InvariantError::database_not_found(&to.database))?;
    if target_db.has_table(&to.table, schema.case_sensitivity) {
        return Err(InvariantError::table_exists(&to.database, &to.table).into());
    }
    Ok(ResolvedRename {
        database: table.database.clone(),
        table: table.name.clone(),
        def: table.relocated(
            &target_db.name,
            &config.case_sensitivity.stored_name(&to.table),
        ),
    })
}

fn resolve_alter(
    alter: &AlterTable,
    schema: &Schema,
    config: &EngineConfig,
) -> Result<ResolvedSchemaChange> {
    let old = schema.require_table(&alter.database, &alter.table)?;
    let mut def = Table::clone(old);
    let here = TableName::new(old.database.as_str(), old.name.as_str());
    let column_missing = |name: &str| InvariantError::ColumnNotFound {
        database: here.database.clone(),
        table: here.table.clone(),
        column: name.to_string(),
    };
    let column_exists = |name: &str| InvariantError::ColumnExists {
        database: here.database.clone(),
        table: here.table.clone(),
        column: name.to_string(),
    };

    if let Some(to) = &alter.new_name {
        let same = schema.case_sensitivity.names_equal(&to.database, &old.database)
            && schema.case_sensitivity.names_equal(&to.table, &old.name);
        if !same {
            let target_db = schema
                .database(&to.database)
                .ok_or_else(|| InvariantError::database_not_found(&to.database))?;
            if target_db.has_table(&to.table, schema.case_sensitivity) {
                return Err(InvariantError::table_exists(&to.database, &to.table).into());
            }
            def.database.clone_from(&target_db.name);
            def.name = config.case_sensitivity.stored_name(&to.table);
        }
    }

    if let Some(charset) = &alter.default_charset {
        def.charset.clone_from(charset);
    }

    for column_mod in &alter.column_mods {
        match column_mod {
            ColumnMod::Add {
                column,
                position,
                if_not_exists,
            } => {
                if def.columns.contains(column.name()) {
                    if *if_not_exists {
                        continue;
                    }
                    return Err(column_exists(column.name()).into());
                }
                let index = position.index(&def.columns, def.columns.len(), &here)?;
                let mut column = column.clone();
                column.inherit_charset(&def.charset);
                def.columns.insert(index, column);
            }
            ColumnMod::Change {
                name,
                column,
                position,
                if_exists,
            } => {
                let original = match def.columns.index_of(name) {
                    Some(index) => index,
                    None if *if_exists => continue,
                    None => return Err(column_missing(name).into()),
                };
                let renamed = !column_names_equal(name, column.name());
                if renamed && def.columns.contains(column.name()) {
                    return Err(column_exists(column.name()).into());
                }
                def.columns.remove(original);
                let index = position.index(&def.columns, original, &here)?;
                let mut column = column.clone();
                column.inherit_charset(&def.charset);
                let new_name = column.name().to_string();
                def.columns.insert(index, column);
                if renamed {
                    def.rename_key_column(name, &new_name);
                }
            }
            ColumnMod::Remove { name, if_exists } => match def.columns.index_of(name) {
                Some(index) => {
                    def.columns.remove(index);
                    def.forget_key_column(name);
                }
                None if *if_exists => {}
                None => return Err(column_missing(name).into()),
            },
            ColumnMod::Rename { name, new_name } => {
                let index = def
                    .columns
                    .index_of(name)
                    .ok_or_else(|| column_missing(name))?;
                if !column_names_equal(name, new_name) && def.columns.contains(new_name) {
                    return Err(column_exists(new_name).into());
                }
                if let Some(column) = def.columns.remove(index) {
                    def.columns.insert(index, column.renamed(new_name.as_str()));
                }
                def.rename_key_column(name, new_name);
            }
        }
    }

    if let Some(charset) = &alter.convert_charset {
        def.convert_to(charset);
    }
    if let Some(primary_key) = &alter.primary_key {
        def.primary_key.clone_from(primary_key);
    }

    Ok(ResolvedSchemaChange::TableAlter {
        database: old.database.clone(),
        table: old.name.clone(),
        old: Table::clone(old),
        def,
    })
}
