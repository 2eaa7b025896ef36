#![allow(dead_code)]

use mysql_schema_core::ddl::AlterTable;
use mysql_schema_core::{
    DdlParser, EngineConfig, ResolvedSchemaChange, Schema, SchemaChange,
    SchemaError, SchemaTracker, StatementError,
};

pub const DB: &str = "shop";

pub fn parse(sql: &str) -> Vec<SchemaChange> {
    DdlParser::new()
        .unwrap()
        .parse(Some(DB), sql)
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e:?}"))
}

pub fn parse_err(sql: &str) -> SchemaError {
    DdlParser::new()
        .unwrap()
        .parse(Some(DB), sql)
        .expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn parse_alter(sql: &str) -> AlterTable {
    match parse(sql).remove(0) {
        SchemaChange::AlterTable(alter) => alter,
        other => panic!("Expected ALTER TABLE, got {other:?}"),
    }
}

/// A tracker holding an empty `shop` database.
pub fn tracker_with(config: EngineConfig) -> SchemaTracker {
    let schema = Schema::new("utf8mb4", config.case_sensitivity);
    let mut tracker = SchemaTracker::new(schema, config).unwrap();
    tracker
        .process(None, &format!("CREATE DATABASE {DB} DEFAULT CHARACTER SET utf8mb4"))
        .unwrap_or_else(|e| panic!("Failed to create {DB}: {e}"));
    tracker
}

/// Runs statements in `shop`, returning every resolved change.
pub fn apply_all(tracker: &mut SchemaTracker, statements: &[&str]) -> Vec<ResolvedSchemaChange> {
    statements
        .iter()
        .flat_map(|sql| {
            tracker
                .process(Some(DB), sql)
                .unwrap_or_else(|e| panic!("Failed to apply: {sql}\nError: {e}"))
        })
        .collect()
}

/// The schema after running `statements` in a fresh `shop` database.
pub fn schema_with(statements: &[&str]) -> Schema {
    let mut tracker = tracker_with(EngineConfig::default());
    apply_all(&mut tracker, statements);
    Schema::clone(tracker.schema())
}

pub fn apply_err(statements: &[&str], failing: &str) -> StatementError {
    let mut tracker = tracker_with(EngineConfig::default());
    apply_all(&mut tracker, statements);
    tracker
        .process(Some(DB), failing)
        .expect_err(&format!("Expected failure for: {failing}"))
}

pub fn column_names(schema: &Schema, table: &str) -> Vec<String> {
    schema
        .table(DB, table)
        .unwrap_or_else(|| panic!("No table {table}"))
        .columns
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Asserts `columns[i].position == i` for every column of every table.
pub fn assert_positions_dense(schema: &Schema) {
    for db in schema.databases() {
        for table in db.tables() {
            for (i, column) in table.columns.iter().enumerate() {
                assert_eq!(
                    column.position(),
                    i,
                    "`{}`.`{}`.`{}` out of place",
                    db.name,
                    table.name,
                    column.name()
                );
                assert_eq!(table.columns.index_of(&column.name().to_uppercase()), Some(i));
            }
        }
    }
}
