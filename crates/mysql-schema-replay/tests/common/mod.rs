#![allow(dead_code)]

use std::path::{Path, PathBuf};

use mysql_schema_core::{CaseSensitivity, EngineConfig, Schema};
use mysql_schema_replay::{BinlogPosition, Recorder, SchemaHistory};
use tempfile::TempDir;

pub const BINLOG: &str = "mysql-bin.000007";

pub fn pos(offset: u64) -> BinlogPosition {
    BinlogPosition::new(BINLOG, offset)
}

pub fn empty_schema() -> Schema {
    Schema::new("utf8mb4", CaseSensitivity::CaseSensitive)
}

pub fn history_path(dir: &TempDir) -> PathBuf {
    dir.path().join("schema-history.jsonl")
}

pub fn recorder_at(path: &Path) -> Recorder {
    let history = SchemaHistory::open(path)
        .unwrap_or_else(|e| panic!("Failed to open {}: {e}", path.display()));
    Recorder::resume(&empty_schema(), EngineConfig::default(), history)
        .unwrap_or_else(|e| panic!("Failed to resume: {e}"))
}

/// Records `(offset, database, sql)` statements in order.
pub fn record_all(recorder: &mut Recorder, statements: &[(u64, Option<&str>, &str)]) {
    for (offset, database, sql) in statements {
        recorder
            .record(pos(*offset), *database, sql)
            .unwrap_or_else(|e| panic!("Failed to record: {sql}\nError: {e}"));
    }
}

pub const SESSION: &[(u64, Option<&str>, &str)] = &[
    (100, None, "CREATE DATABASE shop DEFAULT CHARSET latin1"),
    (200, Some("shop"), "CREATE TABLE orders (id int unsigned PRIMARY KEY, note varchar(40))"),
    (250, Some("shop"), "INSERT INTO orders VALUES (1, 'x')"),
    (300, Some("shop"), "ALTER TABLE orders ADD COLUMN total decimal(10,2) AFTER id"),
    (400, Some("shop"), "CREATE TABLE audit LIKE orders"),
    (500, Some("shop"), "RENAME TABLE audit TO audit_log"),
    (600, Some("shop"), "ALTER TABLE orders CONVERT TO CHARACTER SET utf8mb4"),
];
