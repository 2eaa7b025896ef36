//! Resolved changes survive serialization and replay identically.

mod common;
use common::*;

use mysql_schema_core::{CaseSensitivity, ResolvedSchemaChange, Schema};

const HISTORY: &[&str] = &[
    "CREATE DATABASE archive CHARACTER SET latin1",
    "CREATE TABLE orders (id int unsigned PRIMARY KEY, status enum('new','paid'), \
     placed_at datetime(3), note text CHARACTER SET latin1, raw varbinary(16))",
    "ALTER TABLE orders ADD COLUMN total decimal(10,2) AFTER id, DROP COLUMN note",
    "ALTER TABLE orders CHANGE status state set('new','paid','void')",
    "RENAME TABLE orders TO archive.orders_2024",
    "ALTER DATABASE archive CHARACTER SET utf8mb4",
    "CREATE TABLE scratch (id int)",
    "DROP TABLE scratch",
    "DROP DATABASE archive",
];

fn recorded() -> Vec<ResolvedSchemaChange> {
    let mut tracker = tracker_with(mysql_schema_core::EngineConfig::default());
    apply_all(&mut tracker, HISTORY)
}

#[test]
fn test_every_kind_round_trips() {
    let changes = recorded();
    let kinds: Vec<_> = changes.iter().map(ResolvedSchemaChange::kind).collect();
    for kind in [
        "database-create",
        "database-alter",
        "database-drop",
        "table-create",
        "table-alter",
        "table-drop",
        "table-rename",
    ] {
        assert!(kinds.contains(&kind), "no {kind} in history");
    }

    for change in &changes {
        let json = serde_json::to_string(change).unwrap();
        let back: ResolvedSchemaChange = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, change);
        assert_eq!(serde_json::to_string(&back).unwrap(), json);
    }
}

#[test]
fn test_serialized_shape_is_tagged() {
    let changes = recorded();
    let create = serde_json::to_value(&changes[1]).unwrap();
    assert_eq!(create["type"], "table-create");
    assert_eq!(create["database"], "shop");
    assert_eq!(create["table"], "orders");
    assert_eq!(create["def"]["primary-key"], serde_json::json!(["id"]));
    let columns = create["def"]["columns"].as_array().unwrap();
    assert_eq!(columns[0]["type"], "int");
    assert_eq!(columns[0]["signed"], false);
    assert_eq!(columns[1]["enum-values"], serde_json::json!(["new", "paid"]));
}

#[test]
fn test_replaying_deserialized_history_rebuilds_schema() {
    let mut tracker = tracker_with(mysql_schema_core::EngineConfig::default());
    let base = Schema::clone(tracker.schema());
    let changes = apply_all(&mut tracker, &HISTORY[..HISTORY.len() - 1]);
    let live = Schema::clone(tracker.schema());

    let lines: Vec<String> = changes
        .iter()
        .map(|c| serde_json::to_string(c).unwrap())
        .collect();
    let replayed = lines.iter().fold(base, |schema, line| {
        let change: ResolvedSchemaChange = serde_json::from_str(line).unwrap();
        change.apply(&schema).unwrap()
    });

    assert_eq!(replayed, live);
    assert!(replayed.diff(&live, "replayed", "live").is_empty());
    assert_positions_dense(&replayed);
}

#[test]
fn test_schema_snapshot_round_trips() {
    let schema = schema_with(&HISTORY[..5]);
    let json = serde_json::to_string(&schema).unwrap();
    let back: Schema = serde_json::from_str(&json).unwrap();
    assert_eq!(back, schema);
    assert_eq!(back.case_sensitivity, CaseSensitivity::CaseSensitive);
    assert!(back.table("archive", "orders_2024").unwrap().columns.contains("TOTAL"));
}
