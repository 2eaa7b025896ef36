mod common;

use common::*;
use mysql_schema_core::{EngineConfig, Schema};
use mysql_schema_replay::{DdlEvent, Recorder, ReplayError, SchemaHistory};
use tempfile::TempDir;

#[test]
fn test_resume_rebuilds_live_schema() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);

    let mut live = recorder_at(&path);
    record_all(&mut live, SESSION);
    // The INSERT changed nothing and left no entry.
    assert_eq!(live.history().entries().len(), SESSION.len() - 1);

    let resumed = recorder_at(&path);
    assert_eq!(
        **resumed.tracker().schema(),
        **live.tracker().schema()
    );
    assert_eq!(resumed.history().last_position(), Some(&pos(600)));
    assert!(resumed
        .tracker()
        .schema()
        .diff(live.tracker().schema(), "resumed", "live")
        .is_empty());
}

#[test]
fn test_resume_then_continue() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    record_all(&mut recorder_at(&path), &SESSION[..3]);

    let mut resumed = recorder_at(&path);
    record_all(&mut resumed, &SESSION[3..]);

    let mut straight = recorder_at(&dir.path().join("other.jsonl"));
    record_all(&mut straight, SESSION);
    assert_eq!(**resumed.tracker().schema(), **straight.tracker().schema());
}

#[test]
fn test_replay_until_checkpoint() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    record_all(&mut recorder_at(&path), SESSION);

    let history = SchemaHistory::open(&path).unwrap();
    let at_300 = history.replay(&empty_schema(), Some(&pos(399))).unwrap();
    let orders = at_300.table("shop", "orders").unwrap();
    assert_eq!(orders.columns.names(), vec!["id", "total", "note"]);
    assert!(!at_300.has_table("shop", "audit"));
    assert_eq!(orders.charset, "latin1");

    let full = history.replay(&empty_schema(), None).unwrap();
    assert!(full.has_table("shop", "audit_log"));
    assert_eq!(full.table("shop", "orders").unwrap().charset, "utf8mb4");
}

#[test]
fn test_replay_onto_wrong_base_fails() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    record_all(&mut recorder_at(&path), SESSION);

    let history = SchemaHistory::open(&path).unwrap();
    let already_has_shop = history.replay(&empty_schema(), Some(&pos(100))).unwrap();
    let err = history.replay(&already_has_shop, None).unwrap_err();
    assert!(matches!(err, ReplayError::Schema(ref e) if e.is_fatal_to_stream()));
    assert!(Recorder::resume(&already_has_shop, EngineConfig::default(), history).is_err());
}

#[test]
fn test_events_follow_history() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    let mut recorder = recorder_at(&path);
    record_all(&mut recorder, SESSION);

    let events: Vec<DdlEvent> = recorder
        .history()
        .entries()
        .iter()
        .flat_map(DdlEvent::from_entry)
        .collect();
    let kinds: Vec<&str> = events.iter().map(|e| e.change.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            "database-create",
            "table-create",
            "table-alter",
            "table-create",
            "table-rename",
            "table-alter",
        ]
    );
    assert_eq!(events[2].position, pos(300));
    assert!(events[2].sql.contains("ADD COLUMN total"));

    let json = serde_json::to_value(&events[4]).unwrap();
    assert_eq!(json["type"], "table-rename");
    assert_eq!(json["renames"][0]["table"], "audit");
    assert_eq!(json["renames"][0]["def"]["table"], "audit_log");
}

#[test]
fn test_history_file_is_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = history_path(&dir);
    record_all(&mut recorder_at(&path), &SESSION[..2]);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["position"], "mysql-bin.000007:100");
    assert_eq!(lines[1]["database"], "shop");
    assert_eq!(lines[1]["changes"][0]["type"], "table-create");
    assert!(lines[1]["recorded-at"].is_string());
}

#[test]
fn test_schema_snapshot_file_as_base() {
    let dir = TempDir::new().unwrap();
    let mut first = recorder_at(&history_path(&dir));
    record_all(&mut first, &SESSION[..2]);

    // A checkpoint snapshot plus a fresh history picks up where it left off.
    let snapshot = serde_json::to_string(&**first.tracker().schema()).unwrap();
    let base: Schema = serde_json::from_str(&snapshot).unwrap();
    let history = SchemaHistory::open(dir.path().join("after-checkpoint.jsonl")).unwrap();
    let mut recorder = Recorder::resume(&base, EngineConfig::default(), history).unwrap();
    record_all(&mut recorder, &SESSION[3..4]);
    assert_eq!(
        recorder.tracker().schema().table("shop", "orders").unwrap().columns.len(),
        3
    );
}
