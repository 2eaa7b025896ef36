//! DDL output events.
//!
//! When DDL output is enabled each resolved change is also emitted
//! downstream as a flat JSON object: the change's own fields plus the
//! statement text, its binlog position and a millisecond timestamp.

use serde::{Deserialize, Serialize};

use mysql_schema_core::ResolvedSchemaChange;

use crate::history::{BinlogPosition, HistoryEntry};

/// One resolved change as emitted to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlEvent {
    #[serde(flatten)]
    pub change: ResolvedSchemaChange,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    pub sql: String,
    pub position: BinlogPosition,
}

impl DdlEvent {
    /// One event per change of a recorded entry, in order.
    #[must_use]
    pub fn from_entry(entry: &HistoryEntry) -> Vec<Self> {
        let ts = entry.recorded_at.timestamp_millis();
        entry
            .changes
            .iter()
            .map(|change| Self {
                change: change.clone(),
                ts,
                sql: entry.sql.clone(),
                position: entry.position.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_flat() {
        let entry = HistoryEntry::new(
            BinlogPosition::new("mysql-bin.000003", 1024),
            "DROP TABLE shop.orders",
            Some("shop"),
            vec![ResolvedSchemaChange::TableDrop {
                database: String::from("shop"),
                table: String::from("orders"),
            }],
        );
        let events = DdlEvent::from_entry(&entry);
        assert_eq!(events.len(), 1);

        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["type"], "table-drop");
        assert_eq!(json["database"], "shop");
        assert_eq!(json["table"], "orders");
        assert_eq!(json["sql"], "DROP TABLE shop.orders");
        assert_eq!(json["position"], "mysql-bin.000003:1024");
        assert_eq!(json["ts"], entry.recorded_at.timestamp_millis());

        let back: DdlEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, events[0]);
    }
}
