//! Tracking with a durable history.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mysql_schema_core::{EngineConfig, Schema, SchemaTracker};

use crate::error::Result;
use crate::history::{BinlogPosition, HistoryEntry, SchemaHistory};

/// A DDL statement read from the binlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinlogStatement {
    pub position: BinlogPosition,
    #[serde(default)]
    pub database: Option<String>,
    pub sql: String,
}

/// A [`SchemaTracker`] that records every change it applies.
///
/// The schema only advances once a statement's entry has been written, so
/// a failed write leaves both unchanged. Statements that change nothing
/// leave no entry.
pub struct Recorder {
    tracker: SchemaTracker,
    history: SchemaHistory,
}

impl Recorder {
    /// Rebuilds the schema from `base` and everything in `history`, then
    /// tracks from there.
    ///
    /// # Errors
    ///
    /// Returns an error if the history does not replay onto `base` or the
    /// tracker cannot be built.
    pub fn resume(base: &Schema, config: EngineConfig, history: SchemaHistory) -> Result<Self> {
        let schema = history.replay(base, None)?;
        let tracker = SchemaTracker::new(schema, config)?;
        if let Some(position) = history.last_position() {
            info!(%position, "Resuming schema tracking");
        }
        Ok(Self { tracker, history })
    }

    /// Processes one statement at `position`.
    ///
    /// Returns the recorded entry, or `None` if the statement changed
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidPosition`](crate::ReplayError::InvalidPosition)
    /// for a position at or before the last recorded one, a
    /// [`ReplayError::Statement`](crate::ReplayError::Statement) if the
    /// statement fails, or an IO error if the entry cannot be written.
    pub fn record(
        &mut self,
        position: BinlogPosition,
        database: Option<&str>,
        sql: &str,
    ) -> Result<Option<&HistoryEntry>> {
        self.history.check_position(&position)?;
        let prepared = self.tracker.prepare(database, sql)?;
        if prepared.is_empty() {
            debug!(%position, "Statement changed nothing");
            return Ok(None);
        }
        let changes = prepared.changes().to_vec();
        self.history
            .append(HistoryEntry::new(position, sql, database, changes))?;
        self.tracker.commit(prepared);
        Ok(self.history.entries().last())
    }

    /// Processes a statement record.
    ///
    /// # Errors
    ///
    /// See [`Recorder::record`].
    pub fn record_statement(&mut self, statement: &BinlogStatement) -> Result<Option<&HistoryEntry>> {
        self.record(
            statement.position.clone(),
            statement.database.as_deref(),
            &statement.sql,
        )
    }

    #[must_use]
    pub const fn tracker(&self) -> &SchemaTracker {
        &self.tracker
    }

    #[must_use]
    pub const fn history(&self) -> &SchemaHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplayError;
    use mysql_schema_core::CaseSensitivity;
    use tempfile::TempDir;

    fn pos(offset: u64) -> BinlogPosition {
        BinlogPosition::new("mysql-bin.000001", offset)
    }

    fn base() -> Schema {
        Schema::new("utf8mb4", CaseSensitivity::CaseSensitive)
    }

    #[test]
    fn test_records_only_changes() {
        let dir = TempDir::new().unwrap();
        let history = SchemaHistory::open(dir.path().join("h.jsonl")).unwrap();
        let mut recorder = Recorder::resume(&base(), EngineConfig::default(), history).unwrap();

        assert!(recorder.record(pos(10), None, "CREATE DATABASE shop").unwrap().is_some());
        assert!(recorder.record(pos(20), Some("shop"), "BEGIN").unwrap().is_none());
        assert!(recorder
            .record(pos(30), Some("shop"), "CREATE DATABASE IF NOT EXISTS shop")
            .unwrap()
            .is_none());
        assert_eq!(recorder.history().entries().len(), 1);
    }

    #[test]
    fn test_stale_position_is_rejected_before_applying() {
        let dir = TempDir::new().unwrap();
        let history = SchemaHistory::open(dir.path().join("h.jsonl")).unwrap();
        let mut recorder = Recorder::resume(&base(), EngineConfig::default(), history).unwrap();
        recorder.record(pos(10), None, "CREATE DATABASE shop").unwrap();

        let err = recorder
            .record(pos(10), None, "CREATE DATABASE other")
            .unwrap_err();
        assert!(matches!(err, ReplayError::InvalidPosition { .. }));
        assert!(!recorder.tracker().schema().has_database("other"));
    }

    #[test]
    fn test_failed_write_leaves_schema_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.jsonl");
        let history = SchemaHistory::open(&path).unwrap();
        let mut recorder = Recorder::resume(&base(), EngineConfig::default(), history).unwrap();

        // A directory where the history file should be makes the append fail.
        std::fs::create_dir(&path).unwrap();
        let err = recorder
            .record(pos(10), None, "CREATE DATABASE shop")
            .unwrap_err();
        assert!(matches!(err, ReplayError::Io(_)));
        assert!(!recorder.tracker().schema().has_database("shop"));
        assert!(!recorder.tracker().handle().current().has_database("shop"));
        assert!(recorder.history().entries().is_empty());

        // Once the file can be written the same statement records normally.
        std::fs::remove_dir(&path).unwrap();
        assert!(recorder.record(pos(10), None, "CREATE DATABASE shop").unwrap().is_some());
        assert!(recorder.tracker().schema().has_database("shop"));
        assert_eq!(recorder.history().entries().len(), 1);
    }

    #[test]
    fn test_failed_statement_is_not_recorded() {
        let dir = TempDir::new().unwrap();
        let history = SchemaHistory::open(dir.path().join("h.jsonl")).unwrap();
        let mut recorder = Recorder::resume(&base(), EngineConfig::default(), history).unwrap();

        let err = recorder
            .record(pos(10), None, "DROP DATABASE missing")
            .unwrap_err();
        assert!(matches!(err, ReplayError::Statement(ref e) if e.is_fatal_to_stream()));
        assert!(recorder.history().entries().is_empty());
    }
}
