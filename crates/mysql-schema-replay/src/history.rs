//! Schema history ledger.
//!
//! Every statement that changed the schema is recorded with its binlog
//! position and the resolved changes it produced. The ledger is a JSON
//! lines file: one [`HistoryEntry`] per line, in strictly increasing
//! position order. Replaying it onto the schema it started from rebuilds
//! the schema at any recorded position without parsing SQL again.

use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use mysql_schema_core::{ResolvedSchemaChange, Schema};

use crate::error::{ReplayError, Result};

/// A position in the binlog stream, written `file:offset`.
///
/// Positions order by file, then offset. Files order by base name, then by
/// the numeric sequence after the last `.`, so `mysql-bin.999999` comes
/// before `mysql-bin.1000000` once the padding runs out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BinlogPosition {
    /// Binlog file name, e.g. `mysql-bin.000042`.
    pub file: String,
    /// Byte offset of the event within the file.
    pub offset: u64,
}

impl BinlogPosition {
    /// Creates a position.
    #[must_use]
    pub fn new(file: impl Into<String>, offset: u64) -> Self {
        Self {
            file: file.into(),
            offset,
        }
    }
}

impl BinlogPosition {
    /// The file's base name and sequence number, if it has one.
    fn sequence(&self) -> (&str, Option<u64>) {
        match self.file.rsplit_once('.') {
            Some((base, seq)) if seq.bytes().all(|b| b.is_ascii_digit()) => {
                match seq.parse() {
                    Ok(n) => (base, Some(n)),
                    Err(_) => (&self.file, None),
                }
            }
            _ => (&self.file, None),
        }
    }
}

impl Ord for BinlogPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        let (base, seq) = self.sequence();
        let (other_base, other_seq) = other.sequence();
        base.cmp(other_base)
            .then(seq.cmp(&other_seq))
            .then_with(|| self.file.cmp(&other.file))
            .then(self.offset.cmp(&other.offset))
    }
}

impl PartialOrd for BinlogPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BinlogPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.offset)
    }
}

impl FromStr for BinlogPosition {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self> {
        let (file, offset) = s
            .rsplit_once(':')
            .ok_or_else(|| ReplayError::MalformedPosition(s.to_string()))?;
        let offset = offset
            .parse()
            .map_err(|_| ReplayError::MalformedPosition(s.to_string()))?;
        if file.is_empty() {
            return Err(ReplayError::MalformedPosition(s.to_string()));
        }
        Ok(Self::new(file, offset))
    }
}

impl TryFrom<String> for BinlogPosition {
    type Error = ReplayError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BinlogPosition> for String {
    fn from(position: BinlogPosition) -> Self {
        position.to_string()
    }
}

/// One recorded statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HistoryEntry {
    /// Where the statement was read from.
    pub position: BinlogPosition,
    /// The statement text.
    pub sql: String,
    /// The session database the statement ran in.
    #[serde(default)]
    pub database: Option<String>,
    /// The resolved changes, in application order.
    pub changes: Vec<ResolvedSchemaChange>,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        position: BinlogPosition,
        sql: impl Into<String>,
        database: Option<&str>,
        changes: Vec<ResolvedSchemaChange>,
    ) -> Self {
        Self {
            position,
            sql: sql.into(),
            database: database.map(str::to_string),
            changes,
            recorded_at: Utc::now(),
        }
    }
}

/// An append-only history file and the entries read from it.
#[derive(Debug)]
pub struct SchemaHistory {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl SchemaHistory {
    /// Opens a history file, reading any entries it already holds. A
    /// missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidState`] for an unreadable line or one
    /// that does not advance the position.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut history = Self {
            path,
            entries: Vec::new(),
        };
        if !history.path.exists() {
            debug!(path = %history.path.display(), "Starting empty schema history");
            return Ok(history);
        }

        let content = fs::read_to_string(&history.path)?;
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let invalid = |message: String| ReplayError::InvalidState {
                path: history.path.clone(),
                line: index + 1,
                message,
            };
            let entry: HistoryEntry =
                serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
            if let Some(previous) = history.last_position() {
                if entry.position <= *previous {
                    return Err(invalid(format!(
                        "position {} does not follow {previous}",
                        entry.position
                    )));
                }
            }
            history.entries.push(entry);
        }
        debug!(
            path = %history.path.display(),
            entries = history.entries.len(),
            "Loaded schema history"
        );
        Ok(history)
    }

    /// The history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in position order.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The position of the last entry.
    #[must_use]
    pub fn last_position(&self) -> Option<&BinlogPosition> {
        self.entries.last().map(|e| &e.position)
    }

    /// Checks that `position` comes after every recorded entry.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidPosition`] otherwise.
    pub fn check_position(&self, position: &BinlogPosition) -> Result<()> {
        match self.last_position() {
            Some(previous) if position <= previous => Err(ReplayError::InvalidPosition {
                position: position.clone(),
                previous: previous.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Appends an entry and writes it to the file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidPosition`] if the entry does not
    /// advance the position, or an IO error if the write fails.
    pub fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.check_position(&entry.position)?;
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        debug!(position = %entry.position, changes = entry.changes.len(), "Recorded schema change");
        self.entries.push(entry);
        Ok(())
    }

    /// Rebuilds the schema by applying every entry up to and including
    /// `until` to `base`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Schema`] if a recorded change does not apply,
    /// meaning `base` is not the schema the history started from.
    pub fn replay(&self, base: &Schema, until: Option<&BinlogPosition>) -> Result<Schema> {
        let mut schema = base.clone();
        let mut applied = 0usize;
        for entry in &self.entries {
            if until.is_some_and(|until| entry.position > *until) {
                break;
            }
            for change in &entry.changes {
                schema = change.apply(&schema)?;
            }
            applied += 1;
        }
        info!(
            entries = applied,
            position = %until.map_or_else(|| String::from("end"), ToString::to_string),
            "Replayed schema history"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mysql_schema_core::CaseSensitivity;
    use tempfile::TempDir;

    fn create_database(name: &str) -> ResolvedSchemaChange {
        ResolvedSchemaChange::DatabaseCreate {
            database: name.to_string(),
            charset: String::from("utf8mb4"),
        }
    }

    fn entry(offset: u64, database: &str) -> HistoryEntry {
        HistoryEntry::new(
            BinlogPosition::new("mysql-bin.000001", offset),
            format!("CREATE DATABASE {database}"),
            None,
            vec![create_database(database)],
        )
    }

    #[test]
    fn test_position_parse_and_order() {
        let a: BinlogPosition = "mysql-bin.000001:4".parse().unwrap();
        let b: BinlogPosition = "mysql-bin.000001:120".parse().unwrap();
        let c: BinlogPosition = "mysql-bin.000002:4".parse().unwrap();
        assert!(a < b && b < c);

        let last_padded: BinlogPosition = "mysql-bin.999999:4".parse().unwrap();
        let rolled_over: BinlogPosition = "mysql-bin.1000000:4".parse().unwrap();
        assert!(last_padded < rolled_over);
        assert!(rolled_over.to_string() < last_padded.to_string());
        assert_eq!(b.to_string(), "mysql-bin.000001:120");
        assert!("mysql-bin.000001".parse::<BinlogPosition>().is_err());
        assert!(":4".parse::<BinlogPosition>().is_err());
    }

    #[test]
    fn test_append_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.jsonl");

        let mut history = SchemaHistory::open(&path).unwrap();
        assert!(history.entries().is_empty());
        history.append(entry(100, "a")).unwrap();
        history.append(entry(200, "b")).unwrap();

        let reopened = SchemaHistory::open(&path).unwrap();
        assert_eq!(reopened.entries(), history.entries());
        assert_eq!(
            reopened.last_position(),
            Some(&BinlogPosition::new("mysql-bin.000001", 200))
        );
    }

    #[test]
    fn test_append_rejects_stale_position() {
        let dir = TempDir::new().unwrap();
        let mut history = SchemaHistory::open(dir.path().join("h.jsonl")).unwrap();
        history.append(entry(100, "a")).unwrap();
        assert!(matches!(
            history.append(entry(100, "b")),
            Err(ReplayError::InvalidPosition { .. })
        ));
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn test_append_across_sequence_rollover() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.jsonl");
        let mut history = SchemaHistory::open(&path).unwrap();
        let mut first = entry(4, "a");
        first.position = BinlogPosition::new("mysql-bin.999999", 4);
        let mut second = entry(4, "b");
        second.position = BinlogPosition::new("mysql-bin.1000000", 4);
        history.append(first).unwrap();
        history.append(second).unwrap();

        let reopened = SchemaHistory::open(&path).unwrap();
        assert_eq!(reopened.entries().len(), 2);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.jsonl");
        fs::write(&path, "{\"not\": \"an entry\"}\n").unwrap();
        assert!(matches!(
            SchemaHistory::open(&path),
            Err(ReplayError::InvalidState { line: 1, .. })
        ));
    }

    #[test]
    fn test_replay_until() {
        let dir = TempDir::new().unwrap();
        let mut history = SchemaHistory::open(dir.path().join("h.jsonl")).unwrap();
        history.append(entry(100, "a")).unwrap();
        history.append(entry(200, "b")).unwrap();

        let base = Schema::new("utf8mb4", CaseSensitivity::CaseSensitive);
        let until = BinlogPosition::new("mysql-bin.000001", 150);
        let partial = history.replay(&base, Some(&until)).unwrap();
        assert_eq!(partial.database_names(), vec!["a"]);
        let full = history.replay(&base, None).unwrap();
        assert_eq!(full.database_names(), vec!["a", "b"]);
    }
}
