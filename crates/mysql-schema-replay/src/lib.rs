//! # mysql-schema-replay
//!
//! Durable schema history for [`mysql_schema_core`].
//!
//! Each statement that changes the tracked schema is stored with its binlog
//! position and resolved changes in a JSON lines ledger. After a restart
//! the schema is rebuilt by replaying the ledger onto the schema it started
//! from, and tracking resumes after the last recorded position.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_schema_core::{CaseSensitivity, EngineConfig, Schema};
//! use mysql_schema_replay::{BinlogPosition, Recorder, SchemaHistory};
//!
//! # fn main() -> mysql_schema_replay::Result<()> {
//! let base = Schema::new("utf8mb4", CaseSensitivity::CaseSensitive);
//! let history = SchemaHistory::open("schema-history.jsonl")?;
//! let mut recorder = Recorder::resume(&base, EngineConfig::default(), history)?;
//!
//! let position: BinlogPosition = "mysql-bin.000001:4".parse()?;
//! recorder.record(position, None, "CREATE DATABASE shop")?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod events;
pub mod history;
pub mod recorder;

pub use error::{ReplayError, Result};
pub use events::DdlEvent;
pub use history::{BinlogPosition, HistoryEntry, SchemaHistory};
pub use recorder::{BinlogStatement, Recorder};
