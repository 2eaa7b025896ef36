//! Error types for schema history and replay.

use std::path::PathBuf;

use mysql_schema_core::{SchemaError, StatementError};

use crate::history::BinlogPosition;

/// Errors that can occur while recording or replaying schema history.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// IO error reading or writing a history or schema file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A history line or schema file is not valid JSON for its type.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A recorded change no longer applies.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A statement failed to parse, resolve or apply.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// A history entry does not advance the binlog position.
    #[error("Position {position} does not follow {previous}")]
    InvalidPosition {
        /// The rejected position.
        position: BinlogPosition,
        /// The last recorded position.
        previous: BinlogPosition,
    },

    /// A binlog position string could not be parsed.
    #[error("Invalid binlog position '{0}', expected file:offset")]
    MalformedPosition(String),

    /// A history file holds a line that cannot be read.
    #[error("Invalid history file '{path}' at line {line}: {message}")]
    InvalidState {
        /// Path to the history file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
}

/// Result type for replay operations.
pub type Result<T> = std::result::Result<T, ReplayError>;
