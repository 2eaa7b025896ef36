//! Error types for parsing, resolving, and applying schema changes.

use std::fmt;

use crate::parser::ParseError;

/// The broad class of a [`SchemaError`], used by callers to decide
/// between skipping a statement and halting the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The statement could not be parsed.
    Syntax,
    /// A column was declared with a type that has no mapping.
    UnsupportedType,
    /// The tracked schema does not match what the statement expects.
    StructuralInvariant,
    /// A value could not be rendered for a column.
    Value,
    /// Engine configuration was invalid.
    Configuration,
}

/// A change that does not fit the tracked schema.
///
/// Raised by both resolution and application. Any of these means the
/// tracked schema has diverged from the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    /// The database does not exist.
    #[error("Database '{database}' does not exist")]
    DatabaseNotFound {
        /// Database name.
        database: String,
    },

    /// The database already exists.
    #[error("Database '{database}' already exists")]
    DatabaseExists {
        /// Database name.
        database: String,
    },

    /// The table does not exist.
    #[error("Table '{database}.{table}' does not exist")]
    TableNotFound {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
    },

    /// The table already exists.
    #[error("Table '{database}.{table}' already exists")]
    TableExists {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
    },

    /// The column does not exist.
    #[error("Column '{column}' does not exist in '{database}.{table}'")]
    ColumnNotFound {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// The column already exists.
    #[error("Column '{column}' already exists in '{database}.{table}'")]
    ColumnExists {
        /// Database name.
        database: String,
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },
}

impl InvariantError {
    pub(crate) fn database_not_found(database: &str) -> Self {
        Self::DatabaseNotFound {
            database: database.to_string(),
        }
    }

    pub(crate) fn table_not_found(database: &str, table: &str) -> Self {
        Self::TableNotFound {
            database: database.to_string(),
            table: table.to_string(),
        }
    }

    pub(crate) fn table_exists(database: &str, table: &str) -> Self {
        Self::TableExists {
            database: database.to_string(),
            table: table.to_string(),
        }
    }
}

/// Errors raised by the schema engine.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Unparseable statement.
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),

    /// No mapping for a declared column type.
    #[error("Unsupported column type '{type_name}' for column '{column}'")]
    UnsupportedType {
        /// Column name.
        column: String,
        /// Declared type, after alias resolution.
        type_name: String,
    },

    /// The schema does not match the statement.
    #[error(transparent)]
    Invariant(#[from] InvariantError),

    /// A string column uses a charset whose bytes cannot be decoded.
    #[error("Unsupported charset '{charset}' for column '{column}'")]
    UnsupportedCharset {
        /// Column name.
        column: String,
        /// Charset name.
        charset: String,
    },

    /// A value does not fit the column it is rendered for.
    #[error("Cannot render {value} for column '{column}' of type {type_name}")]
    InvalidValue {
        /// Column name.
        column: String,
        /// Declared column type.
        type_name: String,
        /// Short description of the offending value.
        value: String,
    },

    /// A statement blacklist pattern failed to compile.
    #[error("Invalid blacklist pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SchemaError {
    /// Returns the class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::Invariant(_) => ErrorKind::StructuralInvariant,
            Self::UnsupportedCharset { .. } | Self::InvalidValue { .. } => ErrorKind::Value,
            Self::Pattern(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true if the replication stream must stop: the tracked schema
    /// no longer matches the server.
    #[must_use]
    pub const fn is_fatal_to_stream(&self) -> bool {
        matches!(self.kind(), ErrorKind::StructuralInvariant)
    }
}

/// The database and table a failing statement was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    /// Database name.
    pub database: String,
    /// Table name, for table-level statements.
    pub table: Option<String>,
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "`{}`.`{}`", self.database, table),
            None => write!(f, "`{}`", self.database),
        }
    }
}

/// A [`SchemaError`] with everything needed to diagnose it: the statement,
/// its target, and the tracked schema at the time of failure.
#[derive(Debug)]
pub struct StatementError {
    /// The statement text.
    pub sql: String,
    /// The session database the statement ran in.
    pub current_database: Option<String>,
    /// The object the failing change was aimed at, if parsing got that far.
    pub target: Option<TargetRef>,
    /// A summary of the tracked schema around the target.
    pub schema_state: String,
    /// The underlying error.
    pub source: SchemaError,
}

impl StatementError {
    /// Returns the class of the underlying error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// See [`SchemaError::is_fatal_to_stream`].
    #[must_use]
    pub const fn is_fatal_to_stream(&self) -> bool {
        self.source.is_fatal_to_stream()
    }
}

impl fmt::Display for StatementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.source)?;
        writeln!(f, "  statement: {}", self.sql)?;
        writeln!(
            f,
            "  current database: {}",
            self.current_database.as_deref().unwrap_or("(none)")
        )?;
        if let Some(target) = &self.target {
            writeln!(f, "  target: {target}")?;
        }
        write!(f, "  tracked schema: {}", self.schema_state)
    }
}

impl std::error::Error for StatementError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Result type for schema engine operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    #[test]
    fn test_error_kinds() {
        let syntax = SchemaError::from(ParseError::new("bad", Span::new(0, 1)));
        assert_eq!(syntax.kind(), ErrorKind::Syntax);
        assert!(!syntax.is_fatal_to_stream());

        let missing = SchemaError::from(InvariantError::table_not_found("db", "t"));
        assert_eq!(missing.kind(), ErrorKind::StructuralInvariant);
        assert!(missing.is_fatal_to_stream());
        assert_eq!(missing.to_string(), "Table 'db.t' does not exist");
    }

    #[test]
    fn test_statement_error_display_has_context() {
        let err = StatementError {
            sql: String::from("ALTER TABLE t ADD c int"),
            current_database: Some(String::from("shop")),
            target: Some(TargetRef {
                database: String::from("shop"),
                table: Some(String::from("t")),
            }),
            schema_state: String::from("database `shop`: tables [orders]"),
            source: InvariantError::table_not_found("shop", "t").into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("ALTER TABLE t ADD c int"));
        assert!(rendered.contains("`shop`.`t`"));
        assert!(rendered.contains("tables [orders]"));
        assert!(err.is_fatal_to_stream());
    }
}
