//! DDL parser.
//!
//! A hand-written recursive descent parser for the statements that change
//! a schema. Statements matching the [`Blacklist`] are dropped before
//! parsing; everything else the parser does not track parses to no changes.

mod blacklist;
mod error;
mod parser;

use tracing::debug;

pub use blacklist::Blacklist;
pub use error::ParseError;
pub use parser::Parser;

use crate::ddl::SchemaChange;
use crate::error::Result;

/// Turns statement text into schema changes.
#[derive(Debug, Clone)]
pub struct DdlParser {
    blacklist: Blacklist,
}

impl DdlParser {
    /// Creates a parser with the built-in blacklist.
    ///
    /// # Errors
    ///
    /// Returns an error if a blacklist pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            blacklist: Blacklist::new()?,
        })
    }

    /// Parses one statement run in `current_database`.
    ///
    /// Returns no changes for blacklisted and untracked statements.
    ///
    /// # Errors
    ///
    /// Returns a syntax error for malformed DDL, or an unsupported-type
    /// error for a column type with no mapping.
    pub fn parse(&self, current_database: Option<&str>, sql: &str) -> Result<Vec<SchemaChange>> {
        if self.blacklist.matches(sql) {
            debug!(sql, "Skipping blacklisted statement");
            return Ok(Vec::new());
        }
        let changes = Parser::new(sql, current_database).parse_statement()?;
        debug!(sql, changes = changes.len(), "Parsed statement");
        Ok(changes)
    }
}
