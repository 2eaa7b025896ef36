//! Single-writer schema tracking.
//!
//! The tracker is driven by the binlog consumer: statements are processed
//! strictly in stream order and each successful statement publishes a new
//! [`Schema`] snapshot. Readers hold a [`SchemaHandle`] and clone the
//! current `Arc`; a snapshot they hold is never modified.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::columndef::WireType;
use crate::config::EngineConfig;
use crate::ddl::ResolvedSchemaChange;
use crate::error::{InvariantError, Result, SchemaError, StatementError, TargetRef};
use crate::filter::SchemaFilter;
use crate::parser::DdlParser;
use crate::schema::Schema;

/// Shared read access to the latest published schema.
#[derive(Debug, Clone)]
pub struct SchemaHandle {
    current: Arc<RwLock<Arc<Schema>>>,
}

impl SchemaHandle {
    fn new(schema: Arc<Schema>) -> Self {
        Self {
            current: Arc::new(RwLock::new(schema)),
        }
    }

    /// The latest snapshot.
    #[must_use]
    pub fn current(&self) -> Arc<Schema> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn publish(&self, schema: Arc<Schema>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = schema;
    }
}

/// A column whose tracked type disagrees with a binlog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutMismatch {
    /// The row has a different number of columns.
    ColumnCount { tracked: usize, row: usize },
    /// The row's type code does not fit the tracked column.
    WireType {
        column: String,
        position: usize,
        type_name: String,
        code: u8,
    },
}

impl fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnCount { tracked, row } => {
                write!(f, "tracked {tracked} columns, row has {row}")
            }
            Self::WireType {
                column,
                position,
                type_name,
                code,
            } => write!(
                f,
                "column {column} at {position} is {type_name}, row has type code {code}"
            ),
        }
    }
}

/// The outcome of [`SchemaTracker::prepare`]: the resolved changes and the
/// schema they lead to.
#[derive(Debug)]
pub struct PreparedStatement {
    changes: Vec<ResolvedSchemaChange>,
    next: Arc<Schema>,
}

impl PreparedStatement {
    /// The resolved changes, in application order.
    #[must_use]
    pub fn changes(&self) -> &[ResolvedSchemaChange] {
        &self.changes
    }

    /// True if the statement changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The schema after the statement.
    #[must_use]
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.next
    }
}

/// Owns the current schema and advances it one statement at a time.
pub struct SchemaTracker {
    parser: DdlParser,
    config: EngineConfig,
    filter: Option<Box<dyn SchemaFilter + Send + Sync>>,
    schema: Arc<Schema>,
    handle: SchemaHandle,
}

impl SchemaTracker {
    /// Starts tracking from `schema`, usually a capture or a replayed
    /// history. The schema takes the configured case-sensitivity mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement blacklist fails to compile.
    pub fn new(mut schema: Schema, config: EngineConfig) -> Result<Self> {
        schema.case_sensitivity = config.case_sensitivity;
        let schema = Arc::new(schema);
        Ok(Self {
            parser: DdlParser::new()?,
            config,
            filter: None,
            handle: SchemaHandle::new(Arc::clone(&schema)),
            schema,
        })
    }

    /// Skips changes to tables the filter excludes.
    #[must_use]
    pub fn with_filter(mut self, filter: impl SchemaFilter + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// The current schema.
    #[must_use]
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// A handle for readers on other threads.
    #[must_use]
    pub fn handle(&self) -> SchemaHandle {
        self.handle.clone()
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parses, resolves and applies one statement, then publishes the
    /// result.
    ///
    /// # Errors
    ///
    /// See [`SchemaTracker::prepare`].
    pub fn process(
        &mut self,
        database: Option<&str>,
        sql: &str,
    ) -> std::result::Result<Vec<ResolvedSchemaChange>, StatementError> {
        let prepared = self.prepare(database, sql)?;
        Ok(self.commit(prepared))
    }

    /// Parses, resolves and applies one statement without publishing it.
    ///
    /// Each change of the statement is resolved against the schema left by
    /// the previous one. The tracked schema is untouched until the result
    /// is passed to [`SchemaTracker::commit`].
    ///
    /// # Errors
    ///
    /// Returns a [`StatementError`] carrying the statement, its target and
    /// the tracked schema state. Use
    /// [`StatementError::is_fatal_to_stream`] to decide whether the stream
    /// can continue.
    pub fn prepare(
        &self,
        database: Option<&str>,
        sql: &str,
    ) -> std::result::Result<PreparedStatement, StatementError> {
        let changes = self
            .parser
            .parse(database, sql)
            .map_err(|source| statement_error(&self.schema, database, sql, None, source))?;

        let mut next = Arc::clone(&self.schema);
        let mut resolved = Vec::new();
        for change in changes {
            if let Some(filter) = &self.filter {
                if change.is_excluded(&**filter) {
                    debug!(change = change.kind(), target = %change.target(), "Skipping filtered change");
                    continue;
                }
            }
            let step = change
                .resolve(&next, &self.config)
                .and_then(|r| match r {
                    Some(r) => r.apply(&next).map(|schema| Some((r, schema))),
                    None => Ok(None),
                });
            match step {
                Ok(Some((applied, schema))) => {
                    next = Arc::new(schema);
                    resolved.push(applied);
                }
                Ok(None) => {}
                Err(source) => {
                    let target = change.target();
                    return Err(statement_error(&next, database, sql, Some(target), source));
                }
            }
        }
        Ok(PreparedStatement {
            changes: resolved,
            next,
        })
    }

    /// Publishes a statement prepared against the current schema and
    /// returns its changes.
    pub fn commit(&mut self, prepared: PreparedStatement) -> Vec<ResolvedSchemaChange> {
        if !prepared.changes.is_empty() {
            self.publish(prepared.next);
        }
        prepared.changes
    }

    /// Applies changes read back from history, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failing change's error; the schema is unchanged.
    pub fn apply_resolved(&mut self, changes: &[ResolvedSchemaChange]) -> Result<()> {
        let mut next = Arc::clone(&self.schema);
        for change in changes {
            next = Arc::new(change.apply(&next)?);
        }
        if !changes.is_empty() {
            self.publish(next);
        }
        Ok(())
    }

    /// Compares a table's tracked columns with the type codes of a binlog
    /// table map. Mismatches are logged and returned.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError::TableNotFound`] if the table is not tracked.
    pub fn verify_row_layout(
        &self,
        database: &str,
        table: &str,
        wire_types: &[u8],
    ) -> std::result::Result<Vec<LayoutMismatch>, InvariantError> {
        let tracked = self.schema.require_table(database, table)?;
        let mut mismatches = Vec::new();
        if tracked.columns.len() != wire_types.len() {
            mismatches.push(LayoutMismatch::ColumnCount {
                tracked: tracked.columns.len(),
                row: wire_types.len(),
            });
        }
        for (column, &code) in tracked.columns.iter().zip(wire_types) {
            let fits = WireType::from_code(code).is_some_and(|wire| column.matches(wire));
            if !fits {
                mismatches.push(LayoutMismatch::WireType {
                    column: column.name().to_string(),
                    position: column.position(),
                    type_name: column.type_name().to_string(),
                    code,
                });
            }
        }
        for mismatch in &mismatches {
            warn!(database, table, %mismatch, "Row layout does not match tracked schema");
        }
        Ok(mismatches)
    }

    fn publish(&mut self, schema: Arc<Schema>) {
        self.schema = schema;
        self.handle.publish(Arc::clone(&self.schema));
    }
}

fn statement_error(
    schema: &Schema,
    database: Option<&str>,
    sql: &str,
    target: Option<TargetRef>,
    source: SchemaError,
) -> StatementError {
    StatementError {
        sql: sql.to_string(),
        current_database: database.map(str::to_string),
        schema_state: schema.summarize(target.as_ref()),
        target,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseSensitivity;
    use crate::error::ErrorKind;
    use crate::filter::ExclusionFilter;

    fn tracker() -> SchemaTracker {
        let mut tracker =
            SchemaTracker::new(Schema::new("utf8mb4", CaseSensitivity::CaseSensitive), EngineConfig::default())
                .unwrap();
        tracker.process(None, "CREATE DATABASE shop").unwrap();
        tracker
            .process(Some("shop"), "CREATE TABLE orders (id int unsigned, note varchar(20))")
            .unwrap();
        tracker
    }

    #[test]
    fn test_process_publishes_snapshot() {
        let mut tracker = tracker();
        let handle = tracker.handle();
        let before = handle.current();
        tracker
            .process(Some("shop"), "ALTER TABLE orders ADD COLUMN total int")
            .unwrap();
        let after = handle.current();
        assert_eq!(before.table("shop", "orders").unwrap().columns.len(), 2);
        assert_eq!(after.table("shop", "orders").unwrap().columns.len(), 3);
    }

    #[test]
    fn test_statement_is_all_or_nothing() {
        let mut tracker = tracker();
        let before = Arc::clone(tracker.schema());
        let err = tracker
            .process(Some("shop"), "DROP TABLE orders, missing")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralInvariant);
        assert_eq!(err.target.as_ref().unwrap().to_string(), "`shop`.`missing`");
        assert!(tracker.schema().has_table("shop", "orders"));
        assert!(Arc::ptr_eq(&before, tracker.schema()));
    }

    #[test]
    fn test_prepare_does_not_publish() {
        let mut tracker = tracker();
        let handle = tracker.handle();
        let prepared = tracker
            .prepare(Some("shop"), "ALTER TABLE orders ADD COLUMN total int")
            .unwrap();
        assert_eq!(prepared.changes().len(), 1);
        assert_eq!(prepared.schema().table("shop", "orders").unwrap().columns.len(), 3);
        assert_eq!(tracker.schema().table("shop", "orders").unwrap().columns.len(), 2);
        assert_eq!(handle.current().table("shop", "orders").unwrap().columns.len(), 2);

        // Dropping the prepared statement leaves the schema as it was, so
        // the same statement can be prepared again.
        drop(prepared);
        let again = tracker
            .prepare(Some("shop"), "ALTER TABLE orders ADD COLUMN total int")
            .unwrap();
        tracker.commit(again);
        assert_eq!(handle.current().table("shop", "orders").unwrap().columns.len(), 3);
    }

    #[test]
    fn test_error_carries_context() {
        let mut tracker = tracker();
        let err = tracker
            .process(Some("shop"), "ALTER TABLE orders DROP COLUMN nope")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ALTER TABLE orders DROP COLUMN nope"));
        assert!(message.contains("current database: shop"));
        assert!(message.contains("id"));
    }

    #[test]
    fn test_syntax_error_is_not_fatal() {
        let mut tracker = tracker();
        let err = tracker
            .process(Some("shop"), "CREATE TABLE broken (id int")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(!err.is_fatal_to_stream());
        assert!(err.target.is_none());
    }

    #[test]
    fn test_filtered_changes_are_skipped() {
        let mut tracker = tracker().with_filter(ExclusionFilter::from_entries(["shop.audit"]));
        let changes = tracker
            .process(Some("shop"), "CREATE TABLE audit (id int)")
            .unwrap();
        assert!(changes.is_empty());
        assert!(!tracker.schema().has_table("shop", "audit"));
    }

    #[test]
    fn test_case_mode_follows_config() {
        let config = EngineConfig {
            case_sensitivity: CaseSensitivity::ConvertToLower,
            ..EngineConfig::default()
        };
        let mut tracker =
            SchemaTracker::new(Schema::new("utf8mb4", CaseSensitivity::CaseSensitive), config).unwrap();
        tracker.process(None, "CREATE DATABASE Shop").unwrap();
        tracker
            .process(Some("SHOP"), "CREATE TABLE Orders (id int)")
            .unwrap();
        assert_eq!(tracker.schema().database_names(), vec!["shop"]);
        assert!(tracker.schema().has_table("shop", "ORDERS"));
    }

    #[test]
    fn test_verify_row_layout() {
        let tracker = tracker();
        assert!(tracker
            .verify_row_layout("shop", "orders", &[3, 15])
            .unwrap()
            .is_empty());
        let mismatches = tracker.verify_row_layout("shop", "orders", &[8, 15, 3]).unwrap();
        assert_eq!(mismatches.len(), 2);
        assert!(matches!(mismatches[0], LayoutMismatch::ColumnCount { tracked: 2, row: 3 }));
        assert!(matches!(
            &mismatches[1],
            LayoutMismatch::WireType { column, code: 8, .. } if column == "id"
        ));
        assert!(tracker.verify_row_layout("shop", "nope", &[]).is_err());
    }
}
