//! # mysql-schema-core
//!
//! Tracks the schema of a MySQL server from the DDL statements in its
//! binlog.
//!
//! This crate provides:
//! - A hand-written lexer and recursive descent parser for CREATE, ALTER,
//!   DROP and RENAME statements
//! - Resolution of parsed changes against a schema snapshot into concrete,
//!   serializable changes that can be replayed from a checkpoint
//! - A column type system that matches binlog wire types and renders row
//!   values as SQL literals or JSON
//! - Structural diffing between two schemas
//!
//! ## Tracking a schema
//!
//! ```rust
//! use mysql_schema_core::{CaseSensitivity, EngineConfig, Schema, SchemaTracker};
//!
//! let schema = Schema::new("utf8mb4", CaseSensitivity::CaseSensitive);
//! let mut tracker = SchemaTracker::new(schema, EngineConfig::default()).unwrap();
//!
//! tracker.process(None, "CREATE DATABASE shop").unwrap();
//! tracker
//!     .process(Some("shop"), "CREATE TABLE orders (id int, note varchar(64))")
//!     .unwrap();
//! let changes = tracker
//!     .process(Some("shop"), "ALTER TABLE orders ADD COLUMN total int AFTER id")
//!     .unwrap();
//!
//! assert_eq!(changes[0].kind(), "table-alter");
//! let orders = tracker.schema().table("shop", "orders").unwrap();
//! assert_eq!(orders.columns.names(), vec!["id", "total", "note"]);
//! ```
//!
//! ## Rendering row values
//!
//! ```rust
//! use mysql_schema_core::{ColumnDef, ColumnValue, TypeAttributes};
//!
//! let column = ColumnDef::build("qty", "tinyint", 0, TypeAttributes::default().unsigned()).unwrap();
//! assert_eq!(column.to_sql(&ColumnValue::Int(-10)).unwrap(), "246");
//! ```

pub mod columndef;
pub mod config;
pub mod ddl;
pub mod error;
pub mod filter;
pub mod lexer;
pub mod parser;
pub mod schema;
pub mod tracker;

pub use columndef::{ColumnDef, ColumnKind, ColumnValue, TypeAttributes, WireType};
pub use config::{CaseSensitivity, CharsetCascade, EngineConfig};
pub use ddl::{ResolvedSchemaChange, SchemaChange};
pub use error::{ErrorKind, InvariantError, Result, SchemaError, StatementError};
pub use filter::{ExclusionFilter, SchemaFilter};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{DdlParser, ParseError};
pub use schema::{Schema, SchemaDiff, Table};
pub use tracker::{PreparedStatement, SchemaHandle, SchemaTracker};
