//! Schema changes: the parsed form, resolution against a schema, and the
//! resolved, schema-independent form that is applied and persisted.

mod change;
mod resolve;
mod resolved;

pub use change::{AlterTable, ColumnMod, ColumnPosition, SchemaChange, TableName};
pub use resolved::{ResolvedRename, ResolvedSchemaChange};
