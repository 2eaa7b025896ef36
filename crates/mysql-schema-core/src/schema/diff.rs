//! Structural comparison of two schema snapshots.

use std::fmt;

use super::{column_names_equal, Database, Schema, Table};

/// Which snapshot of a comparison something belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The schema `diff` was called on.
    Left,
    /// The schema passed to `diff`.
    Right,
}

/// One difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// A database exists on one side only.
    MissingDatabase {
        database: String,
        missing_in: Side,
    },
    /// Database default charsets differ.
    DatabaseCharset {
        database: String,
        left: String,
        right: String,
    },
    /// A table exists on one side only.
    MissingTable {
        database: String,
        table: String,
        missing_in: Side,
    },
    /// Table default charsets differ.
    TableCharset {
        database: String,
        table: String,
        left: String,
        right: String,
    },
    /// Primary keys differ.
    PrimaryKey {
        database: String,
        table: String,
        left: Vec<String>,
        right: Vec<String>,
    },
    /// A column exists on one side only.
    MissingColumn {
        database: String,
        table: String,
        column: String,
        missing_in: Side,
    },
    /// Column types differ.
    ColumnType {
        database: String,
        table: String,
        column: String,
        left: String,
        right: String,
    },
    /// Column positions differ.
    ColumnPosition {
        database: String,
        table: String,
        column: String,
        left: usize,
        right: usize,
    },
    /// A column attribute other than type or position differs.
    ColumnAttribute {
        database: String,
        table: String,
        column: String,
        attribute: &'static str,
        left: String,
        right: String,
    },
}

/// The result of [`Schema::diff`]: every discrepancy, with labels for the
/// two sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Label for the left snapshot, e.g. `replayed`.
    pub left_name: String,
    /// Label for the right snapshot, e.g. `captured`.
    pub right_name: String,
    /// Differences in discovery order.
    pub discrepancies: Vec<Discrepancy>,
}

impl SchemaDiff {
    /// True if the snapshots are structurally identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Number of discrepancies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.discrepancies.len()
    }

    fn label(&self, side: Side) -> &str {
        match side {
            Side::Left => &self.left_name,
            Side::Right => &self.right_name,
        }
    }

    /// Renders one discrepancy as a line of text.
    #[must_use]
    pub fn describe(&self, discrepancy: &Discrepancy) -> String {
        let (l, r) = (&self.left_name, &self.right_name);
        match discrepancy {
            Discrepancy::MissingDatabase {
                database,
                missing_in,
            } => format!(
                "-- Database {database} did not exist in {}",
                self.label(*missing_in)
            ),
            Discrepancy::DatabaseCharset {
                database,
                left,
                right,
            } => format!(
                "-- Database {database} had different charset: {left} in {l}, {right} in {r}"
            ),
            Discrepancy::MissingTable {
                database,
                table,
                missing_in,
            } => format!(
                "database {database} did not contain table {table} in {}",
                self.label(*missing_in)
            ),
            Discrepancy::TableCharset {
                database,
                table,
                left,
                right,
            } => format!(
                "`{database}`.`{table}` had different charset: {left} in {l}, {right} in {r}"
            ),
            Discrepancy::PrimaryKey {
                database,
                table,
                left,
                right,
            } => format!(
                "`{database}`.`{table}` has a primary key mismatch, ({}) in {l} vs ({}) in {r}",
                left.join(", "),
                right.join(", ")
            ),
            Discrepancy::MissingColumn {
                database,
                table,
                column,
                missing_in,
            } => format!(
                "`{database}`.`{table}` is missing column {column} in {}",
                self.label(*missing_in)
            ),
            Discrepancy::ColumnType {
                database,
                table,
                column,
                left,
                right,
            } => format!(
                "`{database}`.`{table}`.`{column}` has a type mismatch, {left} vs {right} in {r}"
            ),
            Discrepancy::ColumnPosition {
                database,
                table,
                column,
                left,
                right,
            } => format!(
                "`{database}`.`{table}`.`{column}` has a position mismatch, {left} vs {right} in {r}"
            ),
            Discrepancy::ColumnAttribute {
                database,
                table,
                column,
                attribute,
                left,
                right,
            } => format!(
                "`{database}`.`{table}`.`{column}` has a {attribute} mismatch, {left} vs {right} in {r}"
            ),
        }
    }

    /// All discrepancies as lines of text.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.discrepancies.iter().map(|d| self.describe(d)).collect()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl Schema {
    /// Compares this snapshot against `other`.
    ///
    /// Databases and tables are matched under this schema's case mode;
    /// columns always case-insensitively. Missing objects are reported in
    /// both directions, mismatches once.
    #[must_use]
    pub fn diff(&self, other: &Self, left_name: &str, right_name: &str) -> SchemaDiff {
        let mut out = Vec::new();
        for db in self.databases() {
            match other.database(&db.name) {
                None => out.push(Discrepancy::MissingDatabase {
                    database: db.name.clone(),
                    missing_in: Side::Right,
                }),
                Some(theirs) => self.diff_database(db, theirs, &mut out),
            }
        }
        for db in other.databases() {
            if !self.has_database(&db.name) {
                out.push(Discrepancy::MissingDatabase {
                    database: db.name.clone(),
                    missing_in: Side::Left,
                });
            }
        }
        SchemaDiff {
            left_name: left_name.to_string(),
            right_name: right_name.to_string(),
            discrepancies: out,
        }
    }

    fn diff_database(&self, ours: &Database, theirs: &Database, out: &mut Vec<Discrepancy>) {
        let case = self.case_sensitivity;
        if !ours.charset.eq_ignore_ascii_case(&theirs.charset) {
            out.push(Discrepancy::DatabaseCharset {
                database: ours.name.clone(),
                left: ours.charset.clone(),
                right: theirs.charset.clone(),
            });
        }
        for table in ours.tables() {
            match theirs.table(&table.name, case) {
                None => out.push(Discrepancy::MissingTable {
                    database: ours.name.clone(),
                    table: table.name.clone(),
                    missing_in: Side::Right,
                }),
                Some(other) => diff_table(table, other, out),
            }
        }
        for table in theirs.tables() {
            if !ours.has_table(&table.name, case) {
                out.push(Discrepancy::MissingTable {
                    database: ours.name.clone(),
                    table: table.name.clone(),
                    missing_in: Side::Left,
                });
            }
        }
    }
}

fn diff_table(ours: &Table, theirs: &Table, out: &mut Vec<Discrepancy>) {
    let database = &ours.database;
    let table = &ours.name;
    if !ours.charset.eq_ignore_ascii_case(&theirs.charset) {
        out.push(Discrepancy::TableCharset {
            database: database.clone(),
            table: table.clone(),
            left: ours.charset.clone(),
            right: theirs.charset.clone(),
        });
    }
    let same_key = ours.primary_key.len() == theirs.primary_key.len()
        && ours
            .primary_key
            .iter()
            .zip(&theirs.primary_key)
            .all(|(a, b)| column_names_equal(a, b));
    if !same_key {
        out.push(Discrepancy::PrimaryKey {
            database: database.clone(),
            table: table.clone(),
            left: ours.primary_key.clone(),
            right: theirs.primary_key.clone(),
        });
    }

    for column in &ours.columns {
        let Some(other) = theirs.column(column.name()) else {
            out.push(Discrepancy::MissingColumn {
                database: database.clone(),
                table: table.clone(),
                column: column.name().to_string(),
                missing_in: Side::Right,
            });
            continue;
        };
        let mismatch = |attribute: &'static str, left: String, right: String| {
            Discrepancy::ColumnAttribute {
                database: database.clone(),
                table: table.clone(),
                column: column.name().to_string(),
                attribute,
                left,
                right,
            }
        };

        if column.type_name() != other.type_name() {
            out.push(Discrepancy::ColumnType {
                database: database.clone(),
                table: table.clone(),
                column: column.name().to_string(),
                left: column.type_name().to_string(),
                right: other.type_name().to_string(),
            });
            continue;
        }
        if column.position() != other.position() {
            out.push(Discrepancy::ColumnPosition {
                database: database.clone(),
                table: table.clone(),
                column: column.name().to_string(),
                left: column.position(),
                right: other.position(),
            });
        }
        let charsets_match = match (column.charset(), other.charset()) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            (a, b) => a == b,
        };
        if !charsets_match {
            out.push(mismatch(
                "charset",
                format!("{:?}", column.charset()),
                format!("{:?}", other.charset()),
            ));
        }
        if column.signed() != other.signed() {
            out.push(mismatch(
                "signedness",
                format!("{:?}", column.signed()),
                format!("{:?}", other.signed()),
            ));
        }
        if column.enum_values() != other.enum_values() {
            out.push(mismatch(
                "enum values",
                format!("{:?}", column.enum_values()),
                format!("{:?}", other.enum_values()),
            ));
        }
        if column.fsp() != other.fsp() {
            out.push(mismatch(
                "precision",
                format!("{:?}", column.fsp()),
                format!("{:?}", other.fsp()),
            ));
        }
    }
    for column in &theirs.columns {
        if ours.column(column.name()).is_none() {
            out.push(Discrepancy::MissingColumn {
                database: database.clone(),
                table: table.clone(),
                column: column.name().to_string(),
                missing_in: Side::Left,
            });
        }
    }
}
