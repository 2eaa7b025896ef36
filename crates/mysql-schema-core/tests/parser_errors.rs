//! Statements that must fail to parse.

mod common;
use common::*;

use mysql_schema_core::{ErrorKind, SchemaError};

#[test]
fn test_error_unclosed_column_list() {
    assert_eq!(parse_err("CREATE TABLE t (id int").kind(), ErrorKind::Syntax);
}

#[test]
fn test_error_missing_column_type() {
    assert!(matches!(parse_err("CREATE TABLE t (id)"), SchemaError::Syntax(_)));
}

#[test]
fn test_error_unknown_column_type() {
    let err = parse_err("ALTER TABLE t ADD COLUMN c fancytype");
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    assert!(err.to_string().contains("fancytype"));
}

#[test]
fn test_error_create_table_select() {
    assert_eq!(
        parse_err("CREATE TABLE t (id int) SELECT id FROM other").kind(),
        ErrorKind::Syntax
    );
}

#[test]
fn test_error_rename_without_to() {
    assert_eq!(parse_err("RENAME TABLE a b").kind(), ErrorKind::Syntax);
}

#[test]
fn test_error_unterminated_string() {
    assert_eq!(
        parse_err("CREATE TABLE t (e enum('a").kind(),
        ErrorKind::Syntax
    );
}

#[test]
fn test_error_no_database_selected() {
    let err = mysql_schema_core::DdlParser::new()
        .unwrap()
        .parse(None, "CREATE TABLE t (id int)")
        .unwrap_err();
    assert!(err.to_string().contains("No database selected"));
}

#[test]
fn test_error_is_not_fatal_to_stream() {
    assert!(!parse_err("DROP TABLE").is_fatal_to_stream());
}
