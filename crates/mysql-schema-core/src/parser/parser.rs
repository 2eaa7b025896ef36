//! Recursive descent parser for schema-changing statements.

use crate::columndef::{ColumnDef, TypeAttributes};
use crate::ddl::{AlterTable, ColumnMod, ColumnPosition, SchemaChange, TableName};
use crate::error::Result;
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

use super::error::ParseError;

type ParseResult<T> = std::result::Result<T, ParseError>;

const PARTITION_OPERATIONS: &[&str] = &[
    "analyze",
    "coalesce",
    "discard",
    "exchange",
    "import",
    "optimize",
    "rebuild",
    "remove",
    "reorganize",
    "repair",
    "truncate",
];

/// A column definition together with an inline `PRIMARY KEY` marker.
struct ColumnDraft {
    column: ColumnDef,
    primary_key: bool,
}

/// Collects the body of a `CREATE TABLE` while its element list is parsed.
#[derive(Default)]
struct TableBuilder {
    columns: Vec<ColumnDef>,
    primary_key: Vec<String>,
}

impl TableBuilder {
    fn push(&mut self, draft: ColumnDraft) {
        if draft.primary_key {
            self.primary_key = vec![draft.column.name().to_string()];
        }
        self.columns.push(draft.column);
    }
}

/// The charset a collation belongs to, e.g. `utf8mb4` for `utf8mb4_bin`.
fn charset_of_collation(collation: &str) -> String {
    collation
        .split('_')
        .next()
        .unwrap_or(collation)
        .to_ascii_lowercase()
}

/// DDL parser over a single statement.
///
/// Statements the parser does not track (DML, views, routines, ...)
/// parse to an empty change list rather than an error.
pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    current_database: Option<&'a str>,
    partitioning: bool,
}

impl<'a> Parser<'a> {
    /// Creates a parser for `source`, resolving unqualified table names
    /// against `current_database`.
    #[must_use]
    pub fn new(source: &'a str, current_database: Option<&'a str>) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            source,
            lexer,
            current,
            previous: Token::new(TokenKind::Eof, Span::default()),
            current_database,
            partitioning: false,
        }
    }

    /// Parses the statement into the schema changes it requests.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the statement is malformed, or
    /// [`SchemaError::UnsupportedType`](crate::error::SchemaError::UnsupportedType)
    /// for a column type with no mapping.
    pub fn parse_statement(&mut self) -> Result<Vec<SchemaChange>> {
        let parsed = match &self.current.kind {
            TokenKind::Keyword(Keyword::Create) => {
                self.advance();
                self.parse_create()?
            }
            TokenKind::Keyword(Keyword::Alter) => {
                self.advance();
                self.parse_alter()?
            }
            TokenKind::Keyword(Keyword::Drop) => {
                self.advance();
                self.parse_drop()?
            }
            TokenKind::Keyword(Keyword::Rename) => {
                self.advance();
                self.parse_rename()?
            }
            TokenKind::Error(_) => return Err(self.unexpected("statement").into()),
            _ => None,
        };
        let Some(changes) = parsed else {
            return Ok(Vec::new());
        };
        self.consume(&TokenKind::Semicolon);
        if !self.current.is_eof() {
            return Err(self.unexpected("end of statement").into());
        }
        Ok(changes)
    }

    // ===================================================================
    // Statements
    // ===================================================================

    fn parse_create(&mut self) -> Result<Option<Vec<SchemaChange>>> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                self.parse_create_table().map(Some)
            }
            TokenKind::Keyword(Keyword::Database | Keyword::Schema) => {
                self.advance();
                self.parse_create_database().map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_alter(&mut self) -> Result<Option<Vec<SchemaChange>>> {
        while self.consume_keyword(Keyword::Online)
            || self.consume_keyword(Keyword::Offline)
            || self.consume_keyword(Keyword::Ignore)
        {}
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                self.parse_alter_table()
            }
            TokenKind::Keyword(Keyword::Database | Keyword::Schema) => {
                self.advance();
                self.parse_alter_database().map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_drop(&mut self) -> Result<Option<Vec<SchemaChange>>> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Table) => {
                self.advance();
                self.parse_drop_table().map(Some)
            }
            TokenKind::Keyword(Keyword::Database | Keyword::Schema) => {
                self.advance();
                let if_exists = self.parse_if_exists()?;
                let database = self.expect_identifier("database name")?;
                Ok(Some(vec![SchemaChange::DropDatabase {
                    database,
                    if_exists,
                }]))
            }
            // DROP TEMPORARY TABLE and everything else
            _ => Ok(None),
        }
    }

    fn parse_rename(&mut self) -> Result<Option<Vec<SchemaChange>>> {
        if !self.consume_keyword(Keyword::Table) {
            return Ok(None);
        }
        let mut renames = Vec::new();
        loop {
            let from = self.parse_table_name()?;
            self.expect_keyword(Keyword::To)?;
            let to = self.parse_table_name()?;
            renames.push((from, to));
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Some(vec![SchemaChange::RenameTables { renames }]))
    }

    fn parse_create_database(&mut self) -> Result<Vec<SchemaChange>> {
        let if_not_exists = self.parse_if_not_exists()?;
        let database = self.expect_identifier("database name")?;
        let charset = self.parse_database_options()?;
        Ok(vec![SchemaChange::CreateDatabase {
            database,
            charset,
            if_not_exists,
        }])
    }

    fn parse_alter_database(&mut self) -> Result<Vec<SchemaChange>> {
        let named = !self.check_keyword(Keyword::Charset);
        let database = match self.identifier_text(&self.current, false).filter(|_| named) {
            Some(name) => {
                self.advance();
                name
            }
            None => self.require_database()?,
        };
        let charset = self.parse_database_options()?;
        Ok(vec![SchemaChange::AlterDatabase { database, charset }])
    }

    /// `[DEFAULT] CHARACTER SET x`, `COLLATE y` and other options, returning
    /// the charset if one was named.
    fn parse_database_options(&mut self) -> Result<Option<String>> {
        let mut charset = None;
        let mut collation_charset = None;
        while !self.at_statement_end() {
            match &self.current.kind {
                TokenKind::Keyword(Keyword::Character) => {
                    self.advance();
                    self.expect_keyword(Keyword::Set)?;
                    charset = Some(self.parse_option_name()?);
                }
                TokenKind::Keyword(Keyword::Charset) => {
                    self.advance();
                    charset = Some(self.parse_option_name()?);
                }
                TokenKind::Keyword(Keyword::Collate) => {
                    self.advance();
                    collation_charset = Some(charset_of_collation(&self.parse_option_name()?));
                }
                _ => self.bump()?,
            }
        }
        Ok(charset.or(collation_charset))
    }

    fn parse_drop_table(&mut self) -> Result<Vec<SchemaChange>> {
        let if_exists = self.parse_if_exists()?;
        let mut changes = Vec::new();
        loop {
            let name = self.parse_table_name()?;
            changes.push(SchemaChange::DropTable {
                database: name.database,
                table: name.table,
                if_exists,
            });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        let _ = self.consume_keyword(Keyword::Restrict) || self.consume_keyword(Keyword::Cascade);
        Ok(changes)
    }

    // ===================================================================
    // CREATE TABLE
    // ===================================================================

    fn parse_create_table(&mut self) -> Result<Vec<SchemaChange>> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_table_name()?;
        let mut builder = TableBuilder::default();
        let mut like = None;

        if self.consume_keyword(Keyword::Like) {
            like = Some(self.parse_table_name()?);
        } else if self.consume(&TokenKind::LeftParen) {
            if self.consume_keyword(Keyword::Like) {
                like = Some(self.parse_table_name()?);
                self.expect(&TokenKind::RightParen)?;
            } else {
                loop {
                    self.parse_table_element(&mut builder)?;
                    if !self.consume(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RightParen)?;
            }
        } else {
            return Err(self.unexpected("column list or LIKE").into());
        }

        let charset = self.parse_table_options()?;
        Ok(vec![SchemaChange::CreateTable {
            database: name.database,
            table: name.table,
            columns: builder.columns,
            primary_key: builder.primary_key,
            charset,
            if_not_exists,
            like,
        }])
    }

    fn parse_table_element(&mut self, builder: &mut TableBuilder) -> Result<()> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Constraint) => {
                self.advance();
                if !self.at_constraint_kind() {
                    self.expect_identifier("constraint name")?;
                }
                self.parse_table_element(builder)
            }
            TokenKind::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                builder.primary_key = self.parse_key_columns()?;
                self.skip_to_clause_end()?;
                Ok(())
            }
            TokenKind::Keyword(
                Keyword::Key
                | Keyword::Index
                | Keyword::Unique
                | Keyword::Fulltext
                | Keyword::Spatial
                | Keyword::Foreign
                | Keyword::Check,
            ) => Ok(self.skip_to_clause_end()?),
            _ => {
                let draft = self.parse_column_definition()?;
                builder.push(draft);
                Ok(())
            }
        }
    }

    /// Table options after the element list. Returns the default charset.
    fn parse_table_options(&mut self) -> Result<Option<String>> {
        let mut charset = None;
        let mut collation_charset = None;
        while !self.at_statement_end() {
            match &self.current.kind {
                TokenKind::Keyword(Keyword::Partition) => {
                    while !self.current.is_eof() {
                        self.advance();
                    }
                }
                TokenKind::Keyword(
                    Keyword::As | Keyword::Select | Keyword::Ignore | Keyword::Replace,
                ) => return Err(self.unexpected("table option").into()),
                TokenKind::Keyword(Keyword::Character) => {
                    self.advance();
                    self.expect_keyword(Keyword::Set)?;
                    charset = Some(self.parse_option_name()?);
                }
                TokenKind::Keyword(Keyword::Charset) => {
                    self.advance();
                    charset = Some(self.parse_option_name()?);
                }
                TokenKind::Keyword(Keyword::Collate) => {
                    self.advance();
                    collation_charset = Some(charset_of_collation(&self.parse_option_name()?));
                }
                TokenKind::LeftParen => self.skip_parenthesized()?,
                _ => self.bump()?,
            }
        }
        Ok(charset.or(collation_charset))
    }

    // ===================================================================
    // ALTER TABLE
    // ===================================================================

    /// Parses the clauses of an `ALTER TABLE`. A statement that only
    /// manages partitions is untracked.
    fn parse_alter_table(&mut self) -> Result<Option<Vec<SchemaChange>>> {
        let name = self.parse_table_name()?;
        let mut alter = AlterTable {
            database: name.database,
            table: name.table,
            ..AlterTable::default()
        };
        while !self.at_statement_end() {
            self.parse_alter_clause(&mut alter)?;
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        if self.partitioning && alter.is_table_options_only() {
            return Ok(None);
        }
        Ok(Some(vec![SchemaChange::AlterTable(alter)]))
    }

    fn parse_alter_clause(&mut self, alter: &mut AlterTable) -> Result<()> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Add) => {
                self.advance();
                self.parse_add_clause(alter)
            }
            TokenKind::Keyword(Keyword::Change) => {
                self.advance();
                self.consume_keyword(Keyword::Column);
                let if_exists = self.parse_if_exists()?;
                let name = self.parse_column_name()?;
                let draft = self.parse_column_definition()?;
                let position = self.parse_column_position()?;
                Self::push_change(alter, name, draft, position, if_exists);
                Ok(())
            }
            TokenKind::Keyword(Keyword::Modify) => {
                self.advance();
                self.consume_keyword(Keyword::Column);
                let if_exists = self.parse_if_exists()?;
                let draft = self.parse_column_definition()?;
                let position = self.parse_column_position()?;
                let name = draft.column.name().to_string();
                Self::push_change(alter, name, draft, position, if_exists);
                Ok(())
            }
            TokenKind::Keyword(Keyword::Drop) => {
                self.advance();
                self.parse_drop_clause(alter)
            }
            TokenKind::Keyword(Keyword::Rename) => {
                self.advance();
                self.parse_rename_clause(alter)
            }
            TokenKind::Keyword(Keyword::Convert) => {
                self.advance();
                self.expect_keyword(Keyword::To)?;
                if self.consume_keyword(Keyword::Character) {
                    self.expect_keyword(Keyword::Set)?;
                } else {
                    self.expect_keyword(Keyword::Charset)?;
                }
                alter.convert_charset = Some(self.parse_option_name()?);
                self.skip_to_clause_end()?;
                Ok(())
            }
            TokenKind::Keyword(Keyword::Default) => {
                self.advance();
                if matches!(
                    self.current.kind,
                    TokenKind::Keyword(Keyword::Character | Keyword::Charset | Keyword::Collate)
                ) {
                    self.parse_alter_clause(alter)
                } else {
                    Err(self.unexpected("CHARACTER SET or COLLATE").into())
                }
            }
            TokenKind::Keyword(Keyword::Character) => {
                self.advance();
                self.expect_keyword(Keyword::Set)?;
                alter.default_charset = Some(self.parse_option_name()?);
                self.parse_trailing_collation(alter)
            }
            TokenKind::Keyword(Keyword::Charset) => {
                self.advance();
                alter.default_charset = Some(self.parse_option_name()?);
                self.parse_trailing_collation(alter)
            }
            TokenKind::Keyword(Keyword::Collate) => self.parse_trailing_collation(alter),
            TokenKind::Keyword(Keyword::Partition) => {
                self.partitioning = true;
                while !self.current.is_eof() {
                    self.advance();
                }
                Ok(())
            }
            _ if self.at_partition_operation() => {
                self.partitioning = true;
                Ok(self.skip_to_clause_end()?)
            }
            // ALTER COLUMN, ORDER BY, ENABLE/DISABLE KEYS, ALGORITHM, LOCK,
            // ENGINE and the other table options
            _ => Ok(self.skip_to_clause_end()?),
        }
    }

    /// `COLLATE x` after a charset, or on its own, which implies the charset.
    fn parse_trailing_collation(&mut self, alter: &mut AlterTable) -> Result<()> {
        if self.consume_keyword(Keyword::Collate) {
            let charset = charset_of_collation(&self.parse_option_name()?);
            if alter.default_charset.is_none() {
                alter.default_charset = Some(charset);
            }
        }
        Ok(())
    }

    fn push_change(
        alter: &mut AlterTable,
        name: String,
        draft: ColumnDraft,
        position: ColumnPosition,
        if_exists: bool,
    ) {
        if draft.primary_key {
            alter.primary_key = Some(vec![draft.column.name().to_string()]);
        }
        alter.column_mods.push(ColumnMod::Change {
            name,
            column: draft.column,
            position,
            if_exists,
        });
    }

    fn parse_add_clause(&mut self, alter: &mut AlterTable) -> Result<()> {
        let explicit_column = self.consume_keyword(Keyword::Column);
        if !explicit_column {
            match &self.current.kind {
                TokenKind::Keyword(Keyword::Constraint) => {
                    self.advance();
                    if !self.at_constraint_kind() {
                        self.expect_identifier("constraint name")?;
                    }
                    return self.parse_add_clause(alter);
                }
                TokenKind::Keyword(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    alter.primary_key = Some(self.parse_key_columns()?);
                    return Ok(self.skip_to_clause_end()?);
                }
                TokenKind::Keyword(
                    Keyword::Index
                    | Keyword::Key
                    | Keyword::Unique
                    | Keyword::Fulltext
                    | Keyword::Spatial
                    | Keyword::Foreign
                    | Keyword::Check,
                ) => return Ok(self.skip_to_clause_end()?),
                TokenKind::Keyword(Keyword::Partition) => {
                    self.partitioning = true;
                    return Ok(self.skip_to_clause_end()?);
                }
                _ => {}
            }
        }

        if self.consume(&TokenKind::LeftParen) {
            loop {
                let draft = self.parse_column_definition()?;
                if draft.primary_key {
                    alter.primary_key = Some(vec![draft.column.name().to_string()]);
                }
                alter.column_mods.push(ColumnMod::Add {
                    column: draft.column,
                    position: ColumnPosition::Default,
                    if_not_exists: false,
                });
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RightParen)?;
            return Ok(());
        }

        let if_not_exists = self.parse_if_not_exists()?;
        let draft = self.parse_column_definition()?;
        let position = self.parse_column_position()?;
        if draft.primary_key {
            alter.primary_key = Some(vec![draft.column.name().to_string()]);
        }
        alter.column_mods.push(ColumnMod::Add {
            column: draft.column,
            position,
            if_not_exists,
        });
        Ok(())
    }

    fn parse_drop_clause(&mut self, alter: &mut AlterTable) -> Result<()> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Primary) => {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                alter.primary_key = Some(Vec::new());
                Ok(())
            }
            TokenKind::Keyword(
                Keyword::Index
                | Keyword::Key
                | Keyword::Foreign
                | Keyword::Check
                | Keyword::Constraint,
            ) => Ok(self.skip_to_clause_end()?),
            TokenKind::Keyword(Keyword::Partition) => {
                self.partitioning = true;
                Ok(self.skip_to_clause_end()?)
            }
            _ => {
                self.consume_keyword(Keyword::Column);
                let if_exists = self.parse_if_exists()?;
                let name = self.parse_column_name()?;
                let _ = self.consume_keyword(Keyword::Restrict)
                    || self.consume_keyword(Keyword::Cascade);
                alter.column_mods.push(ColumnMod::Remove { name, if_exists });
                Ok(())
            }
        }
    }

    fn parse_rename_clause(&mut self, alter: &mut AlterTable) -> Result<()> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Column) => {
                self.advance();
                let name = self.parse_column_name()?;
                self.expect_keyword(Keyword::To)?;
                let new_name = self.parse_column_name()?;
                alter
                    .column_mods
                    .push(ColumnMod::Rename { name, new_name });
                Ok(())
            }
            TokenKind::Keyword(Keyword::Index | Keyword::Key) => Ok(self.skip_to_clause_end()?),
            _ => {
                let _ = self.consume_keyword(Keyword::To) || self.consume_keyword(Keyword::As);
                alter.new_name = Some(self.parse_table_name()?);
                Ok(())
            }
        }
    }

    // ===================================================================
    // Columns
    // ===================================================================

    fn parse_column_definition(&mut self) -> Result<ColumnDraft> {
        let name = self.parse_column_name()?;
        let (type_name, mut attrs) = self.parse_data_type()?;
        let primary_key = self.parse_column_attributes(&mut attrs)?;
        let column = ColumnDef::build(name, &type_name, 0, attrs)?;
        Ok(ColumnDraft {
            column,
            primary_key,
        })
    }

    /// Parses a possibly multi-word type name and its parameter list.
    fn parse_data_type(&mut self) -> Result<(String, TypeAttributes)> {
        let mut attrs = TypeAttributes::default();
        let national = self.consume_keyword(Keyword::National);

        let mut type_name = match &self.current.kind {
            TokenKind::Identifier(word) => word.to_ascii_lowercase(),
            TokenKind::Keyword(Keyword::Character) => String::from("character"),
            TokenKind::Keyword(Keyword::Binary) => String::from("binary"),
            TokenKind::Keyword(Keyword::Set) => String::from("set"),
            _ => return Err(self.unexpected("column type").into()),
        };
        self.advance();

        match type_name.as_str() {
            "double" => {
                if self.consume_keyword(Keyword::Precision) {
                    type_name = String::from("double precision");
                }
            }
            "character" | "char" | "nchar" => {
                if self.consume_keyword(Keyword::Varying) || self.consume_word("varchar") {
                    type_name = String::from("varchar");
                }
            }
            "long" => {
                if self.consume_word("varchar") {
                    type_name = String::from("long varchar");
                } else if self.consume_word("varbinary") {
                    type_name = String::from("long varbinary");
                }
            }
            _ => {}
        }
        if national || matches!(type_name.as_str(), "nchar" | "nvarchar") {
            attrs.charset = Some(String::from("utf8"));
        }

        if self.check(&TokenKind::LeftParen) {
            if matches!(type_name.as_str(), "enum" | "set") {
                attrs.enum_values = self.parse_value_list()?;
            } else {
                attrs.column_length = self.parse_length()?;
            }
        }
        Ok((type_name, attrs))
    }

    /// `('a', 'b', ...)`.
    fn parse_value_list(&mut self) -> Result<Vec<String>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut values = Vec::new();
        loop {
            match &self.current.kind {
                TokenKind::String(value) | TokenKind::DoubleQuoted(value) => {
                    values.push(value.clone());
                    self.advance();
                }
                _ => return Err(self.unexpected("quoted value").into()),
            }
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(values)
    }

    /// `(n)` or `(n, m)`; returns `n`.
    fn parse_length(&mut self) -> Result<Option<u64>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut length = None;
        loop {
            match &self.current.kind {
                TokenKind::Integer(n) => {
                    length = length.or(Some(*n));
                    self.advance();
                }
                _ => return Err(self.unexpected("length").into()),
            }
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(length)
    }

    /// Column attributes up to the end of the definition. Returns true for
    /// an inline `PRIMARY KEY`.
    fn parse_column_attributes(&mut self, attrs: &mut TypeAttributes) -> Result<bool> {
        let mut primary_key = false;
        let mut collation_charset = None;
        loop {
            match &self.current.kind {
                TokenKind::Comma
                | TokenKind::RightParen
                | TokenKind::Semicolon
                | TokenKind::Eof
                | TokenKind::Keyword(Keyword::First | Keyword::After) => break,
                TokenKind::Keyword(Keyword::Unsigned | Keyword::Zerofill) => {
                    attrs.signed = false;
                    self.advance();
                }
                TokenKind::Identifier(word) if word.eq_ignore_ascii_case("byte") => {
                    attrs.byte = true;
                    self.advance();
                }
                TokenKind::Identifier(word) if word.eq_ignore_ascii_case("unicode") => {
                    attrs.charset = Some(String::from("ucs2"));
                    self.advance();
                }
                TokenKind::Identifier(word) if word.eq_ignore_ascii_case("ascii") => {
                    attrs.charset = Some(String::from("latin1"));
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Character) => {
                    self.advance();
                    self.expect_keyword(Keyword::Set)?;
                    attrs.charset = Some(self.parse_option_name()?);
                }
                TokenKind::Keyword(Keyword::Charset) => {
                    self.advance();
                    attrs.charset = Some(self.parse_option_name()?);
                }
                TokenKind::Keyword(Keyword::Collate) => {
                    self.advance();
                    collation_charset = Some(charset_of_collation(&self.parse_option_name()?));
                }
                TokenKind::Keyword(Keyword::Primary) => {
                    self.advance();
                    self.expect_keyword(Keyword::Key)?;
                    primary_key = true;
                }
                TokenKind::Keyword(Keyword::Key) => {
                    self.advance();
                    primary_key = true;
                }
                TokenKind::Keyword(Keyword::Unique) => {
                    self.advance();
                    self.consume_keyword(Keyword::Key);
                }
                TokenKind::Keyword(Keyword::Default | Keyword::Comment) => {
                    self.advance();
                    self.skip_value()?;
                }
                TokenKind::Keyword(Keyword::On) => {
                    self.advance();
                    if self.consume_keyword(Keyword::Update) {
                        self.skip_value()?;
                    }
                }
                TokenKind::LeftParen => self.skip_parenthesized()?,
                _ => self.bump()?,
            }
        }
        if attrs.charset.is_none() {
            attrs.charset = collation_charset;
        }
        Ok(primary_key)
    }

    /// One position clause; each column clause reads its own.
    fn parse_column_position(&mut self) -> Result<ColumnPosition> {
        if self.consume_keyword(Keyword::First) {
            Ok(ColumnPosition::First)
        } else if self.consume_keyword(Keyword::After) {
            Ok(ColumnPosition::After(self.parse_column_name()?))
        } else {
            Ok(ColumnPosition::Default)
        }
    }

    /// `[name] [USING x] (col [(len)] [ASC|DESC], ...)`.
    fn parse_key_columns(&mut self) -> Result<Vec<String>> {
        while !self.check(&TokenKind::LeftParen) {
            if self.at_statement_end() {
                return Err(self.unexpected("key column list").into());
            }
            self.bump()?;
        }
        self.advance();
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_name()?);
            if self.check(&TokenKind::LeftParen) {
                self.skip_parenthesized()?;
            }
            let _ = self.consume_keyword(Keyword::Asc) || self.consume_keyword(Keyword::Desc);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(columns)
    }

    // ===================================================================
    // Names
    // ===================================================================

    /// `table`, `db.table` or `.table`.
    fn parse_table_name(&mut self) -> Result<TableName> {
        if self.consume(&TokenKind::Dot) {
            let table = self.expect_qualified_part("table name")?;
            return Ok(TableName::new(self.require_database()?, table));
        }
        let first = self.expect_identifier("table name")?;
        if self.consume(&TokenKind::Dot) {
            let table = self.expect_qualified_part("table name")?;
            Ok(TableName::new(first, table))
        } else {
            Ok(TableName::new(self.require_database()?, first))
        }
    }

    /// A column name, dropping any `db.table.` qualifier.
    fn parse_column_name(&mut self) -> Result<String> {
        let mut name = self.expect_identifier("column name")?;
        while self.consume(&TokenKind::Dot) {
            name = self.expect_qualified_part("column name")?;
        }
        Ok(name)
    }

    /// A charset or collation name after an optional `=`.
    fn parse_option_name(&mut self) -> Result<String> {
        self.consume(&TokenKind::Eq);
        let name = match &self.current.kind {
            TokenKind::Identifier(s) | TokenKind::String(s) | TokenKind::DoubleQuoted(s) => {
                s.to_ascii_lowercase()
            }
            TokenKind::Keyword(kw) => kw.as_str().to_ascii_lowercase(),
            _ => return Err(self.unexpected("charset name").into()),
        };
        self.advance();
        Ok(name)
    }

    fn parse_if_exists(&mut self) -> Result<bool> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_not_exists(&mut self) -> Result<bool> {
        if self.consume_keyword(Keyword::If) {
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn require_database(&self) -> Result<String> {
        self.current_database
            .map(str::to_string)
            .ok_or_else(|| ParseError::new("No database selected", self.previous.span).into())
    }

    /// Identifier text of `token`. Any keyword or a number is a name after
    /// a dot; otherwise only non-reserved keywords are.
    fn identifier_text(&self, token: &Token, after_dot: bool) -> Option<String> {
        match &token.kind {
            TokenKind::Identifier(name) | TokenKind::DoubleQuoted(name) => Some(name.clone()),
            TokenKind::Keyword(kw) if after_dot || !kw.is_reserved() => {
                Some(token.span.text(self.source).to_string())
            }
            TokenKind::Integer(_) if after_dot => Some(token.span.text(self.source).to_string()),
            _ => None,
        }
    }

    // ===================================================================
    // Skipping
    // ===================================================================

    /// Skips a single value: a literal, a name, a function call or a
    /// parenthesized expression.
    fn skip_value(&mut self) -> ParseResult<()> {
        while matches!(self.current.kind, TokenKind::Minus | TokenKind::Plus) {
            self.advance();
        }
        match &self.current.kind {
            TokenKind::LeftParen => self.skip_parenthesized(),
            TokenKind::Comma | TokenKind::RightParen | TokenKind::Semicolon | TokenKind::Eof => {
                Err(self.unexpected("value"))
            }
            _ => {
                self.bump()?;
                if self.check(&TokenKind::LeftParen) {
                    self.skip_parenthesized()?;
                }
                Ok(())
            }
        }
    }

    /// Skips a balanced `( ... )` group starting at the current token.
    fn skip_parenthesized(&mut self) -> ParseResult<()> {
        self.expect(&TokenKind::LeftParen)?;
        let mut depth = 1usize;
        while depth > 0 {
            match &self.current.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth -= 1,
                TokenKind::Eof => return Err(self.unexpected("')'")),
                TokenKind::Error(_) => return Err(self.unexpected("')'")),
                _ => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// Skips to the comma or closing parenthesis that ends the current
    /// clause, without consuming it.
    fn skip_to_clause_end(&mut self) -> ParseResult<()> {
        loop {
            match &self.current.kind {
                TokenKind::Comma | TokenKind::RightParen | TokenKind::Semicolon | TokenKind::Eof => {
                    return Ok(())
                }
                TokenKind::LeftParen => self.skip_parenthesized()?,
                _ => self.bump()?,
            }
        }
    }

    // ===================================================================
    // Helpers
    // ===================================================================

    /// Advances to the next token.
    fn advance(&mut self) {
        self.previous = core::mem::replace(&mut self.current, self.lexer.next_token());
    }

    /// Advances over any token but a lexer error.
    fn bump(&mut self) -> ParseResult<()> {
        if matches!(self.current.kind, TokenKind::Error(_)) {
            return Err(self.unexpected("token"));
        }
        self.advance();
        Ok(())
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current.kind) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.current.kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Consumes the current token if it matches.
    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it is the given keyword.
    fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes an unquoted word that is not a keyword, such as a type name.
    fn consume_word(&mut self, word: &str) -> bool {
        if matches!(&self.current.kind, TokenKind::Identifier(w) if w.eq_ignore_ascii_case(word)) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to be the given kind.
    fn expect(&mut self, kind: &TokenKind) -> ParseResult<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(format!("{kind:?}")))
        }
    }

    /// Expects the current token to be the given keyword.
    fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(keyword.as_str()))
        }
    }

    /// Expects a name.
    fn expect_identifier(&mut self, what: &str) -> ParseResult<String> {
        match self.identifier_text(&self.current, false) {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(self.unexpected(what)),
        }
    }

    /// Expects a name following a dot.
    fn expect_qualified_part(&mut self, what: &str) -> ParseResult<String> {
        match self.identifier_text(&self.current, true) {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(self.unexpected(what)),
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Semicolon | TokenKind::Eof)
    }

    /// `COALESCE PARTITION`, `REMOVE PARTITIONING`, `CHECK PARTITION` and
    /// the other partition maintenance clauses.
    fn at_partition_operation(&self) -> bool {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Check) => true,
            TokenKind::Identifier(word) => PARTITION_OPERATIONS
                .iter()
                .any(|op| word.eq_ignore_ascii_case(op)),
            _ => false,
        }
    }

    fn at_constraint_kind(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Keyword(
                Keyword::Primary | Keyword::Unique | Keyword::Foreign | Keyword::Check
            )
        )
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        ParseError::unexpected(expected, self.current.kind.clone(), self.current.span)
    }
}
