//! Token types for the MySQL DDL lexer.

use super::Span;

/// Keywords recognized by the DDL grammar.
///
/// Column type names (`int`, `varchar`, ...) are deliberately not keywords;
/// they reach the parser as identifiers and are classified by
/// [`ColumnDef::build`](crate::columndef::ColumnDef::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Statements
    Create,
    Alter,
    Drop,
    Rename,
    Select,

    // Objects
    Database,
    Schema,
    Table,
    Tables,
    Column,
    Index,
    Key,
    Keys,
    View,
    Temporary,

    // ALTER TABLE clauses
    Add,
    Change,
    Modify,
    Convert,
    First,
    After,
    To,
    As,
    Enable,
    Disable,
    Order,
    By,
    Algorithm,
    Lock,
    Partition,
    Online,
    Offline,
    Ignore,

    // Guards
    If,
    Not,
    Exists,
    Like,
    Or,
    Replace,

    // Constraints
    Primary,
    Unique,
    Fulltext,
    Spatial,
    Foreign,
    References,
    Constraint,
    Check,
    Cascade,
    Restrict,
    Using,
    Asc,
    Desc,

    // Column attributes
    Default,
    Null,
    Unsigned,
    Signed,
    Zerofill,
    Binary,
    National,
    Varying,
    Precision,
    Character,
    Charset,
    Set,
    Collate,
    Comment,
    AutoIncrement,
    Generated,
    Always,
    Virtual,
    Stored,
    On,
    Update,
    Definer,
}

impl Keyword {
    /// Attempts to parse a keyword from a word (case-insensitive).
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let keyword = match s.to_ascii_uppercase().as_str() {
            "CREATE" => Self::Create,
            "ALTER" => Self::Alter,
            "DROP" => Self::Drop,
            "RENAME" => Self::Rename,
            "SELECT" => Self::Select,
            "DATABASE" => Self::Database,
            "SCHEMA" => Self::Schema,
            "TABLE" => Self::Table,
            "TABLES" => Self::Tables,
            "COLUMN" => Self::Column,
            "INDEX" => Self::Index,
            "KEY" => Self::Key,
            "KEYS" => Self::Keys,
            "VIEW" => Self::View,
            "TEMPORARY" => Self::Temporary,
            "ADD" => Self::Add,
            "CHANGE" => Self::Change,
            "MODIFY" => Self::Modify,
            "CONVERT" => Self::Convert,
            "FIRST" => Self::First,
            "AFTER" => Self::After,
            "TO" => Self::To,
            "AS" => Self::As,
            "ENABLE" => Self::Enable,
            "DISABLE" => Self::Disable,
            "ORDER" => Self::Order,
            "BY" => Self::By,
            "ALGORITHM" => Self::Algorithm,
            "LOCK" => Self::Lock,
            "PARTITION" => Self::Partition,
            "ONLINE" => Self::Online,
            "OFFLINE" => Self::Offline,
            "IGNORE" => Self::Ignore,
            "IF" => Self::If,
            "NOT" => Self::Not,
            "EXISTS" => Self::Exists,
            "LIKE" => Self::Like,
            "OR" => Self::Or,
            "REPLACE" => Self::Replace,
            "PRIMARY" => Self::Primary,
            "UNIQUE" => Self::Unique,
            "FULLTEXT" => Self::Fulltext,
            "SPATIAL" => Self::Spatial,
            "FOREIGN" => Self::Foreign,
            "REFERENCES" => Self::References,
            "CONSTRAINT" => Self::Constraint,
            "CHECK" => Self::Check,
            "CASCADE" => Self::Cascade,
            "RESTRICT" => Self::Restrict,
            "USING" => Self::Using,
            "ASC" => Self::Asc,
            "DESC" => Self::Desc,
            "DEFAULT" => Self::Default,
            "NULL" => Self::Null,
            "UNSIGNED" => Self::Unsigned,
            "SIGNED" => Self::Signed,
            "ZEROFILL" => Self::Zerofill,
            "BINARY" => Self::Binary,
            "NATIONAL" => Self::National,
            "VARYING" => Self::Varying,
            "PRECISION" => Self::Precision,
            "CHARACTER" => Self::Character,
            "CHARSET" => Self::Charset,
            "SET" => Self::Set,
            "COLLATE" => Self::Collate,
            "COMMENT" => Self::Comment,
            "AUTO_INCREMENT" => Self::AutoIncrement,
            "GENERATED" => Self::Generated,
            "ALWAYS" => Self::Always,
            "VIRTUAL" => Self::Virtual,
            "STORED" => Self::Stored,
            "ON" => Self::On,
            "UPDATE" => Self::Update,
            "DEFINER" => Self::Definer,
            _ => return None,
        };
        Some(keyword)
    }

    /// Returns the canonical spelling of the keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Alter => "ALTER",
            Self::Drop => "DROP",
            Self::Rename => "RENAME",
            Self::Select => "SELECT",
            Self::Database => "DATABASE",
            Self::Schema => "SCHEMA",
            Self::Table => "TABLE",
            Self::Tables => "TABLES",
            Self::Column => "COLUMN",
            Self::Index => "INDEX",
            Self::Key => "KEY",
            Self::Keys => "KEYS",
            Self::View => "VIEW",
            Self::Temporary => "TEMPORARY",
            Self::Add => "ADD",
            Self::Change => "CHANGE",
            Self::Modify => "MODIFY",
            Self::Convert => "CONVERT",
            Self::First => "FIRST",
            Self::After => "AFTER",
            Self::To => "TO",
            Self::As => "AS",
            Self::Enable => "ENABLE",
            Self::Disable => "DISABLE",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Algorithm => "ALGORITHM",
            Self::Lock => "LOCK",
            Self::Partition => "PARTITION",
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
            Self::Ignore => "IGNORE",
            Self::If => "IF",
            Self::Not => "NOT",
            Self::Exists => "EXISTS",
            Self::Like => "LIKE",
            Self::Or => "OR",
            Self::Replace => "REPLACE",
            Self::Primary => "PRIMARY",
            Self::Unique => "UNIQUE",
            Self::Fulltext => "FULLTEXT",
            Self::Spatial => "SPATIAL",
            Self::Foreign => "FOREIGN",
            Self::References => "REFERENCES",
            Self::Constraint => "CONSTRAINT",
            Self::Check => "CHECK",
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::Using => "USING",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Default => "DEFAULT",
            Self::Null => "NULL",
            Self::Unsigned => "UNSIGNED",
            Self::Signed => "SIGNED",
            Self::Zerofill => "ZEROFILL",
            Self::Binary => "BINARY",
            Self::National => "NATIONAL",
            Self::Varying => "VARYING",
            Self::Precision => "PRECISION",
            Self::Character => "CHARACTER",
            Self::Charset => "CHARSET",
            Self::Set => "SET",
            Self::Collate => "COLLATE",
            Self::Comment => "COMMENT",
            Self::AutoIncrement => "AUTO_INCREMENT",
            Self::Generated => "GENERATED",
            Self::Always => "ALWAYS",
            Self::Virtual => "VIRTUAL",
            Self::Stored => "STORED",
            Self::On => "ON",
            Self::Update => "UPDATE",
            Self::Definer => "DEFINER",
        }
    }

    /// Returns true if MySQL reserves this word, so it cannot name a table
    /// or column without backquotes (except after a `.` qualifier).
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        !matches!(
            self,
            Self::Tables
                | Self::View
                | Self::Temporary
                | Self::Modify
                | Self::First
                | Self::After
                | Self::Enable
                | Self::Disable
                | Self::Algorithm
                | Self::Online
                | Self::Offline
                | Self::National
                | Self::Signed
                | Self::Charset
                | Self::Comment
                | Self::AutoIncrement
                | Self::Always
                | Self::Definer
        )
    }
}

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Unsigned integer literal; signs are separate tokens.
    Integer(u64),
    /// Decimal or exponent literal.
    Float(f64),
    /// Single-quoted string literal, escapes resolved.
    String(String),
    /// Double-quoted string; a string in MySQL's default mode, an
    /// identifier under `ANSI_QUOTES`.
    DoubleQuoted(String),
    /// `X'..'` or `0x..` literal.
    HexLiteral(Vec<u8>),
    /// `B'..'` or `0b..` literal, digits only.
    BitLiteral(String),

    // Identifiers and keywords
    /// Bare or backquoted identifier.
    Identifier(String),
    /// Keyword.
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ^
    Caret,
    /// ~
    BitNot,
    /// !
    Bang,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// :
    Colon,
    /// ?
    Question,
    /// @
    At,

    // Special
    /// End of input
    Eof,
    /// Invalid/unknown token
    Error(String),
}

/// A token with its span in the statement text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the statement text.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}
