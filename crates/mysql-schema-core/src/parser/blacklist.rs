//! Statements that never change the tracked schema.
//!
//! These are recognized by pattern before parsing and produce no changes.

use regex::Regex;

use crate::error::Result;

/// Statement prefixes, matched at the start of the statement once
/// comments are stripped.
const PATTERNS: &[&str] = &[
    r"BEGIN\b",
    r"COMMIT\b",
    r"FLUSH\b",
    r"GRANT\b",
    r"REVOKE\b",
    r"SAVEPOINT\b",
    r"CREATE\s+(AGGREGATE\s+)?FUNCTION\b",
    r"(ALTER|CREATE)\s+(DEFINER\s*=\s*\S+\s+)?(EVENT|FUNCTION|TRIGGER|PROCEDURE|ALGORITHM)\b",
    r"DROP\s+(EVENT|FUNCTION|TRIGGER|PROCEDURE|VIEW)\b",
    r"(ALTER|CREATE|DROP)\s+((ONLINE|OFFLINE|UNIQUE|FULLTEXT|SPATIAL)\s+)*INDEX\b",
    r"ANALYZE\s+TABLE\b",
    r"SET\s+PASSWORD\b",
    r"(ALTER|CREATE|DROP|RENAME)\s+USER\b",
    r"CREATE\s+TEMPORARY\s+TABLE\b",
    r"TRUNCATE\b",
    r"OPTIMIZE\b",
    r"REPAIR\b",
];

/// Compiled statement blacklist.
#[derive(Debug, Clone)]
pub struct Blacklist {
    executable_comment: Regex,
    block_comment: Regex,
    line_comment: Regex,
    patterns: Vec<Regex>,
}

impl Blacklist {
    /// Compiles the patterns.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Pattern`](crate::error::SchemaError::Pattern)
    /// if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        let patterns = PATTERNS
            .iter()
            .map(|p| Regex::new(&format!(r"(?i)\A\s*{p}")))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            executable_comment: Regex::new(r"(?s)/\*M?!\d*\s*(.*?)\*/")?,
            block_comment: Regex::new(r"(?s)/\*.*?\*/")?,
            line_comment: Regex::new(r"--.*")?,
            patterns,
        })
    }

    /// Keeps the body of version comments and strips all other comments.
    #[must_use]
    pub fn normalize(&self, sql: &str) -> String {
        let sql = self.executable_comment.replace_all(sql, "$1");
        let sql = self.block_comment.replace_all(&sql, "");
        self.line_comment.replace_all(&sql, "").into_owned()
    }

    /// True if the statement matches a blacklist pattern.
    #[must_use]
    pub fn matches(&self, sql: &str) -> bool {
        let normalized = self.normalize(sql);
        self.patterns.iter().any(|p| p.is_match(&normalized))
    }
}
