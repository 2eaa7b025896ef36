//! Engine configuration.

use serde::{Deserialize, Serialize};

/// How database and table names compare, mirroring the server's
/// `lower_case_table_names` setting.
///
/// This must be configured explicitly to match the server. It is never
/// inferred from the host filesystem. Column names always compare
/// case-insensitively, regardless of this mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseSensitivity {
    /// `lower_case_table_names=0`: names compare exactly.
    #[default]
    CaseSensitive,
    /// `lower_case_table_names=1`: names are stored lowercased and compare
    /// case-insensitively.
    ConvertToLower,
    /// `lower_case_table_names=2`: names are stored as given and compare
    /// case-insensitively.
    ConvertOnCompare,
}

impl CaseSensitivity {
    /// Maps the server's `lower_case_table_names` value.
    #[must_use]
    pub const fn from_lower_case_table_names(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::CaseSensitive),
            1 => Some(Self::ConvertToLower),
            2 => Some(Self::ConvertOnCompare),
            _ => None,
        }
    }

    /// Returns true if `a` and `b` name the same database or table.
    #[must_use]
    pub fn names_equal(self, a: &str, b: &str) -> bool {
        match self {
            Self::CaseSensitive => a == b,
            Self::ConvertToLower | Self::ConvertOnCompare => a.eq_ignore_ascii_case(b)
                || (!a.is_ascii() && a.to_lowercase() == b.to_lowercase()),
        }
    }

    /// Returns the name as it is stored for a newly created object.
    #[must_use]
    pub fn stored_name(self, name: &str) -> String {
        match self {
            Self::ConvertToLower => name.to_lowercase(),
            Self::CaseSensitive | Self::ConvertOnCompare => name.to_string(),
        }
    }
}

/// Whether `ALTER DATABASE ... CHARACTER SET` reaches existing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CharsetCascade {
    /// Existing tables keep their charset, as on the server.
    #[default]
    Never,
    /// Tables whose default charset equals the database's previous charset
    /// take the new one. Column charsets are never touched.
    InheritingTables,
}

/// Configuration shared by the parser, resolver, and tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineConfig {
    /// Name comparison mode.
    pub case_sensitivity: CaseSensitivity,
    /// Database charset change behavior.
    pub charset_cascade: CharsetCascade,
    /// Server default charset, used for databases created without one when
    /// no schema is loaded yet.
    pub server_charset: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            case_sensitivity: CaseSensitivity::default(),
            charset_cascade: CharsetCascade::default(),
            server_charset: String::from("utf8mb4"),
        }
    }
}
