//! Column type system.
//!
//! A declared MySQL type string is classified once, by [`ColumnDef::build`],
//! into a closed set of [`ColumnKind`]s. Each kind knows which binlog wire
//! types it accepts ([`ColumnDef::matches`]) and how to render decoded row
//! values ([`ColumnDef::to_sql`], [`ColumnDef::to_json`]).

mod value;
mod wire;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

pub use value::ColumnValue;
pub use wire::WireType;

/// The charset name MySQL uses for byte strings.
pub const BINARY_CHARSET: &str = "binary";

/// Flavor of an enumerated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    /// `ENUM(...)`: exactly one of the values.
    Enum,
    /// `SET(...)`: any subset of the values.
    Set,
}

/// The classified kind of a column, with the attributes that matter for
/// decoding and rendering its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// `tinyint`, `smallint`, `mediumint`, `int`.
    Int {
        /// Storage width: 8, 16, 24, or 32.
        bits: u8,
        /// False for `UNSIGNED` columns.
        signed: bool,
    },
    /// `bigint`.
    BigInt {
        /// False for `UNSIGNED` columns.
        signed: bool,
    },
    /// Text and byte strings. Byte strings carry the `binary` charset.
    String {
        /// Charset; `None` until inherited from the table.
        charset: Option<String>,
    },
    /// `float` or `double`.
    Float {
        /// True for `double`.
        double: bool,
    },
    /// `decimal`.
    Decimal,
    /// `datetime` and `timestamp`.
    DateTime {
        /// Fractional seconds precision, 0 to 6.
        fsp: u8,
    },
    /// `date`.
    Date,
    /// `time`.
    Time {
        /// Fractional seconds precision, 0 to 6.
        fsp: u8,
    },
    /// `year`.
    Year,
    /// `bit`.
    Bit,
    /// `enum` and `set`.
    Enumerated {
        /// Enum or set.
        kind: EnumKind,
        /// Declared values, in order.
        values: Vec<String>,
    },
    /// Spatial types.
    Geometry,
    /// `json`.
    Json,
}

/// Attributes collected from a column declaration alongside its type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAttributes {
    /// False if `UNSIGNED`, `ZEROFILL`, or `SERIAL` was given.
    pub signed: bool,
    /// Explicit `CHARACTER SET`.
    pub charset: Option<String>,
    /// The first length argument, e.g. `6` in `datetime(6)`.
    pub column_length: Option<u64>,
    /// Values of an `enum`/`set` declaration.
    pub enum_values: Vec<String>,
    /// `BYTE` attribute: character types become byte strings.
    pub byte: bool,
}

impl Default for TypeAttributes {
    fn default() -> Self {
        Self {
            signed: true,
            charset: None,
            column_length: None,
            enum_values: Vec::new(),
            byte: false,
        }
    }
}

impl TypeAttributes {
    /// Marks the column unsigned.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    /// Sets the column charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the length argument.
    #[must_use]
    pub const fn length(mut self, length: u64) -> Self {
        self.column_length = Some(length);
        self
    }

    /// Sets enum or set values.
    #[must_use]
    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// Resolves MySQL type aliases to the name `information_schema` reports.
///
/// `byte` converts character types to their byte-string counterparts, and
/// an explicit length on `text`/`blob` selects the smallest type that fits.
#[must_use]
pub fn unalias_type(declared: &str, byte: bool, length: Option<u64>) -> String {
    let lowered = declared.trim().to_ascii_lowercase();
    let base = match lowered.as_str() {
        "character" | "nchar" | "national char" | "national character" => "char",
        "nvarchar" | "varying" | "character varying" | "char varying" | "nchar varying"
        | "national varchar" | "national character varying" | "national char varying" => {
            "varchar"
        }
        "bool" | "boolean" | "int1" => "tinyint",
        "int2" => "smallint",
        "int3" | "middleint" => "mediumint",
        "int4" | "integer" => "int",
        "int8" | "serial" => "bigint",
        "float4" => "float",
        "real" | "float8" | "double precision" => "double",
        "numeric" | "fixed" | "dec" => "decimal",
        "long" | "long varchar" | "long char varying" => "mediumtext",
        "long varbinary" => "mediumblob",
        "geomcollection" => "geometrycollection",
        "text" | "blob" => match length {
            Some(len) => sized_lob(&lowered, len),
            None => lowered.as_str(),
        },
        other => other,
    };

    if !byte {
        return base.to_string();
    }
    match base {
        "char" => "binary",
        "varchar" => "varbinary",
        "tinytext" => "tinyblob",
        "text" => "blob",
        "mediumtext" => "mediumblob",
        "longtext" => "longblob",
        other => other,
    }
    .to_string()
}

fn sized_lob(base: &str, length: u64) -> &'static str {
    let text = base == "text";
    match length {
        l if l < 1 << 8 => if text { "tinytext" } else { "tinyblob" },
        l if l < 1 << 16 => if text { "text" } else { "blob" },
        l if l < 1 << 24 => if text { "mediumtext" } else { "mediumblob" },
        _ => if text { "longtext" } else { "longblob" },
    }
}

/// One column of a table: name, declared type, position, and kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColumnDefRepr", into = "ColumnDefRepr")]
pub struct ColumnDef {
    name: String,
    type_name: String,
    position: usize,
    kind: ColumnKind,
}

impl ColumnDef {
    /// Classifies a declared column type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedType`] if the type has no mapping.
    pub fn build(
        name: impl Into<String>,
        declared_type: &str,
        position: usize,
        attrs: TypeAttributes,
    ) -> Result<Self> {
        let name = name.into();
        let type_name = unalias_type(declared_type, attrs.byte, attrs.column_length);
        let signed = attrs.signed && !declared_type.eq_ignore_ascii_case("serial");
        let fsp = attrs
            .column_length
            .map_or(0, |len| u8::try_from(len.min(6)).unwrap_or(6));

        let kind = match type_name.as_str() {
            "tinyint" => ColumnKind::Int { bits: 8, signed },
            "smallint" => ColumnKind::Int { bits: 16, signed },
            "mediumint" => ColumnKind::Int { bits: 24, signed },
            "int" => ColumnKind::Int { bits: 32, signed },
            "bigint" => ColumnKind::BigInt { signed },
            "tinytext" | "text" | "mediumtext" | "longtext" | "varchar" | "char" => {
                ColumnKind::String {
                    charset: attrs.charset.map(|c| c.to_ascii_lowercase()),
                }
            }
            "tinyblob" | "blob" | "mediumblob" | "longblob" | "binary" | "varbinary" => {
                ColumnKind::String {
                    charset: Some(String::from(BINARY_CHARSET)),
                }
            }
            "geometry" | "geometrycollection" | "linestring" | "multilinestring"
            | "multipoint" | "multipolygon" | "polygon" | "point" => ColumnKind::Geometry,
            "float" => ColumnKind::Float { double: false },
            "double" => ColumnKind::Float { double: true },
            "decimal" => ColumnKind::Decimal,
            "date" => ColumnKind::Date,
            "datetime" | "timestamp" => ColumnKind::DateTime { fsp },
            "time" => ColumnKind::Time { fsp },
            "year" => ColumnKind::Year,
            "bit" => ColumnKind::Bit,
            "enum" => ColumnKind::Enumerated {
                kind: EnumKind::Enum,
                values: attrs.enum_values,
            },
            "set" => ColumnKind::Enumerated {
                kind: EnumKind::Set,
                values: attrs.enum_values,
            },
            "json" => ColumnKind::Json,
            _ => {
                return Err(SchemaError::UnsupportedType {
                    column: name,
                    type_name: type_name.clone(),
                });
            }
        };

        Ok(Self {
            name,
            type_name,
            position,
            kind,
        })
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name after alias resolution, e.g. `varchar` or `mediumblob`.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Zero-based ordinal position within the table.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The classified kind.
    #[must_use]
    pub const fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    /// Signedness, for integer kinds.
    #[must_use]
    pub const fn signed(&self) -> Option<bool> {
        match self.kind {
            ColumnKind::Int { signed, .. } | ColumnKind::BigInt { signed } => Some(signed),
            _ => None,
        }
    }

    /// Charset, for string kinds.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        match &self.kind {
            ColumnKind::String { charset } => charset.as_deref(),
            _ => None,
        }
    }

    /// Declared values, for enum and set kinds.
    #[must_use]
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            ColumnKind::Enumerated { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Fractional seconds precision, for temporal kinds that have one.
    #[must_use]
    pub const fn fsp(&self) -> Option<u8> {
        match self.kind {
            ColumnKind::DateTime { fsp } | ColumnKind::Time { fsp } => Some(fsp),
            _ => None,
        }
    }

    /// True for byte strings.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.charset() == Some(BINARY_CHARSET)
    }

    /// Returns a copy with a different name.
    #[must_use]
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Gives a string column the table's charset if it has none.
    pub(crate) fn inherit_charset(&mut self, table_charset: &str) {
        if let ColumnKind::String { charset: charset @ None } = &mut self.kind {
            *charset = Some(table_charset.to_string());
        }
    }

    /// Re-encodes a text column; byte strings are left alone.
    pub(crate) fn convert_charset(&mut self, new_charset: &str) {
        if self.is_binary() {
            return;
        }
        if let ColumnKind::String { charset } = &mut self.kind {
            *charset = Some(new_charset.to_string());
        }
    }
}

/// Persisted shape of a column:
/// `{"type", "name", "charset" | "signed" | "enum-values" | "column-length"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnDefRepr {
    #[serde(rename = "type")]
    type_name: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signed: Option<bool>,
    #[serde(
        rename = "enum-values",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    enum_values: Option<Vec<String>>,
    #[serde(
        rename = "column-length",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    column_length: Option<u64>,
}

impl From<ColumnDef> for ColumnDefRepr {
    fn from(def: ColumnDef) -> Self {
        let signed = def.signed();
        let column_length = def.fsp().map(u64::from);
        let (charset, enum_values) = match def.kind {
            ColumnKind::String { charset } => (charset, None),
            ColumnKind::Enumerated { values, .. } => (None, Some(values)),
            _ => (None, None),
        };
        Self {
            type_name: def.type_name,
            name: def.name,
            charset,
            signed,
            enum_values,
            column_length,
        }
    }
}

impl TryFrom<ColumnDefRepr> for ColumnDef {
    type Error = SchemaError;

    fn try_from(repr: ColumnDefRepr) -> Result<Self> {
        let attrs = TypeAttributes {
            signed: repr.signed.unwrap_or(true),
            charset: repr.charset,
            column_length: repr.column_length,
            enum_values: repr.enum_values.unwrap_or_default(),
            byte: false,
        };
        Self::build(repr.name, &repr.type_name, 0, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(declared: &str, attrs: TypeAttributes) -> ColumnDef {
        ColumnDef::build("c", declared, 0, attrs).unwrap()
    }

    #[test]
    fn test_integer_widths() {
        let cases = [("tinyint", 8), ("smallint", 16), ("mediumint", 24), ("int", 32)];
        for (declared, bits) in cases {
            let def = build(declared, TypeAttributes::default());
            assert_eq!(def.kind(), &ColumnKind::Int { bits, signed: true });
        }
        assert_eq!(
            build("bigint", TypeAttributes::default().unsigned()).kind(),
            &ColumnKind::BigInt { signed: false }
        );
    }

    #[test]
    fn test_aliases() {
        assert_eq!(build("BOOLEAN", TypeAttributes::default()).type_name(), "tinyint");
        assert_eq!(build("integer", TypeAttributes::default()).type_name(), "int");
        assert_eq!(build("real", TypeAttributes::default()).type_name(), "double");
        assert_eq!(build("numeric", TypeAttributes::default()).type_name(), "decimal");
        assert_eq!(build("long varchar", TypeAttributes::default()).type_name(), "mediumtext");
        assert_eq!(
            build("character varying", TypeAttributes::default()).type_name(),
            "varchar"
        );
    }

    #[test]
    fn test_serial_is_unsigned_bigint() {
        let def = build("serial", TypeAttributes::default());
        assert_eq!(def.type_name(), "bigint");
        assert_eq!(def.signed(), Some(false));
    }

    #[test]
    fn test_sized_text_and_blob() {
        assert_eq!(unalias_type("text", false, Some(200)), "tinytext");
        assert_eq!(unalias_type("text", false, Some(300)), "text");
        assert_eq!(unalias_type("blob", false, Some(70_000)), "mediumblob");
        assert_eq!(unalias_type("text", false, Some(1 << 24)), "longtext");
    }

    #[test]
    fn test_byte_flag() {
        assert_eq!(unalias_type("varchar", true, None), "varbinary");
        assert_eq!(unalias_type("char", true, None), "binary");
        assert_eq!(unalias_type("mediumtext", true, None), "mediumblob");
        assert_eq!(unalias_type("int", true, None), "int");
    }

    #[test]
    fn test_blob_kinds_are_binary_strings() {
        let def = build("varbinary", TypeAttributes::default().charset("latin1"));
        assert_eq!(def.charset(), Some(BINARY_CHARSET));
        assert!(def.is_binary());
    }

    #[test]
    fn test_temporal_precision() {
        let def = build("datetime", TypeAttributes::default().length(3));
        assert_eq!(def.fsp(), Some(3));
        assert_eq!(build("time", TypeAttributes::default()).fsp(), Some(0));
        assert_eq!(build("date", TypeAttributes::default()).fsp(), None);
    }

    #[test]
    fn test_unsupported_type() {
        let err = ColumnDef::build("c", "frobnicate", 0, TypeAttributes::default()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedType { ref type_name, .. } if type_name == "frobnicate"
        ));
    }

    #[test]
    fn test_json_shape() {
        let def = build("int", TypeAttributes::default().unsigned());
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            serde_json::json!({"type": "int", "name": "c", "signed": false})
        );

        let def = build("varchar", TypeAttributes::default().charset("utf8mb4"));
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            serde_json::json!({"type": "varchar", "name": "c", "charset": "utf8mb4"})
        );

        let def = build("enum", TypeAttributes::default().values(["a", "b"]));
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            serde_json::json!({"type": "enum", "name": "c", "enum-values": ["a", "b"]})
        );

        let def = build("timestamp", TypeAttributes::default().length(6));
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            serde_json::json!({"type": "timestamp", "name": "c", "column-length": 6})
        );
    }

    #[test]
    fn test_deserialize_rejects_unknown_type() {
        let result: std::result::Result<ColumnDef, _> =
            serde_json::from_str(r#"{"type": "frobnicate", "name": "c"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_charset_skips_binary() {
        let mut text = build("text", TypeAttributes::default().charset("latin1"));
        let mut blob = build("blob", TypeAttributes::default());
        text.convert_charset("utf8mb4");
        blob.convert_charset("utf8mb4");
        assert_eq!(text.charset(), Some("utf8mb4"));
        assert_eq!(blob.charset(), Some(BINARY_CHARSET));
    }
}
