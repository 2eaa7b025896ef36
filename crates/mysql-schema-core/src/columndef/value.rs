//! Rendering decoded row values as SQL literals and JSON.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::Value as JsonValue;

use super::{ColumnDef, ColumnKind, EnumKind};
use crate::error::{Result, SchemaError};

/// A value decoded from a binlog row image.
///
/// Integers arrive as signed raw values whatever the column's signedness;
/// rendering reinterprets them.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// SQL NULL.
    Null,
    /// Integer, year, or enum/set index.
    Int(i64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// Decimal, in its canonical text form.
    Decimal(String),
    /// Raw string or blob bytes, in the column's charset.
    Bytes(Vec<u8>),
    /// Already-decoded text. Also used for zero dates.
    Text(String),
    /// Date.
    Date(NaiveDate),
    /// Datetime or timestamp.
    DateTime(NaiveDateTime),
    /// Time of day.
    Time(NaiveTime),
    /// Bit field.
    Bits(u64),
    /// Set members, already resolved.
    Set(Vec<String>),
}

impl ColumnValue {
    fn describe(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Int(_) => "an integer",
            Self::Float(_) | Self::Double(_) => "a float",
            Self::Decimal(_) => "a decimal",
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Date(_) => "a date",
            Self::DateTime(_) => "a datetime",
            Self::Time(_) => "a time",
            Self::Bits(_) => "a bit field",
            Self::Set(_) => "a set",
        }
    }
}

/// A rendered value before it is turned into SQL or JSON.
enum Rendered {
    Null,
    Signed(i64),
    Unsigned(u64),
    Number(String),
    Text(String),
    Binary(Vec<u8>),
    List(Vec<String>),
    Json(String),
}

impl ColumnDef {
    /// Renders `value` as a SQL literal.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidValue`] if the value does not fit the
    /// column, or [`SchemaError::UnsupportedCharset`] if text bytes cannot be
    /// decoded.
    pub fn to_sql(&self, value: &ColumnValue) -> Result<String> {
        Ok(match self.render(value)? {
            Rendered::Null => String::from("NULL"),
            Rendered::Signed(v) => v.to_string(),
            Rendered::Unsigned(v) => v.to_string(),
            Rendered::Number(v) => v,
            Rendered::Text(s) | Rendered::Json(s) => quote_sql(&s),
            Rendered::Binary(bytes) => format!("x'{}'", hex::encode(bytes)),
            Rendered::List(items) => quote_sql(&items.join(",")),
        })
    }

    /// Renders `value` as JSON.
    ///
    /// # Errors
    ///
    /// Same as [`ColumnDef::to_sql`]. JSON column text must also parse.
    pub fn to_json(&self, value: &ColumnValue) -> Result<JsonValue> {
        Ok(match self.render(value)? {
            Rendered::Null => JsonValue::Null,
            Rendered::Signed(v) => JsonValue::from(v),
            Rendered::Unsigned(v) => JsonValue::from(v),
            Rendered::Number(v) => v
                .parse::<serde_json::Number>()
                .map_or(JsonValue::String(v), JsonValue::Number),
            Rendered::Text(s) => JsonValue::String(s),
            Rendered::Binary(bytes) => JsonValue::String(BASE64.encode(bytes)),
            Rendered::List(items) => JsonValue::from(items),
            Rendered::Json(s) => {
                serde_json::from_str(&s).map_err(|_| self.invalid(&ColumnValue::Text(s)))?
            }
        })
    }

    fn invalid(&self, value: &ColumnValue) -> SchemaError {
        SchemaError::InvalidValue {
            column: self.name.clone(),
            type_name: self.type_name.clone(),
            value: value.describe().to_string(),
        }
    }

    fn render(&self, value: &ColumnValue) -> Result<Rendered> {
        if *value == ColumnValue::Null {
            return Ok(Rendered::Null);
        }
        let rendered = match (&self.kind, value) {
            (ColumnKind::Int { bits, signed }, ColumnValue::Int(v)) => {
                if *signed || *v >= 0 {
                    Rendered::Signed(*v)
                } else {
                    Rendered::Signed(v + (1i64 << bits))
                }
            }
            (ColumnKind::BigInt { signed: true }, ColumnValue::Int(v)) => Rendered::Signed(*v),
            #[allow(clippy::cast_sign_loss)]
            (ColumnKind::BigInt { signed: false }, ColumnValue::Int(v)) => {
                Rendered::Unsigned(*v as u64)
            }
            (ColumnKind::Year, ColumnValue::Int(v)) => Rendered::Signed(*v),
            (ColumnKind::Float { .. }, ColumnValue::Float(v)) if v.is_finite() => {
                Rendered::Number(v.to_string())
            }
            (ColumnKind::Float { .. }, ColumnValue::Double(v)) if v.is_finite() => {
                Rendered::Number(v.to_string())
            }
            (ColumnKind::Decimal, ColumnValue::Decimal(v)) => Rendered::Number(v.clone()),
            (ColumnKind::String { charset }, ColumnValue::Bytes(bytes)) => {
                if charset.as_deref() == Some(super::BINARY_CHARSET) {
                    Rendered::Binary(bytes.clone())
                } else {
                    Rendered::Text(self.decode(charset.as_deref(), bytes)?)
                }
            }
            (ColumnKind::String { .. }, ColumnValue::Text(s)) => Rendered::Text(s.clone()),
            (ColumnKind::Date, ColumnValue::Date(d)) => {
                Rendered::Text(d.format("%Y-%m-%d").to_string())
            }
            (ColumnKind::DateTime { fsp }, ColumnValue::DateTime(dt)) => Rendered::Text(format!(
                "{}{}",
                dt.format("%Y-%m-%d %H:%M:%S"),
                fraction(dt.nanosecond(), *fsp)
            )),
            (ColumnKind::Time { fsp }, ColumnValue::Time(t)) => Rendered::Text(format!(
                "{}{}",
                t.format("%H:%M:%S"),
                fraction(t.nanosecond(), *fsp)
            )),
            (
                ColumnKind::Date | ColumnKind::DateTime { .. } | ColumnKind::Time { .. },
                ColumnValue::Text(s),
            ) => Rendered::Text(s.clone()),
            (ColumnKind::Bit, ColumnValue::Bits(v)) => Rendered::Unsigned(*v),
            (
                ColumnKind::Enumerated {
                    kind: EnumKind::Enum,
                    values,
                },
                ColumnValue::Int(index),
            ) => Rendered::Text(self.enum_member(values, *index, value)?),
            (
                ColumnKind::Enumerated {
                    kind: EnumKind::Set,
                    values,
                },
                ColumnValue::Int(mask),
            ) => Rendered::List(
                values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i < 64 && (mask >> i) & 1 == 1)
                    .map(|(_, v)| v.clone())
                    .collect(),
            ),
            (
                ColumnKind::Enumerated {
                    kind: EnumKind::Set,
                    ..
                },
                ColumnValue::Set(items),
            ) => Rendered::List(items.clone()),
            (ColumnKind::Enumerated { .. }, ColumnValue::Text(s)) => Rendered::Text(s.clone()),
            (ColumnKind::Json, ColumnValue::Text(s)) => Rendered::Json(s.clone()),
            (ColumnKind::Geometry, ColumnValue::Bytes(bytes)) => Rendered::Binary(bytes.clone()),
            _ => return Err(self.invalid(value)),
        };
        Ok(rendered)
    }

    fn enum_member(&self, values: &[String], index: i64, value: &ColumnValue) -> Result<String> {
        if index == 0 {
            return Ok(String::new());
        }
        usize::try_from(index - 1)
            .ok()
            .and_then(|i| values.get(i))
            .cloned()
            .ok_or_else(|| self.invalid(value))
    }

    fn decode(&self, charset: Option<&str>, bytes: &[u8]) -> Result<String> {
        let charset = charset.map(str::to_ascii_lowercase);
        match charset.as_deref() {
            None | Some("utf8" | "utf8mb3" | "utf8mb4") => {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            Some("latin1" | "ascii") => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Some("ucs2" | "utf16") => Ok(String::from_utf16_lossy(
                &bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect::<Vec<_>>(),
            )),
            Some("utf16le") => Ok(String::from_utf16_lossy(
                &bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect::<Vec<_>>(),
            )),
            Some("utf32") => Ok(bytes
                .chunks_exact(4)
                .map(|c| {
                    char::from_u32(u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                        .unwrap_or(char::REPLACEMENT_CHARACTER)
                })
                .collect()),
            Some(other) => Err(SchemaError::UnsupportedCharset {
                column: self.name.clone(),
                charset: other.to_string(),
            }),
        }
    }
}

/// Fractional seconds, truncated to `fsp` digits.
fn fraction(nanos: u32, fsp: u8) -> String {
    if fsp == 0 {
        return String::new();
    }
    let digits = u32::from(fsp.min(6));
    let truncated = (nanos % 1_000_000_000) / 10u32.pow(9 - digits);
    format!(".{truncated:0width$}", width = digits as usize)
}

/// Quotes a string as a SQL literal, escaping quotes and control characters.
fn quote_sql(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columndef::TypeAttributes;
    use serde_json::json;

    fn def(declared: &str, attrs: TypeAttributes) -> ColumnDef {
        ColumnDef::build("c", declared, 0, attrs).unwrap()
    }

    fn unsigned(declared: &str) -> ColumnDef {
        def(declared, TypeAttributes::default().unsigned())
    }

    #[test]
    fn test_unsigned_reinterpretation() {
        let raw = ColumnValue::Int(-10);
        assert_eq!(unsigned("tinyint").to_sql(&raw).unwrap(), "246");
        assert_eq!(unsigned("smallint").to_sql(&raw).unwrap(), "65526");
        assert_eq!(unsigned("mediumint").to_sql(&raw).unwrap(), "16777206");
        assert_eq!(unsigned("int").to_sql(&raw).unwrap(), "4294967286");
        assert_eq!(
            unsigned("bigint").to_sql(&raw).unwrap(),
            "18446744073709551606"
        );
        assert_eq!(unsigned("tinyint").to_json(&raw).unwrap(), json!(246));
        assert_eq!(
            unsigned("bigint").to_json(&raw).unwrap(),
            json!(18_446_744_073_709_551_606u64)
        );
    }

    #[test]
    fn test_signed_values_pass_through() {
        let raw = ColumnValue::Int(-10);
        assert_eq!(def("int", TypeAttributes::default()).to_sql(&raw).unwrap(), "-10");
        assert_eq!(unsigned("int").to_sql(&ColumnValue::Int(7)).unwrap(), "7");
    }

    #[test]
    fn test_text_is_escaped() {
        let col = def("varchar", TypeAttributes::default().charset("utf8mb4"));
        let value = ColumnValue::Bytes(b"it's\na \\ test".to_vec());
        assert_eq!(col.to_sql(&value).unwrap(), r"'it''s\na \\ test'");
        assert_eq!(col.to_json(&value).unwrap(), json!("it's\na \\ test"));
    }

    #[test]
    fn test_binary_is_encoded() {
        let col = def("varbinary", TypeAttributes::default());
        let value = ColumnValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(col.to_sql(&value).unwrap(), "x'deadbeef'");
        assert_eq!(col.to_json(&value).unwrap(), json!("3q2+7w=="));
    }

    #[test]
    fn test_latin1_and_utf16_decoding() {
        let latin1 = def("char", TypeAttributes::default().charset("latin1"));
        assert_eq!(
            latin1.to_json(&ColumnValue::Bytes(vec![0x63, 0x61, 0x66, 0xe9])).unwrap(),
            json!("café")
        );
        let ucs2 = def("char", TypeAttributes::default().charset("ucs2"));
        assert_eq!(
            ucs2.to_json(&ColumnValue::Bytes(vec![0x00, 0x68, 0x00, 0x69])).unwrap(),
            json!("hi")
        );
    }

    #[test]
    fn test_unknown_charset_is_rejected() {
        let col = def("char", TypeAttributes::default().charset("klingon"));
        let err = col.to_sql(&ColumnValue::Bytes(vec![1])).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedCharset { .. }));
    }

    #[test]
    fn test_datetime_fraction_is_truncated() {
        let col = def("datetime", TypeAttributes::default().length(3));
        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_micro_opt(13, 5, 9, 123_987)
            .unwrap();
        assert_eq!(
            col.to_sql(&ColumnValue::DateTime(dt)).unwrap(),
            "'2024-02-29 13:05:09.123'"
        );
        let plain = def("timestamp", TypeAttributes::default());
        assert_eq!(
            plain.to_json(&ColumnValue::DateTime(dt)).unwrap(),
            json!("2024-02-29 13:05:09")
        );
    }

    #[test]
    fn test_zero_date_passes_through() {
        let col = def("date", TypeAttributes::default());
        assert_eq!(
            col.to_sql(&ColumnValue::Text(String::from("0000-00-00"))).unwrap(),
            "'0000-00-00'"
        );
    }

    #[test]
    fn test_enum_and_set() {
        let color = def("enum", TypeAttributes::default().values(["red", "green"]));
        assert_eq!(color.to_json(&ColumnValue::Int(2)).unwrap(), json!("green"));
        assert_eq!(color.to_sql(&ColumnValue::Int(0)).unwrap(), "''");
        assert!(color.to_sql(&ColumnValue::Int(3)).is_err());

        let flags = def("set", TypeAttributes::default().values(["a", "b", "c"]));
        assert_eq!(flags.to_sql(&ColumnValue::Int(0b101)).unwrap(), "'a,c'");
        assert_eq!(flags.to_json(&ColumnValue::Int(0b101)).unwrap(), json!(["a", "c"]));
    }

    #[test]
    fn test_numeric_kinds() {
        let float = def("float", TypeAttributes::default());
        assert_eq!(float.to_sql(&ColumnValue::Float(1.5)).unwrap(), "1.5");
        assert_eq!(float.to_json(&ColumnValue::Float(1.5)).unwrap(), json!(1.5));

        let decimal = def("decimal", TypeAttributes::default());
        let value = ColumnValue::Decimal(String::from("12.50"));
        assert_eq!(decimal.to_sql(&value).unwrap(), "12.50");
        assert!(decimal.to_json(&value).unwrap().is_number());

        let bit = def("bit", TypeAttributes::default());
        assert_eq!(bit.to_sql(&ColumnValue::Bits(5)).unwrap(), "5");
    }

    #[test]
    fn test_json_column() {
        let col = def("json", TypeAttributes::default());
        let value = ColumnValue::Text(String::from(r#"{"k":[1,2]}"#));
        assert_eq!(col.to_json(&value).unwrap(), json!({"k": [1, 2]}));
        assert_eq!(col.to_sql(&value).unwrap(), r#"'{"k":[1,2]}'"#);
    }

    #[test]
    fn test_null_and_mismatch() {
        let col = def("int", TypeAttributes::default());
        assert_eq!(col.to_sql(&ColumnValue::Null).unwrap(), "NULL");
        assert_eq!(col.to_json(&ColumnValue::Null).unwrap(), JsonValue::Null);
        assert!(matches!(
            col.to_sql(&ColumnValue::Text(String::from("x"))),
            Err(SchemaError::InvalidValue { .. })
        ));
    }
}
