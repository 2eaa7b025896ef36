//! Binlog wire types and the column kinds that accept them.

use super::{ColumnDef, ColumnKind, EnumKind};

/// Column type codes as they appear in a binlog table map event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Decimal = 0,
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    LongLong = 8,
    Int24 = 9,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Year = 13,
    NewDate = 14,
    Varchar = 15,
    Bit = 16,
    Timestamp2 = 17,
    DateTime2 = 18,
    Time2 = 19,
    Json = 245,
    NewDecimal = 246,
    Enum = 247,
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

impl WireType {
    /// Maps a type code. Unknown codes return `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Decimal,
            1 => Self::Tiny,
            2 => Self::Short,
            3 => Self::Long,
            4 => Self::Float,
            5 => Self::Double,
            6 => Self::Null,
            7 => Self::Timestamp,
            8 => Self::LongLong,
            9 => Self::Int24,
            10 => Self::Date,
            11 => Self::Time,
            12 => Self::DateTime,
            13 => Self::Year,
            14 => Self::NewDate,
            15 => Self::Varchar,
            16 => Self::Bit,
            17 => Self::Timestamp2,
            18 => Self::DateTime2,
            19 => Self::Time2,
            245 => Self::Json,
            246 => Self::NewDecimal,
            247 => Self::Enum,
            248 => Self::Set,
            249 => Self::TinyBlob,
            250 => Self::MediumBlob,
            251 => Self::LongBlob,
            252 => Self::Blob,
            253 => Self::VarString,
            254 => Self::String,
            255 => Self::Geometry,
            _ => return None,
        })
    }

    /// The numeric type code.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    const fn is_blob(self) -> bool {
        matches!(
            self,
            Self::TinyBlob | Self::MediumBlob | Self::LongBlob | Self::Blob
        )
    }
}

impl ColumnDef {
    /// Returns true if a binlog column of type `wire` can belong to this
    /// column. A mismatch means the tracked schema is stale.
    #[must_use]
    pub fn matches(&self, wire: WireType) -> bool {
        match &self.kind {
            ColumnKind::Int { bits, .. } => matches!(
                (bits, wire),
                (8, WireType::Tiny)
                    | (16, WireType::Short)
                    | (24, WireType::Int24)
                    | (32, WireType::Long)
            ),
            ColumnKind::BigInt { .. } => wire == WireType::LongLong,
            ColumnKind::String { .. } => {
                matches!(
                    wire,
                    WireType::Varchar | WireType::VarString | WireType::String
                ) || wire.is_blob()
            }
            ColumnKind::Float { double: false } => wire == WireType::Float,
            ColumnKind::Float { double: true } => wire == WireType::Double,
            ColumnKind::Decimal => matches!(wire, WireType::Decimal | WireType::NewDecimal),
            ColumnKind::DateTime { .. } if self.type_name == "timestamp" => {
                matches!(wire, WireType::Timestamp | WireType::Timestamp2)
            }
            ColumnKind::DateTime { .. } => {
                matches!(wire, WireType::DateTime | WireType::DateTime2)
            }
            ColumnKind::Date => matches!(wire, WireType::Date | WireType::NewDate),
            ColumnKind::Time { .. } => matches!(wire, WireType::Time | WireType::Time2),
            ColumnKind::Year => wire == WireType::Year,
            ColumnKind::Bit => wire == WireType::Bit,
            ColumnKind::Enumerated {
                kind: EnumKind::Enum,
                ..
            } => matches!(wire, WireType::Enum | WireType::String),
            ColumnKind::Enumerated {
                kind: EnumKind::Set,
                ..
            } => matches!(wire, WireType::Set | WireType::String),
            ColumnKind::Geometry => wire == WireType::Geometry,
            ColumnKind::Json => wire == WireType::Json,
        }
    }
}
