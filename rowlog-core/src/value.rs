//! SQL scalar types and values as handed over by the host.
//!
//! Values of types the encoders treat specially are carried natively;
//! everything else arrives as its canonical text form in [`SqlValue::Other`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column type classification used for type-directed encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Bool,
    Int2,
    Int4,
    Int8,
    Date,
    Timestamp,
    TimestampTz,
    Text,
    /// Any type without a native mapping; values carry canonical text.
    Other,
}

/// A date/time value that may be one of the open-ended sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateTimeValue<T> {
    Finite(T),
    Infinity,
    NegInfinity,
}

/// One non-null column value. SQL NULL is represented as `None` in row images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Date(DateTimeValue<NaiveDate>),
    Timestamp(DateTimeValue<NaiveDateTime>),
    TimestampTz(DateTimeValue<DateTime<FixedOffset>>),
    Text(String),
    /// Canonical text form of a value whose type has no native mapping.
    Other(String),
}

impl SqlValue {
    /// The type classification this value belongs to.
    pub fn sql_type(&self) -> SqlType {
        match self {
            SqlValue::Bool(_) => SqlType::Bool,
            SqlValue::Int2(_) => SqlType::Int2,
            SqlValue::Int4(_) => SqlType::Int4,
            SqlValue::Int8(_) => SqlType::Int8,
            SqlValue::Date(_) => SqlType::Date,
            SqlValue::Timestamp(_) => SqlType::Timestamp,
            SqlValue::TimestampTz(_) => SqlType::TimestampTz,
            SqlValue::Text(_) => SqlType::Text,
            SqlValue::Other(_) => SqlType::Other,
        }
    }

    /// Canonical text form, as the host would print the value.
    ///
    /// Booleans print as `t`/`f`, date/time values in the host's
    /// space-separated style, open-ended sentinels as `infinity`/`-infinity`.
    pub fn canonical_text(&self) -> String {
        match self {
            SqlValue::Bool(true) => "t".to_string(),
            SqlValue::Bool(false) => "f".to_string(),
            SqlValue::Int2(n) => n.to_string(),
            SqlValue::Int4(n) => n.to_string(),
            SqlValue::Int8(n) => n.to_string(),
            SqlValue::Date(d) => match d {
                DateTimeValue::Finite(d) => d.format("%Y-%m-%d").to_string(),
                DateTimeValue::Infinity => "infinity".to_string(),
                DateTimeValue::NegInfinity => "-infinity".to_string(),
            },
            SqlValue::Timestamp(t) => match t {
                DateTimeValue::Finite(t) => t.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
                DateTimeValue::Infinity => "infinity".to_string(),
                DateTimeValue::NegInfinity => "-infinity".to_string(),
            },
            SqlValue::TimestampTz(t) => match t {
                DateTimeValue::Finite(t) => t.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(),
                DateTimeValue::Infinity => "infinity".to_string(),
                DateTimeValue::NegInfinity => "-infinity".to_string(),
            },
            SqlValue::Text(s) => s.clone(),
            SqlValue::Other(s) => s.clone(),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::Int2(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int4(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int8(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}
