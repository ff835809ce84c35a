//! Row values as read from the source and as bound on the target.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::typemap::BindCategory;

/// An opaque scalar read from the source database.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Valid UTF-8 text.
    Text(String),
    /// Bytes that are not valid UTF-8.
    Bytes(Vec<u8>),
}

impl SqlValue {
    /// Text form of the value, `None` for NULL and non-UTF-8 bytes.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            SqlValue::Null | SqlValue::Bytes(_) => None,
            SqlValue::Int(v) => Some(Cow::Owned(v.to_string())),
            SqlValue::UInt(v) => Some(Cow::Owned(v.to_string())),
            SqlValue::Float(v) => Some(Cow::Owned(v.to_string())),
            SqlValue::Text(s) => Some(Cow::Borrowed(s)),
        }
    }

    /// Build from raw bytes, keeping text when the bytes are UTF-8.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(s) => SqlValue::Text(s),
            Err(e) => SqlValue::Bytes(e.into_bytes()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

/// One source row: column name to value.
///
/// A projected column absent from the map reads as NULL.
pub type Row = HashMap<String, SqlValue>;

/// A value typed for a parameterized statement.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Binary(Vec<u8>),
    Text(String),
}

impl BindValue {
    /// Convert a source value for a column of the given bind category.
    ///
    /// Strings that do not parse as the category's number type are passed
    /// through as text and left to the server's own conversion.
    pub fn bind(value: SqlValue, category: BindCategory) -> Self {
        match (category, value) {
            (_, SqlValue::Null) => BindValue::Null,

            (BindCategory::Integer, SqlValue::Int(v)) => BindValue::Int(v),
            (BindCategory::Integer, SqlValue::UInt(v)) => BindValue::UInt(v),
            (BindCategory::Integer, SqlValue::Float(v)) => BindValue::Float(v),
            (BindCategory::Integer, SqlValue::Text(s)) => {
                let t = s.trim();
                if let Ok(v) = t.parse::<i64>() {
                    BindValue::Int(v)
                } else if let Ok(v) = t.parse::<u64>() {
                    BindValue::UInt(v)
                } else {
                    BindValue::Text(s)
                }
            }

            (BindCategory::Float, SqlValue::Int(v)) => BindValue::Float(v as f64),
            (BindCategory::Float, SqlValue::UInt(v)) => BindValue::Float(v as f64),
            (BindCategory::Float, SqlValue::Float(v)) => BindValue::Float(v),
            (BindCategory::Float, SqlValue::Text(s)) => {
                // Keep the literal when f64 would lose digits (DECIMAL columns).
                match s.trim().parse::<f64>() {
                    Ok(v) if v.to_string() == s.trim() => BindValue::Float(v),
                    _ => BindValue::Text(s),
                }
            }

            (BindCategory::Binary, SqlValue::Text(s)) => BindValue::Binary(s.into_bytes()),
            (_, SqlValue::Bytes(b)) => BindValue::Binary(b),
            (BindCategory::Binary, other) => BindValue::Binary(
                other
                    .as_text()
                    .map(|t| t.into_owned().into_bytes())
                    .unwrap_or_default(),
            ),

            (BindCategory::Text, SqlValue::Text(s)) => BindValue::Text(s),
            (BindCategory::Text, other) => match other.as_text() {
                Some(t) => BindValue::Text(t.into_owned()),
                None => BindValue::Null,
            },
        }
    }
}

impl From<BindValue> for mysql_async::Value {
    fn from(value: BindValue) -> Self {
        match value {
            BindValue::Null => mysql_async::Value::NULL,
            BindValue::Int(v) => mysql_async::Value::Int(v),
            BindValue::UInt(v) => mysql_async::Value::UInt(v),
            BindValue::Float(v) => mysql_async::Value::Double(v),
            BindValue::Binary(b) => mysql_async::Value::Bytes(b),
            BindValue::Text(s) => mysql_async::Value::Bytes(s.into_bytes()),
        }
    }
}
