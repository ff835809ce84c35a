//! Schema shape types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which of the two configured databases a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

/// Ordered column names of one table on one side.
pub type ColumnSet = Vec<String>;

/// Column name to declared type string, e.g. `int(11) unsigned`.
pub type ColumnTypeMap = HashMap<String, String>;

/// Values permitted by an enum column, in declaration order.
///
/// Empty when the column is not enum-typed.
pub type EnumConstraint = Vec<String>;

/// Parse the members of an `enum('a','b',...)` type declaration.
///
/// Returns an empty list for any other type string. Quotes doubled inside a
/// literal and backslash escapes are unescaped.
pub fn parse_enum_values(type_str: &str) -> EnumConstraint {
    let trimmed = type_str.trim();
    let lower = trimmed.to_ascii_lowercase();
    if !lower.starts_with("enum(") || !trimmed.ends_with(')') {
        return Vec::new();
    }

    let body = &trimmed[5..trimmed.len() - 1];
    let mut values = Vec::new();
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\'' {
            // separators and whitespace between literals
            continue;
        }

        let mut value = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\'' if chars.peek() == Some(&'\'') => {
                    chars.next();
                    value.push('\'');
                }
                '\'' => break,
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                }
                other => value.push(other),
            }
        }
        values.push(value);
    }

    values
}
