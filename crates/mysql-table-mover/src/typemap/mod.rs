//! Declared column type to bind category mapping.

use serde::{Deserialize, Serialize};

/// Primitive parameter kind used when binding a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindCategory {
    Integer,
    Float,
    Binary,
    Text,
}

impl BindCategory {
    /// Map a declared type string such as `int(11) unsigned` or
    /// `decimal(9,2)` to its bind category.
    ///
    /// Case-insensitive substring match with a fixed priority:
    /// `int`, then `float`/`double`/`decimal`, then `blob`/`binary`,
    /// then text. Existing target schemas rely on this exact order.
    pub fn for_type(type_str: &str) -> Self {
        let t = type_str.to_ascii_lowercase();

        if t.contains("int") {
            BindCategory::Integer
        } else if t.contains("float") || t.contains("double") || t.contains("decimal") {
            BindCategory::Float
        } else if t.contains("blob") || t.contains("binary") {
            BindCategory::Binary
        } else {
            BindCategory::Text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_types() {
        for t in ["int(11)", "TINYINT(1) UNSIGNED", "bigint", "mediumint(8)", "smallint"] {
            assert_eq!(BindCategory::for_type(t), BindCategory::Integer, "{}", t);
        }
    }

    #[test]
    fn test_float_types() {
        for t in ["float", "double", "decimal(9,2)", "DOUBLE PRECISION"] {
            assert_eq!(BindCategory::for_type(t), BindCategory::Float, "{}", t);
        }
    }

    #[test]
    fn test_binary_types() {
        for t in ["blob", "longblob", "varbinary(16)", "binary(16)"] {
            assert_eq!(BindCategory::for_type(t), BindCategory::Binary, "{}", t);
        }
    }

    #[test]
    fn test_text_fallback() {
        for t in ["varchar(255)", "mediumtext", "datetime", "enum('a','b')", ""] {
            assert_eq!(BindCategory::for_type(t), BindCategory::Text, "{}", t);
        }
    }

    #[test]
    fn test_priority_when_several_substrings_match() {
        // "point" contains "int"; integer wins over everything below it.
        assert_eq!(BindCategory::for_type("point"), BindCategory::Integer);
        assert_eq!(BindCategory::for_type("int_blob"), BindCategory::Integer);
        assert_eq!(BindCategory::for_type("double_binary"), BindCategory::Float);
    }

    #[test]
    fn test_enum_members_take_part_in_matching() {
        // Type strings are matched as a whole, members included.
        assert_eq!(BindCategory::for_type("enum('Print','Draft')"), BindCategory::Integer);
    }
}
