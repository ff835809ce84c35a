//! Per-field value repair applied between read and write.
//!
//! Order per field: class-name remap, enum repair, character substitution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{CharReplacement, MigrationConfig};
use crate::core::{EnumConstraint, SqlValue};

/// Counters for the changes made to one table's rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformStats {
    /// Class names replaced through the rename map.
    pub renamed: u64,
    /// Values replaced by the first enum member.
    pub enum_repairs: u64,
}

/// Value transformer for one table.
#[derive(Debug, Clone)]
pub struct ValueTransformer<'a> {
    table: &'a str,
    class_column: &'a str,
    renames: &'a BTreeMap<String, String>,
    replacements: &'a [CharReplacement],
    enum_constraint: EnumConstraint,
}

impl<'a> ValueTransformer<'a> {
    pub fn new(
        table: &'a str,
        config: &'a MigrationConfig,
        enum_constraint: EnumConstraint,
    ) -> Self {
        Self {
            table,
            class_column: &config.class_name_column,
            renames: &config.class_renames,
            replacements: &config.character_replacements,
            enum_constraint,
        }
    }

    /// Transform the value of `column`.
    pub fn transform(&self, column: &str, value: SqlValue, stats: &mut TransformStats) -> SqlValue {
        let mut value = value;

        if column == self.class_column {
            value = self.remap_class(value, stats);
            value = self.repair_enum(value, stats);
        }

        self.substitute(value)
    }

    fn remap_class(&self, value: SqlValue, stats: &mut TransformStats) -> SqlValue {
        if let SqlValue::Text(name) = &value {
            if let Some(new_name) = self.renames.get(name) {
                stats.renamed += 1;
                return SqlValue::Text(new_name.clone());
            }
        }
        value
    }

    /// Replace a value outside the enum with the enum's first member.
    fn repair_enum(&self, value: SqlValue, stats: &mut TransformStats) -> SqlValue {
        let Some(first) = self.enum_constraint.first() else {
            return value;
        };
        // NULL and non-text values are left to the column's own constraints.
        let is_member = match value.as_text() {
            Some(text) => self.enum_constraint.iter().any(|allowed| *allowed == *text),
            None => true,
        };
        if is_member {
            return value;
        }

        warn!(
            "{}.{}: value '{}' is not one of [{}], using '{}'",
            self.table,
            self.class_column,
            value.as_text().unwrap_or_default(),
            self.enum_constraint.join(", "),
            first
        );
        stats.enum_repairs += 1;
        SqlValue::Text(first.clone())
    }

    fn substitute(&self, value: SqlValue) -> SqlValue {
        match value {
            SqlValue::Text(mut s) => {
                for r in self.replacements {
                    if s.contains(&r.search) {
                        s = s.replace(&r.search, &r.replace);
                    }
                }
                SqlValue::Text(s)
            }
            other => other,
        }
    }
}
