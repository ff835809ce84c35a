//! Logical entity to table name resolution.

use std::collections::HashMap;

use crate::config::EntityTables;
use crate::error::{MigrateError, Result};

/// Suffixes of the side tables kept for versioned entities.
const VERSIONED_SUFFIXES: [&str; 2] = ["Live", "Versions"];

/// Maps an entity identifier to the tables holding its rows.
pub trait EntityResolver: Send + Sync {
    /// Ordered tables for `entity`, auxiliary tables included.
    fn tables_for_entity(&self, entity: &str) -> Result<Vec<String>>;
}

/// Resolver backed by the `entity_tables` configuration map.
///
/// Each ancestor table comes first (root first), then the entity's own
/// table; versioned entities add `<table>_Live` and `<table>_Versions`
/// after every table.
pub struct ConfigEntityResolver<'a> {
    entities: &'a HashMap<String, EntityTables>,
}

impl<'a> ConfigEntityResolver<'a> {
    pub fn new(entities: &'a HashMap<String, EntityTables>) -> Self {
        Self { entities }
    }
}

impl EntityResolver for ConfigEntityResolver<'_> {
    fn tables_for_entity(&self, entity: &str) -> Result<Vec<String>> {
        let mapping = self.entities.get(entity).ok_or_else(|| {
            MigrateError::Config(format!(
                "no table mapping for entity {} (add it to migration.entity_tables)",
                entity
            ))
        })?;

        let mut tables = Vec::new();
        for base in mapping.ancestors.iter().chain(std::iter::once(&mapping.table)) {
            tables.push(base.clone());
            if mapping.versioned {
                tables.extend(VERSIONED_SUFFIXES.iter().map(|s| format!("{}_{}", base, s)));
            }
        }
        Ok(tables)
    }
}

/// Remove repeated names, keeping the first occurrence.
pub fn dedup_tables(tables: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tables
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
