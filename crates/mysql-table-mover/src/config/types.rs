//! Configuration type definitions.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::Side;

/// Root configuration structure.
///
/// Loaded once per run and passed by reference to every component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source database (read only).
    #[serde(default)]
    pub source: ConnectionProfile,

    /// Target database (the only side ever mutated).
    #[serde(default)]
    pub target: ConnectionProfile,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

impl Config {
    /// Connection profile for one side.
    pub fn profile(&self, side: Side) -> &ConnectionProfile {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }
}

/// Connection parameters for one side.
///
/// Empty fields are filled from the process environment during loading.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionProfile {
    /// Database host.
    #[serde(default)]
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name.
    #[serde(default)]
    pub database: String,

    /// Username.
    #[serde(default)]
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl ConnectionProfile {
    /// Effective port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_MYSQL_PORT)
    }
}

pub(crate) const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Mapping of one logical entity to its tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityTables {
    /// Base table name of the entity.
    pub table: String,

    /// Ancestor tables, root first.
    #[serde(default)]
    pub ancestors: Vec<String>,

    /// Entity keeps `_Live` and `_Versions` side tables.
    #[serde(default)]
    pub versioned: bool,
}

/// One literal search/replace pair applied to text values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharReplacement {
    pub search: String,
    pub replace: String,
}

/// What to do when a configured table does not exist on the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSourcePolicy {
    /// Raise a schema error for the table.
    #[default]
    Error,

    /// Log a warning and report the table as missing.
    Warn,
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Logical entity identifiers to migrate.
    #[serde(default)]
    pub entities: Vec<String>,

    /// Explicit table names to migrate after the entities.
    #[serde(default)]
    pub tables: Vec<String>,

    /// Entity id to table mapping.
    #[serde(default)]
    pub entity_tables: HashMap<String, EntityTables>,

    /// Per-table columns that are never copied.
    #[serde(default)]
    pub fields_to_skip: HashMap<String, Vec<String>>,

    /// Tables that are never touched.
    #[serde(default)]
    pub tables_to_skip: Vec<String>,

    /// Old class name to new class name.
    #[serde(default)]
    pub class_renames: BTreeMap<String, String>,

    /// Ordered literal substitutions applied to every text value.
    #[serde(default)]
    pub character_replacements: Vec<CharReplacement>,

    /// Global default: upsert by primary key instead of truncate + insert.
    #[serde(default)]
    pub update_rather_than_replace: bool,

    /// Tables that upsert even when the global default is replace.
    #[serde(default)]
    pub always_update: Vec<String>,

    /// Tables that truncate + insert even when the global default is update.
    #[serde(default)]
    pub always_replace: Vec<String>,

    /// Column holding the class identity of a row.
    #[serde(default = "default_class_name_column")]
    pub class_name_column: String,

    /// Behaviour for tables missing on the source.
    #[serde(default)]
    pub missing_source: MissingSourcePolicy,

    /// Keep migrating the remaining tables after a table fails.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Compare row counts after each migrated table.
    #[serde(default)]
    pub verify_after_migrate: bool,

    /// Deadline for a single table's migration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_timeout_secs: Option<u64>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            tables: Vec::new(),
            entity_tables: HashMap::new(),
            fields_to_skip: HashMap::new(),
            tables_to_skip: Vec::new(),
            class_renames: BTreeMap::new(),
            character_replacements: Vec::new(),
            update_rather_than_replace: false,
            always_update: Vec::new(),
            always_replace: Vec::new(),
            class_name_column: default_class_name_column(),
            missing_source: MissingSourcePolicy::default(),
            continue_on_error: false,
            verify_after_migrate: false,
            table_timeout_secs: None,
        }
    }
}

impl MigrationConfig {
    /// Resolve the policy for one table.
    ///
    /// `always_replace` overrides an update default; `always_update` only
    /// matters when the default is replace.
    pub fn policy_for(&self, table: &str) -> MigrationPolicy {
        let listed = |list: &[String]| list.iter().any(|t| t == table);

        let update_rather_than_replace = if self.update_rather_than_replace {
            !listed(&self.always_replace)
        } else {
            listed(&self.always_update)
        };

        MigrationPolicy {
            skip: listed(&self.tables_to_skip),
            update_rather_than_replace,
        }
    }

    /// Columns never copied for `table`.
    pub fn skip_list(&self, table: &str) -> &[String] {
        self.fields_to_skip
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Resolved per-table policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPolicy {
    pub skip: bool,
    pub update_rather_than_replace: bool,
}

impl MigrationPolicy {
    pub fn mode_name(&self) -> &'static str {
        match (self.skip, self.update_rather_than_replace) {
            (true, _) => "skip",
            (false, true) => "update",
            (false, false) => "replace",
        }
    }
}

fn default_class_name_column() -> String {
    "ClassName".to_string()
}
