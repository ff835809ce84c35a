//! Configuration validation.

use super::{variable_names, Config};
use crate::core::Side;
use crate::error::{MigrateError, Result};
use tracing::warn;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    for side in [Side::Source, Side::Target] {
        if !config.profile(side).is_complete() {
            return Err(MigrateError::Config(format!(
                "Please provide all the required database configurations for the {} database: {}",
                side,
                variable_names(side).join(", ")
            )));
        }
    }

    // Cannot migrate to the same database
    if config.source.host == config.target.host
        && config.source.port() == config.target.port()
        && config.source.database == config.target.database
    {
        return Err(MigrateError::Config(
            "source and target cannot be the same database".into(),
        ));
    }

    let migration = &config.migration;

    if migration.class_name_column.is_empty() {
        return Err(MigrateError::Config(
            "migration.class_name_column cannot be empty".into(),
        ));
    }

    if migration
        .character_replacements
        .iter()
        .any(|r| r.search.is_empty())
    {
        return Err(MigrateError::Config(
            "migration.character_replacements: search string cannot be empty".into(),
        ));
    }

    // Both lists are legal together; policy_for decides by the global default.
    for table in migration
        .always_update
        .iter()
        .filter(|t| migration.always_replace.contains(t))
    {
        warn!(
            "table {} is listed in both always_update and always_replace, using {} mode",
            table,
            migration.policy_for(table).mode_name()
        );
    }

    if let Some(0) = migration.table_timeout_secs {
        return Err(MigrateError::Config(
            "migration.table_timeout_secs must be at least 1".into(),
        ));
    }

    Ok(())
}
