//! Connection profile resolution from the process environment.

use super::types::ConnectionProfile;
use crate::core::Side;
use crate::error::{MigrateError, Result};

/// Environment variable names for one side.
struct EnvKeys {
    host: &'static str,
    port: &'static str,
    user: &'static str,
    password: &'static str,
    database: &'static str,
}

const SOURCE_KEYS: EnvKeys = EnvKeys {
    host: "SS_DATABASE_HOST_OLD_DB",
    port: "SS_DATABASE_PORT_OLD_DB",
    user: "SS_DATABASE_USERNAME_OLD_DB",
    password: "SS_DATABASE_PASSWORD_OLD_DB",
    database: "SS_DATABASE_NAME_OLD_DB",
};

const TARGET_KEYS: EnvKeys = EnvKeys {
    host: "SS_DATABASE_SERVER",
    port: "SS_DATABASE_PORT",
    user: "SS_DATABASE_USERNAME",
    password: "SS_DATABASE_PASSWORD",
    database: "SS_DATABASE_NAME",
};

fn keys(side: Side) -> &'static EnvKeys {
    match side {
        Side::Source => &SOURCE_KEYS,
        Side::Target => &TARGET_KEYS,
    }
}

/// Names of the variables consulted for `side`, for error messages.
pub fn variable_names(side: Side) -> [&'static str; 4] {
    let k = keys(side);
    [k.host, k.user, k.password, k.database]
}

impl ConnectionProfile {
    /// Fill empty fields from `lookup`; the host falls back to `localhost`.
    ///
    /// A port variable that is not a valid port number is a configuration
    /// error.
    pub fn fill_from<F>(&mut self, side: Side, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let k = keys(side);
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if self.host.is_empty() {
            self.host = get(k.host).unwrap_or_else(|| "localhost".to_string());
        }
        if self.port.is_none() {
            if let Some(port) = get(k.port) {
                let parsed = port.trim().parse::<u16>().map_err(|_| {
                    MigrateError::Config(format!("{} is not a valid port: {:?}", k.port, port))
                })?;
                self.port = Some(parsed);
            }
        }
        if self.user.is_empty() {
            self.user = get(k.user).unwrap_or_default();
        }
        if self.password.is_empty() {
            self.password = get(k.password).unwrap_or_default();
        }
        if self.database.is_empty() {
            self.database = get(k.database).unwrap_or_default();
        }
        Ok(())
    }

    /// True when host, user, password and database are all set.
    pub fn is_complete(&self) -> bool {
        !self.host.is_empty()
            && !self.user.is_empty()
            && !self.password.is_empty()
            && !self.database.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_source_profile_from_env() {
        let vars = env(&[
            ("SS_DATABASE_HOST_OLD_DB", "old.example"),
            ("SS_DATABASE_PORT_OLD_DB", "3307"),
            ("SS_DATABASE_USERNAME_OLD_DB", "legacy"),
            ("SS_DATABASE_PASSWORD_OLD_DB", "secret"),
            ("SS_DATABASE_NAME_OLD_DB", "legacy_db"),
        ]);
        let mut profile = ConnectionProfile::default();
        profile.fill_from(Side::Source, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(profile.host, "old.example");
        assert_eq!(profile.port(), 3307);
        assert_eq!(profile.user, "legacy");
        assert_eq!(profile.database, "legacy_db");
        assert!(profile.is_complete());
    }

    #[test]
    fn test_host_defaults_to_localhost() {
        let vars = env(&[("SS_DATABASE_USERNAME", "web")]);
        let mut profile = ConnectionProfile::default();
        profile.fill_from(Side::Target, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(profile.host, "localhost");
        assert_eq!(profile.port(), 3306);
        assert!(!profile.is_complete());
    }

    #[test]
    fn test_yaml_values_take_precedence() {
        let vars = env(&[("SS_DATABASE_NAME", "from_env")]);
        let mut profile = ConnectionProfile {
            database: "from_yaml".into(),
            ..Default::default()
        };
        profile.fill_from(Side::Target, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(profile.database, "from_yaml");
    }

    #[test]
    fn test_invalid_port_variable_is_config_error() {
        let vars = env(&[("SS_DATABASE_PORT_OLD_DB", "33o6")]);
        let mut profile = ConnectionProfile::default();
        let err = profile
            .fill_from(Side::Source, |k| vars.get(k).cloned())
            .unwrap_err();

        assert!(matches!(err, MigrateError::Config(_)));
        assert!(err.to_string().contains("SS_DATABASE_PORT_OLD_DB"));
        assert_eq!(profile.port, None);
    }

    #[test]
    fn test_yaml_port_ignores_port_variable() {
        let vars = env(&[("SS_DATABASE_PORT", "not-a-port")]);
        let mut profile = ConnectionProfile {
            port: Some(3310),
            ..Default::default()
        };
        profile.fill_from(Side::Target, |k| vars.get(k).cloned()).unwrap();
        assert_eq!(profile.port(), 3310);
    }

    #[test]
    fn test_sides_use_distinct_variables() {
        let vars = env(&[("SS_DATABASE_NAME_OLD_DB", "old")]);
        let mut target = ConnectionProfile::default();
        target.fill_from(Side::Target, |k| vars.get(k).cloned()).unwrap();
        assert!(target.database.is_empty());
    }

    #[test]
    fn test_target_reads_server_not_host_variables() {
        let vars = env(&[
            ("SS_DATABASE_HOST_", "wrong.example"),
            ("SS_DATABASE_USERNAME_", "wrong"),
            ("SS_DATABASE_SERVER", "new.example"),
            ("SS_DATABASE_USERNAME", "web"),
        ]);
        let mut target = ConnectionProfile::default();
        target.fill_from(Side::Target, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(target.host, "new.example");
        assert_eq!(target.user, "web");
    }
}
