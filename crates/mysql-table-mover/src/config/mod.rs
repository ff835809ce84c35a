//! Configuration loading and validation.

mod env;
mod types;
mod validation;

pub use env::variable_names;
pub use types::*;

use crate::core::Side;
use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file, filling connection
    /// parameters from the process environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::from_yaml_with(yaml, |key| std::env::var(key).ok())
    }

    /// Parse configuration using `lookup` in place of the process environment.
    pub fn from_yaml_with<F>(yaml: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        config.source.fill_from(Side::Source, &lookup)?;
        config.target.fill_from(Side::Target, &lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}
