//! Adapter synthesis configuration

use crate::error::{DuckError, DuckResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Namespace prefixed to synthesised adapter type names.
pub const DEFAULT_NAMESPACE: &str = "Dynamic.Ducks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuckConfig {
    /// Prefix of synthesised type names
    pub namespace: String,
    /// Use qualified base and interface names in synthesised type names.
    /// Display only: cache identity never depends on names.
    pub qualified_names: bool,
    /// Log a warning when a synthesised type has unsatisfied members
    pub warn_on_partial: bool,
}

impl Default for DuckConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            qualified_names: false,
            warn_on_partial: true,
        }
    }
}

impl DuckConfig {
    pub fn from_toml_str(content: &str) -> DuckResult<Self> {
        toml::from_str(content).map_err(|e| DuckError::Config(e.to_string()))
    }

    /// Create a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> DuckResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DuckError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Overrides defaults from `DUCKTYPE_NAMESPACE`, `DUCKTYPE_QUALIFIED_NAMES`
    /// and `DUCKTYPE_WARN_ON_PARTIAL`.
    pub fn from_env() -> DuckResult<Self> {
        let mut config = DuckConfig::default();

        if let Ok(namespace) = std::env::var("DUCKTYPE_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Ok(flag) = std::env::var("DUCKTYPE_QUALIFIED_NAMES") {
            config.qualified_names = parse_flag("DUCKTYPE_QUALIFIED_NAMES", &flag)?;
        }
        if let Ok(flag) = std::env::var("DUCKTYPE_WARN_ON_PARTIAL") {
            config.warn_on_partial = parse_flag("DUCKTYPE_WARN_ON_PARTIAL", &flag)?;
        }

        Ok(config)
    }

    pub fn to_toml_string(&self) -> DuckResult<String> {
        toml::to_string_pretty(self).map_err(|e| DuckError::Config(e.to_string()))
    }
}

fn parse_flag(var: &str, value: &str) -> DuckResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DuckError::Config(format!(
            "{} must be a boolean, got '{}'",
            var, other
        ))),
    }
}
