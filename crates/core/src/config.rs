//! Typing configuration
//!
//! Settings are read from `pipetype.toml` in a project root, or from the
//! `[package.metadata.pipetype]` table of its `Cargo.toml`, falling back to defaults.
//!
//! ```toml
//! check_production_types = true
//!
//! [log]
//! level = "pipetype_core=debug"
//! format = "json"
//! ```

use crate::errors::ConfigError;
use crate::logging::{LogConfig, LogFormat};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "pipetype.toml";
const MANIFEST_FILE: &str = "Cargo.toml";

/// Logging settings as written in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` or `info` when absent
    pub level: Option<String>,
    pub format: LogFormat,
}

impl LogSettings {
    /// Logging configuration for [`crate::logging::init`]
    pub fn to_log_config(&self) -> LogConfig {
        let config = LogConfig::new().with_format(self.format);
        match &self.level {
            Some(level) => config.with_env_filter(level.clone()),
            None => config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypingConfig {
    /// Validate production method annotations when classes are finalized
    pub check_production_types: bool,
    pub log: LogSettings,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self { check_production_types: true, log: LogSettings::default() }
    }
}

impl TypingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a `pipetype.toml`-style file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    /// Discover configuration in a project root
    ///
    /// Searches for configuration in the following order:
    /// 1. `pipetype.toml` in the root
    /// 2. `[package.metadata.pipetype]` in `Cargo.toml`
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let config_file = root.join(CONFIG_FILE);
        if config_file.exists() {
            tracing::info!("Loading configuration from {}", config_file.display());
            return Self::load(&config_file);
        }

        let manifest = root.join(MANIFEST_FILE);
        if manifest.exists() {
            let content =
                fs::read_to_string(&manifest).map_err(|source| ConfigError::Io { path: manifest.clone(), source })?;
            let table: toml::Table = toml::from_str(&content)?;
            let section = table
                .get("package")
                .and_then(|p| p.get("metadata"))
                .and_then(|m| m.get("pipetype"));
            if let Some(section) = section {
                tracing::info!("Loading configuration from [package.metadata.pipetype] in {}", manifest.display());
                return Ok(section.clone().try_into()?);
            }
        }

        tracing::debug!("No pipetype.toml or Cargo.toml metadata found, using defaults");
        Ok(Self::default())
    }
}
