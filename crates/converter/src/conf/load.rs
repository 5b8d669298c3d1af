//! Load — config loading from file and environment variables.

use std::fs;
use std::path::Path;

use super::model::{ConfigError, ConverterConfig};

const DEFAULT_CONFIG_PATH: &str = "converter.toml";

impl ConverterConfig {
    /// Load configuration from file and environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("CONVERTER_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Override settings from environment-style lookups. Unparseable values
    /// are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(table) = lookup("CONVERTER_TABLE") {
            self.table = table;
        }
        if let Some(timeout) = lookup("CONVERTER_BUSY_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            self.busy_timeout_ms = timeout;
        }
        if let Some(filter) = lookup("CONVERTER_LOG_FILTER") {
            self.log_filter = filter;
        }
        if let Some(format) = lookup("CONVERTER_LOG_FORMAT").and_then(|s| s.parse().ok()) {
            self.log_format = format;
        }
    }
}
