//! Model — ConverterConfig and related types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::sqlite::is_table_name;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Destination table; created by the conversion, never reused.
    pub table: String,
    pub busy_timeout_ms: u64,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            table: "entries".to_string(),
            busy_timeout_ms: 5000,
            log_filter: "converter=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ConverterConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.table.is_empty() {
            return Err("table must not be empty".to_string());
        }
        if !is_table_name(&self.table) {
            return Err(format!(
                "table must be a plain identifier (letters, digits, '_'): {:?}",
                self.table
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err("busy_timeout_ms must be > 0".to_string());
        }
        Ok(())
    }
}
