//! Application configuration: built-in defaults, then an optional YAML file named by
//! `CALCIOTTO_CONFIG`, then individual environment overrides.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::variants::GenerationConfig;

pub const CONFIG_ENV: &str = "CALCIOTTO_CONFIG";
pub const BIND_ENV: &str = "CALCIOTTO_BIND";
pub const STORE_ENV: &str = "CALCIOTTO_STORE";
pub const LOG_ENV: &str = "CALCIOTTO_LOG";
pub const LOG_JSON_ENV: &str = "CALCIOTTO_LOG_JSON";

const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    /// JSON snapshot file. Without one, state lives in memory only.
    pub store_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub generation: GenerationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            store_path: None,
            logging: LoggingConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file on disk. Missing keys keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        let cfg: AppConfig =
            serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                source,
                path: path.to_path_buf(),
            })?;
        Ok(cfg)
    }

    /// Resolves the process configuration from the real environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::resolve(&vars)
    }

    /// Same as [AppConfig::from_env] over an explicit variable map.
    pub fn resolve(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut cfg = match non_empty(vars, CONFIG_ENV) {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        cfg.apply_overrides(vars)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(bind) = non_empty(vars, BIND_ENV) {
            self.bind = bind.to_string();
        }
        if let Some(path) = non_empty(vars, STORE_ENV) {
            self.store_path = Some(PathBuf::from(path));
        }
        if let Some(level) = non_empty(vars, LOG_ENV) {
            self.logging.level = level.to_string();
        }
        if let Some(raw) = non_empty(vars, LOG_JSON_ENV) {
            self.logging.json = parse_flag(raw).ok_or_else(|| ConfigError::Invalid {
                field: LOG_JSON_ENV.to_string(),
                message: format!("expected true/false, got '{raw}'"),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "bind".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.logging.level().is_none() {
            return Err(ConfigError::Invalid {
                field: "logging.level".to_string(),
                message: format!("unknown level '{}'", self.logging.level),
            });
        }
        if self.generation.runs == 0 {
            return Err(ConfigError::Invalid {
                field: "generation.runs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Option<Level> {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
