//! Configuration types and structures.

use crate::types::DEFAULT_GROUP_COLOR;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Task store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Color for groups created without one.
    #[serde(default = "default_group_color")]
    pub default_group_color: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_group_color: default_group_color(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Where log lines go: off, stdout, stderr, or a file path.
    #[serde(default = "default_log_output")]
    pub output: String,

    /// Log at debug level instead of info.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            output: default_log_output(),
            verbose: false,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("todo-store").join("todos.db"))
        .unwrap_or_else(|| PathBuf::from("todos.db"))
}

fn default_group_color() -> String {
    DEFAULT_GROUP_COLOR.to_string()
}

fn default_log_output() -> String {
    "stderr".to_string()
}

impl Config {
    /// Load configuration from a single YAML file. An empty file yields the
    /// defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Option<Config> = serde_yaml::from_str(&content)?;
        Ok(config.unwrap_or_default())
    }
}
