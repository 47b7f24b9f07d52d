//! Configuration loader with tier-based merging.
//!
//! Tiers, lowest to highest: embedded defaults, project
//! (`./todo-store/config.yaml`), user (`~/.todo-store/config.yaml`), then
//! environment variables. YAML mappings merge key by key; any other value
//! from a higher tier replaces the lower one.

use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Explicit config file; skips tier merging entirely.
pub const ENV_CONFIG_PATH: &str = "TODO_STORE_CONFIG_PATH";
/// Database path override.
pub const ENV_DB_PATH: &str = "TODO_STORE_DB_PATH";
/// Project config directory (default `./todo-store`).
pub const ENV_PROJECT_DIR: &str = "TODO_STORE_PROJECT_DIR";
/// User config directory (default `~/.todo-store`).
pub const ENV_USER_DIR: &str = "TODO_STORE_USER_DIR";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration directories from environment and defaults.
    pub fn discover() -> Self {
        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("todo-store")));

        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".todo-store")));

        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Environment-tier values, captured once so loading stays testable.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub config_path: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            config_path: std::env::var_os(ENV_CONFIG_PATH).map(PathBuf::from),
            db_path: std::env::var_os(ENV_DB_PATH).map(PathBuf::from),
        }
    }
}

/// Merged configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Files that contributed, with their tier.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load with explicit tier directories and environment values.
    pub fn load_with(paths: ConfigPaths, env: EnvOverrides) -> Result<Self> {
        let mut sources = Vec::new();

        let mut config = if let Some(path) = &env.config_path {
            sources.push((ConfigTier::Environment, path.clone()));
            Config::load(path).with_context(|| format!("reading config {}", path.display()))?
        } else {
            let mut merged = serde_json::to_value(Config::default())?;
            let tiers = [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ];
            for (tier, dir) in tiers {
                let Some(file) = dir.map(|d| d.join(CONFIG_FILE)) else {
                    continue;
                };
                if let Some(overlay) = read_tier(&file, tier) {
                    merge_into(&mut merged, overlay);
                    sources.push((tier, file));
                }
            }
            serde_json::from_value(merged).context("merged configuration is invalid")?
        };

        if let Some(db_path) = env.db_path {
            config.store.db_path = db_path;
        }

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Files that contributed to the configuration, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read one tier's file. A missing file is silent; an unreadable or
/// malformed one is skipped with a warning.
fn read_tier(file: &Path, tier: ConfigTier) -> Option<Value> {
    if !file.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(file)
        .map_err(anyhow::Error::from)
        .and_then(|content| Ok(serde_yaml::from_str::<Value>(&content)?));
    match parsed {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%tier, file = %file.display(), error = %err, "ignoring unreadable config file");
            None
        }
    }
}

/// Merge `overlay` into `base`. Mappings merge per key; null keeps the base
/// value; anything else replaces it.
fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}
