//! Layered configuration.
//!
//! Consolidates configuration from tiers with field-by-field YAML merging:
//! 1. **Defaults** - compiled in
//! 2. **Project** - `$CWD/todo-store/config.yaml`
//! 3. **User** - `~/.todo-store/config.yaml`
//! 4. **Environment** - see below
//!
//! ## Environment Variables
//! - `TODO_STORE_CONFIG_PATH` - Explicit config file (overrides all tiers)
//! - `TODO_STORE_DB_PATH` - Database path
//! - `TODO_STORE_PROJECT_DIR` - Project config dir (default: `./todo-store`)
//! - `TODO_STORE_USER_DIR` - User config dir (default: `~/.todo-store`)

mod loader;
mod types;

pub use loader::{
    ConfigLoader, ConfigPaths, ConfigTier, ENV_CONFIG_PATH, ENV_DB_PATH, ENV_PROJECT_DIR,
    ENV_USER_DIR, EnvOverrides,
};
pub use types::*;
