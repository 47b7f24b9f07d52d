//! todo-store command line
//!
//! Opens the SQLite database, loads the task tree and group registry into
//! memory, runs one subcommand, and prints its result.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use todo_store::cli::{Cli, commands};
use todo_store::config::{ConfigLoader, ConfigPaths, EnvOverrides};
use todo_store::db::Database;
use todo_store::logging::{self, LogTarget};
use todo_store::store::TodoStore;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit --config wins over the environment variable and the tiers.
    let mut env = EnvOverrides::from_env();
    if let Some(config_path) = &cli.config {
        env.config_path = Some(config_path.clone());
    }
    let mut loader = ConfigLoader::load_with(ConfigPaths::discover(), env)?;

    let config = loader.config_mut();
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.clone();
    }
    if let Some(log) = &cli.log {
        config.logging.output = log.clone();
    }
    if cli.verbose {
        config.logging.verbose = true;
    }

    logging::init(
        &LogTarget::parse(&config.logging.output),
        config.logging.verbose,
    )?;
    for (tier, path) in loader.sources() {
        debug!(%tier, path = %path.display(), "loaded config");
    }
    let config = loader.into_config();

    let db = Database::open(&config.store.db_path)?;
    db.verify_schema()?;
    info!(path = %config.store.db_path.display(), "database ready");

    let store =
        TodoStore::new(Arc::new(db)).with_default_group_color(config.store.default_group_color);
    store.initialize().await?;

    let output = commands::execute(&store, cli.command, cli.format.into()).await?;
    print!("{}", output);

    Ok(())
}
