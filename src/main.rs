use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use repcycle::config::{self, Config};
use repcycle::db::open;
use repcycle::logging;
use repcycle::store::SqliteStore;
use repcycle::types::OutputFmt;
use tracing::debug;

mod cli;
mod commands;

/// Open the store and resolve this install's user id.
async fn connect(cfg: &mut Config, config_path: &Path) -> Result<(SqliteStore, String)> {
    let user_id = cfg.ensure_user_id(config_path)?;
    let db_path = cfg.db_path();
    debug!(db_path, %user_id, "opening store");
    Ok((SqliteStore::new(open(db_path).await?), user_id))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let fmt = OutputFmt::from_flag(cli.json);

    let config_path = config::default_path()?;
    let mut cfg = Config::load(&config_path)?;

    match cli.cmd {
        Commands::Config(cmd) => commands::config::handle(cmd, cfg, &config_path, fmt)?,
        Commands::Workout(cmd) => {
            let (store, user_id) = connect(&mut cfg, &config_path).await?;
            commands::workout::handle(cmd, &store, &cfg, &user_id, fmt).await?
        }
        Commands::Train { offline } => {
            let (store, user_id) = connect(&mut cfg, &config_path).await?;
            commands::train::handle(store, &cfg, &user_id, offline).await?
        }
        Commands::Status => {
            let (store, user_id) = connect(&mut cfg, &config_path).await?;
            commands::status::handle(&store, &user_id, fmt).await?
        }
        Commands::Profile(cmd) => {
            let (store, user_id) = connect(&mut cfg, &config_path).await?;
            commands::profile::handle(cmd, &store, &user_id, fmt).await?
        }
        Commands::Nutrition(cmd) => {
            let (store, user_id) = connect(&mut cfg, &config_path).await?;
            commands::nutrition::handle(cmd, &store, &user_id, fmt).await?
        }
        Commands::Export { path } => {
            let (store, user_id) = connect(&mut cfg, &config_path).await?;
            commands::export::handle(path, &store, &user_id, fmt).await?
        }
    }

    Ok(())
}
