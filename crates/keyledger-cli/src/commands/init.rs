use std::path::PathBuf;

use keyledger_core::SqliteStore;
use tracing::info;

use crate::app::{resolve_config_path, AppContext};
use crate::cli::{Cli, InitArgs};
use crate::config::{default_db_path, write_config, KeyledgerConfig};

pub fn handle_init(ctx: &AppContext, cli: &Cli, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = match args.config_path.as_ref() {
        Some(path) => PathBuf::from(path),
        None => resolve_config_path()?,
    };
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}.\nHint: Pass --force to overwrite it.",
            config_path.display()
        ));
    }

    let db_path = match args.path.as_ref().or(cli.db.as_ref()) {
        Some(path) => PathBuf::from(path),
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("Failed to create data directory {}: {}", parent.display(), e)
        })?;
    }

    let store = SqliteStore::open(&db_path)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", db_path.display(), e))?;
    store.check_integrity()?;
    write_config(&config_path, &KeyledgerConfig::new(db_path.clone()))?;
    info!(db = %db_path.display(), config = %config_path.display(), "initialized keyledger");

    if !ctx.quiet() {
        println!("Initialized keyledger database at {}", db_path.display());
        println!("Config written to {}", config_path.display());
    }
    Ok(())
}
