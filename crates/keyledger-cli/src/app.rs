//! Application context for the Keyledger CLI.
//!
//! Resolves the config file and database path, and opens the repository.

use std::path::{Path, PathBuf};

use keyledger_core::{LedgerRepository, SqliteStore};
use once_cell::unsync::OnceCell;

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, KeyledgerConfig};

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("KEYLEDGER_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

pub fn missing_config_message(config_path: &Path) -> String {
    format!(
        "No keyledger config found at {}.\nHint: Run `keyledger init` or pass --db <PATH>.",
        config_path.display()
    )
}

pub fn missing_db_message(db_path: &Path) -> String {
    format!(
        "No keyledger database found at {}.\nHint: Run `keyledger init` to create one.",
        db_path.display()
    )
}

/// Bundles CLI args with the lazily-loaded config file.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<KeyledgerConfig>>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The config file, or `None` if it does not exist.
    pub fn config(&self) -> anyhow::Result<Option<&KeyledgerConfig>> {
        let loaded = self.config.get_or_try_init(|| {
            let path = resolve_config_path()?;
            if path.exists() {
                read_config(&path).map(Some)
            } else {
                Ok(None)
            }
        })?;
        Ok(loaded.as_ref())
    }

    /// Database path: `--db` / `KEYLEDGER_DB`, then the config file.
    pub fn db_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.cli.db.as_ref() {
            return Ok(PathBuf::from(path));
        }
        match self.config()? {
            Some(config) => Ok(PathBuf::from(&config.store.path)),
            None => Err(anyhow::anyhow!(missing_config_message(
                &resolve_config_path()?
            ))),
        }
    }

    /// Whether JSON exports are pretty-printed unless overridden.
    pub fn pretty_default(&self) -> anyhow::Result<bool> {
        Ok(self.config()?.is_some_and(|config| config.output.pretty))
    }

    /// Open the repository over an existing database.
    pub fn open_repository(&self) -> anyhow::Result<LedgerRepository<SqliteStore>> {
        let path = self.db_path()?;
        if !path.exists() {
            return Err(anyhow::anyhow!(missing_db_message(&path)));
        }
        let store = SqliteStore::open(&path)
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path.display(), e))?;
        Ok(LedgerRepository::new(store))
    }
}
