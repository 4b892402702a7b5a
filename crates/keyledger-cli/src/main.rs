//! Keyledger CLI - versioned key/value ledgers for runtime configuration
//!
//! This is the command-line interface for Keyledger. It lets administrators
//! inspect and edit ledgers stored by the core library.

mod app;
mod cli;
mod commands;
mod config;
mod helpers;
mod output;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};

/// Log to stderr, filtered by `KEYLEDGER_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("KEYLEDGER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let ctx = AppContext::new(&cli);

    match &cli.command {
        Commands::Init(args) => commands::handle_init(&ctx, &cli, args),
        Commands::Set(args) => commands::handle_set(&ctx, args),
        Commands::Import(args) => commands::handle_import(&ctx, args),
        Commands::Export(args) => commands::handle_export(&ctx, args),
        Commands::Get(args) => commands::handle_get(&ctx, args),
        Commands::History(args) => commands::handle_history(&ctx, args),
        Commands::Size { ledger } => commands::handle_size(&ctx, ledger),
        Commands::Contains(args) => commands::handle_contains(&ctx, args),
        Commands::Delete(args) => commands::handle_delete(&ctx, args),
        Commands::PurgeNulls { ledger } => commands::handle_purge_nulls(&ctx, ledger),
        Commands::Purge { ledger } => commands::handle_purge(&ctx, ledger),
        Commands::Drop { ledger } => commands::handle_drop(&ctx, ledger),
        Commands::List(args) => commands::handle_list(&ctx, args),
        Commands::Check => commands::handle_check(&ctx),
        Commands::Completions { shell } => commands::handle_completions(*shell),
    }
}
