//! Deletion, listing and integrity commands.

use crate::app::AppContext;
use crate::cli::{DeleteArgs, ListArgs};
use crate::helpers::parse_output_format;
use crate::output::{print_summaries, summaries_json};

pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let removed = if args.all_versions {
        let mut total = 0;
        for key in &args.keys {
            total += repo.delete_all_key_entries(&args.ledger, key)?;
        }
        total
    } else {
        repo.delete_keys(&args.ledger, &args.keys)?
    };

    if !ctx.quiet() {
        println!("Deleted {} entries from {}", removed, args.ledger);
    }
    Ok(())
}

pub fn handle_purge_nulls(ctx: &AppContext, ledger: &str) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let removed = repo.purge_nulls(ledger)?;
    if !ctx.quiet() {
        println!("Purged {} null entries from {}", removed, ledger);
    }
    Ok(())
}

pub fn handle_purge(ctx: &AppContext, ledger: &str) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let removed = repo.purge_all(ledger)?;
    if !ctx.quiet() {
        println!("Purged {} entries from {}", removed, ledger);
    }
    Ok(())
}

pub fn handle_drop(ctx: &AppContext, ledger: &str) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let deleted = repo.delete_ledger(ledger)?;
    if !ctx.quiet() {
        if deleted {
            println!("Deleted ledger {}", ledger);
        } else {
            println!("No ledger named {}", ledger);
        }
    }
    Ok(())
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let summaries = repo.list_ledgers()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries_json(&summaries))?);
    } else if summaries.is_empty() {
        if !ctx.quiet() {
            println!("No ledgers yet.");
        }
    } else {
        print_summaries(&summaries, parse_output_format(args.format.as_deref())?);
    }
    Ok(())
}

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    match repo.store().check_integrity() {
        Ok(()) => {
            if !ctx.quiet() {
                println!("Integrity check: OK");
                println!("- foreign keys: OK");
                println!("- one active entry per key: OK");
                println!("- active entry is latest version: OK");
                println!("- metadata keys: OK");
            }
        }
        Err(err) => {
            eprintln!("Integrity check: FAILED");
            eprintln!("- error: {}", err);
            return Err(anyhow::anyhow!("Integrity check failed"));
        }
    }
    Ok(())
}
