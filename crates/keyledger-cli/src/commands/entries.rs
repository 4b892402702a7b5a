//! Entry commands: set, import, export, get, history, size, contains.

use keyledger_core::LedgerError;

use crate::app::AppContext;
use crate::cli::{ContainsArgs, ExportArgs, GetArgs, HistoryArgs, ImportArgs, SetArgs};
use crate::helpers::{display_value, parse_output_format, read_document};
use crate::output::{entries_json, entry_json, print_active_map, print_entries};

fn missing_ledger(name: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Ledger \"{}\" not found.\nHint: Run `keyledger list` to see existing ledgers.",
        name
    )
}

pub fn handle_set(ctx: &AppContext, args: &SetArgs) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let value = if args.null { None } else { args.value.as_deref() };
    let entry = repo.set_one(
        &args.ledger,
        &args.key,
        value,
        args.description.as_deref(),
        args.change_id.as_deref(),
        args.ledger_description.as_deref(),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry_json(&entry))?);
    } else if !ctx.quiet() {
        println!(
            "Set {}.{} = {} (v{})",
            args.ledger,
            entry.key,
            display_value(entry.value.as_deref()),
            entry.key_version
        );
    }
    Ok(())
}

pub fn handle_import(ctx: &AppContext, args: &ImportArgs) -> anyhow::Result<()> {
    let text = read_document(args.file.as_deref())?;
    let repo = ctx.open_repository()?;
    let batch = keyledger_core::json::decode(&text)?;
    repo.set_many(&args.ledger, &batch, args.ledger_description.as_deref())?;

    if !ctx.quiet() {
        println!("Imported {} entries into {}", batch.len(), args.ledger);
    }
    Ok(())
}

pub fn handle_export(ctx: &AppContext, args: &ExportArgs) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let pretty = args.pretty || (!args.compact && ctx.pretty_default()?);
    match repo.get_json(&args.ledger, pretty) {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(LedgerError::NotFound(_)) => Err(missing_ledger(&args.ledger)),
        Err(err) => Err(err.into()),
    }
}

pub fn handle_get(ctx: &AppContext, args: &GetArgs) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let map = repo
        .get_active_map(&args.ledger)?
        .ok_or_else(|| missing_ledger(&args.ledger))?;

    if let Some(key) = args.key.as_ref() {
        let value = map.get(key).ok_or_else(|| {
            anyhow::anyhow!(
                "Key \"{}\" has no active entry in ledger \"{}\"",
                key,
                args.ledger
            )
        })?;
        if args.json {
            println!("{}", serde_json::to_string(value)?);
        } else {
            println!("{}", display_value(value.as_deref()));
        }
        return Ok(());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        print_active_map(&map, parse_output_format(args.format.as_deref())?);
    }
    Ok(())
}

pub fn handle_history(ctx: &AppContext, args: &HistoryArgs) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let entries = repo
        .history(&args.ledger, &args.key)?
        .ok_or_else(|| missing_ledger(&args.ledger))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries_json(&entries))?);
    } else if entries.is_empty() {
        if !ctx.quiet() {
            println!("No entries for key \"{}\".", args.key);
        }
    } else {
        print_entries(&entries, parse_output_format(args.format.as_deref())?);
    }
    Ok(())
}

pub fn handle_size(ctx: &AppContext, ledger: &str) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    println!("{}", repo.size(ledger)?);
    Ok(())
}

pub fn handle_contains(ctx: &AppContext, args: &ContainsArgs) -> anyhow::Result<()> {
    let repo = ctx.open_repository()?;
    let found = match (args.key.as_ref(), args.value.as_deref()) {
        (Some(key), _) => repo.contains_active_key(&args.ledger, key)?,
        (None, Some(value)) => repo.contains_active_value(&args.ledger, Some(value))?,
        (None, None) => repo.contains_active_value(&args.ledger, None)?,
    };
    println!("{}", found);
    Ok(())
}
