//! Text and table output formatting.

use std::collections::BTreeMap;

use comfy_table::{presets, Cell, ContentArrangement, Table};
use keyledger_core::{Entry, LedgerSummary};

use crate::helpers::{display_value, OutputFormat};

/// Borderless table; plain mode prints tab-separated rows without a header.
fn render(format: OutputFormat, headers: &[&str], rows: Vec<Vec<String>>) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table.load_preset(presets::NOTHING);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(headers.iter().map(|h| Cell::new(*h)));
            for i in 0..headers.len() {
                if let Some(column) = table.column_mut(i) {
                    column.set_padding((0, 2));
                }
            }
            for row in rows {
                table.add_row(row);
            }
            table.to_string()
        }
        OutputFormat::Plain => rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn print_rendered(text: String) {
    if !text.is_empty() {
        println!("{}", text);
    }
}

pub fn print_active_map(map: &BTreeMap<String, Option<String>>, format: OutputFormat) {
    let rows = map
        .iter()
        .map(|(key, value)| vec![key.clone(), display_value(value.as_deref()).to_string()])
        .collect();
    print_rendered(render(format, &["KEY", "VALUE"], rows));
}

pub fn print_entries(entries: &[Entry], format: OutputFormat) {
    let rows = entries
        .iter()
        .map(|entry| {
            vec![
                entry.key_version.to_string(),
                if entry.active { "*" } else { "" }.to_string(),
                display_value(entry.value.as_deref()).to_string(),
                entry.description.clone().unwrap_or_default(),
                entry.change_id.clone().unwrap_or_default(),
                entry.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            ]
        })
        .collect();
    print_rendered(render(
        format,
        &["VERSION", "ACTIVE", "VALUE", "DESCRIPTION", "CHANGE", "CREATED"],
        rows,
    ));
}

pub fn print_summaries(summaries: &[LedgerSummary], format: OutputFormat) {
    let rows = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.name.clone(),
                summary.active_entries.to_string(),
                summary.total_entries.to_string(),
                summary.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_rendered(render(
        format,
        &["LEDGER", "ACTIVE", "TOTAL", "DESCRIPTION"],
        rows,
    ));
}
