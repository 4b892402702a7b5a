//! JSON output formatting for entries and ledgers.

use keyledger_core::{Entry, LedgerSummary};

/// Convert an entry to JSON for output.
pub fn entry_json(entry: &Entry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "key": entry.key,
        "value": entry.value,
        "description": entry.description,
        "key_version": entry.key_version,
        "active": entry.active,
        "change_id": entry.change_id,
        "created_at": entry.created_at,
    })
}

/// Convert multiple entries to JSON array for output.
pub fn entries_json(entries: &[Entry]) -> Vec<serde_json::Value> {
    entries.iter().map(entry_json).collect()
}

pub fn summaries_json(summaries: &[LedgerSummary]) -> Vec<serde_json::Value> {
    summaries
        .iter()
        .map(|summary| {
            serde_json::json!({
                "name": summary.name,
                "description": summary.description,
                "created_at": summary.created_at,
                "active_entries": summary.active_entries,
                "total_entries": summary.total_entries,
            })
        })
        .collect()
}
