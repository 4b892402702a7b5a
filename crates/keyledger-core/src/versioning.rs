//! Entry versioning engine.
//!
//! Setting a key never edits an entry's value in place. The current active
//! entry (if any) is deactivated and a new active entry is appended with the
//! next version number, so every value a key ever held stays in the ledger
//! until it is explicitly deleted.
//!
//! The engine only touches the in-memory entry arena; persisting the ledger
//! afterwards is the caller's job.

use chrono::Utc;
use tracing::trace;
use uuid::Uuid;

use crate::model::{Entry, EntryBatch, Ledger};

/// Assign `value` to `key` in `ledger`, returning the new active entry.
///
/// - If `key` has an active entry, it is deactivated and the new entry gets
///   `key_version = old + 1`.
/// - Otherwise the new entry gets `max(key_version for key) + 1`, or 1 when
///   the key has no entries at all.
pub fn apply_entry<'a>(
    ledger: &'a mut Ledger,
    key: &str,
    value: Option<String>,
    description: Option<String>,
    change_id: Option<String>,
) -> &'a Entry {
    let key_version = match ledger.active_entry_mut(key) {
        Some(current) => {
            current.active = false;
            current.key_version + 1
        }
        None => ledger.max_version(key) + 1,
    };

    trace!(ledger = %ledger.name, key, key_version, "applying entry");

    ledger.entries.push(Entry {
        id: Uuid::new_v4(),
        key: key.to_string(),
        value,
        description,
        key_version,
        active: true,
        change_id,
        created_at: Utc::now(),
    });

    let index = ledger.entries.len() - 1;
    &ledger.entries[index]
}

/// Apply every assignment of `batch` in order.
///
/// Each assignment sees the effects of the ones before it, so a key listed
/// twice ends up with two new versions.
pub fn apply_batch(ledger: &mut Ledger, batch: &EntryBatch) -> usize {
    for entry in batch.entries() {
        apply_entry(
            ledger,
            &entry.key,
            entry.value.clone(),
            entry.description.clone(),
            entry.change_id.clone(),
        );
    }
    batch.len()
}
