//! Core data model: ledgers, versioned entries and entry batches.
//!
//! A [`Ledger`] owns its entries by value. Entries never point back at their
//! ledger; whoever holds the ledger already knows which one an entry belongs to.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named collection of versioned key/value entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Unique identifier for this ledger
    pub id: Uuid,

    /// Unique, non-empty name
    pub name: String,

    /// Optional human-readable description
    pub description: Option<String>,

    /// When this ledger was created
    pub created_at: DateTime<Utc>,

    /// Every entry ever assigned and not yet hard-deleted, active or not
    pub entries: Vec<Entry>,
}

/// One historical value assignment for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier for this entry
    pub id: Uuid,

    /// Key this entry assigns; shared by every version in the chain
    pub key: String,

    /// Assigned value; `None` is a stored null, not an absent key
    pub value: Option<String>,

    /// Purpose of the key
    pub description: Option<String>,

    /// Position in the key's version chain, starting at 1
    pub key_version: i64,

    /// Whether this is the visible value for its key
    pub active: bool,

    /// External change/audit correlation id
    pub change_id: Option<String>,

    /// When this entry was created
    pub created_at: DateTime<Utc>,
}

impl Ledger {
    /// Construct an empty, not-yet-persisted ledger.
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// The active entry for `key`, if any.
    pub fn active_entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.active && entry.key == key)
    }

    pub(crate) fn active_entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|entry| entry.active && entry.key == key)
    }

    /// All active entries, in insertion order.
    pub fn active_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| entry.active)
    }

    /// Number of active entries.
    pub fn active_len(&self) -> usize {
        self.active_entries().count()
    }

    /// Active key -> value view.
    pub fn active_map(&self) -> BTreeMap<String, Option<String>> {
        self.active_entries()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }

    /// Version chain for `key`, ordered by `key_version`.
    pub fn history(&self, key: &str) -> Vec<&Entry> {
        let mut chain: Vec<&Entry> = self.entries.iter().filter(|e| e.key == key).collect();
        chain.sort_by_key(|entry| entry.key_version);
        chain
    }

    /// Highest version recorded for `key`, 0 when the key has no entries.
    pub fn max_version(&self, key: &str) -> i64 {
        self.entries
            .iter()
            .filter(|entry| entry.key == key)
            .map(|entry| entry.key_version)
            .max()
            .unwrap_or(0)
    }

    /// Hard-delete the active entry for `key`. Returns the number removed (0 or 1).
    pub fn remove_active(&mut self, key: &str) -> usize {
        self.remove_where(|entry| entry.active && entry.key == key)
    }

    /// Hard-delete every version of `key`.
    pub fn remove_key(&mut self, key: &str) -> usize {
        self.remove_where(|entry| entry.key == key)
    }

    /// Hard-delete every entry, active or not, whose value is null.
    pub fn remove_null_values(&mut self) -> usize {
        self.remove_where(|entry| entry.value.is_none())
    }

    /// Hard-delete every entry.
    pub fn clear_entries(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    fn remove_where(&mut self, predicate: impl Fn(&Entry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !predicate(entry));
        before - self.entries.len()
    }
}

/// A value assignment waiting to be applied to a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub change_id: Option<String>,
}

impl NewEntry {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
            description: None,
            change_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_change_id(mut self, change_id: impl Into<String>) -> Self {
        self.change_id = Some(change_id.into());
        self
    }
}

/// Ordered set of assignments applied in one commit.
///
/// Order is kept so a key listed twice is applied twice, the second
/// assignment superseding the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryBatch {
    entries: Vec<NewEntry>,
}

impl EntryBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from a key -> value mapping.
    pub fn from_map<V: crate::value::EntryValue>(map: &BTreeMap<String, V>) -> Self {
        map.iter().fold(Self::new(), |batch, (key, value)| {
            batch.set(key.clone(), value.to_entry_value())
        })
    }

    pub fn set(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.entries.push(NewEntry::new(key, value));
        self
    }

    pub fn set_null(self, key: impl Into<String>) -> Self {
        self.set(key, None)
    }

    pub fn push(&mut self, entry: NewEntry) {
        self.entries.push(entry);
    }

    /// Attach per-key descriptions. Keys not present in the batch are ignored.
    pub fn describe(mut self, descriptions: &HashMap<String, String>) -> Self {
        for entry in &mut self.entries {
            if let Some(description) = descriptions.get(&entry.key) {
                entry.description = Some(description.clone());
            }
        }
        self
    }

    /// Tag every assignment in the batch with the same change id.
    pub fn with_change_id(mut self, change_id: impl Into<String>) -> Self {
        let change_id = change_id.into();
        for entry in &mut self.entries {
            entry.change_id = Some(change_id.clone());
        }
        self
    }

    pub fn entries(&self) -> &[NewEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Listing row for a stored ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub active_entries: usize,
    pub total_entries: usize,
}

impl From<&Ledger> for LedgerSummary {
    fn from(ledger: &Ledger) -> Self {
        Self {
            name: ledger.name.clone(),
            description: ledger.description.clone(),
            created_at: ledger.created_at,
            active_entries: ledger.active_len(),
            total_entries: ledger.entries.len(),
        }
    }
}
