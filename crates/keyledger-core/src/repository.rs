//! Ledger repository facade.
//!
//! Every mutation reads the ledger, applies its change in memory and commits
//! inside one [`LedgerStore::update_ledger`] call, so a concurrent writer's
//! entries are never dropped by a stale snapshot. Nothing is cached between
//! calls, so a value edited by another writer is visible on the next read.
//!
//! Query methods report a missing ledger through their return value
//! (`None`, `-1`, `false`) rather than an error; only [`LedgerRepository::get_json`]
//! fails with `NotFound`.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::json;
use crate::model::{Entry, EntryBatch, Ledger, LedgerSummary};
use crate::storage::LedgerStore;
use crate::validation::{validate_batch, validate_key, validate_ledger_name};
use crate::value::EntryValue;
use crate::versioning::{apply_batch, apply_entry};

/// The stored ledger, or a new one named `name`. The flag reports whether
/// the ledger needs committing even if no entry changes.
fn ledger_or_new(
    current: Option<Ledger>,
    name: &str,
    description: Option<&str>,
) -> (Ledger, bool) {
    match current {
        Some(mut ledger) => {
            let changed = match description {
                Some(text) if ledger.description.as_deref() != Some(text) => {
                    ledger.description = Some(text.to_string());
                    true
                }
                _ => false,
            };
            (ledger, changed)
        }
        None => {
            info!(ledger = name, "creating ledger");
            (Ledger::new(name, description.map(String::from)), true)
        }
    }
}

/// Facade over a [`LedgerStore`] implementing the ledger operations.
pub struct LedgerRepository<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> LedgerRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a hard-delete style mutation; commits only if it removed something.
    fn remove_entries(
        &self,
        name: &str,
        operation: &str,
        mutate: impl FnOnce(&mut Ledger) -> usize,
    ) -> Result<usize> {
        let removed = self.store.update_ledger(name, |current| {
            let mut ledger = match current {
                Some(ledger) => ledger,
                None => return Ok((0, None)),
            };
            let removed = mutate(&mut ledger);
            Ok((removed, (removed > 0).then_some(ledger)))
        })?;
        debug!(ledger = name, operation, removed, "removed entries");
        Ok(removed)
    }

    /// Fetch a ledger, creating it if absent.
    ///
    /// A supplied description replaces the stored one; `None` keeps it.
    pub fn find_or_create(&self, name: &str, description: Option<&str>) -> Result<Ledger> {
        validate_ledger_name(name)?;
        self.store.update_ledger(name, |current| {
            let (ledger, changed) = ledger_or_new(current, name, description);
            let commit = changed.then(|| ledger.clone());
            Ok((ledger, commit))
        })
    }

    /// Fetch a ledger with its full entry history.
    pub fn get_ledger(&self, name: &str) -> Result<Option<Ledger>> {
        self.store.find_ledger(name)
    }

    /// Active key -> value mapping; `None` if the ledger does not exist.
    pub fn get_active_map(&self, name: &str) -> Result<Option<BTreeMap<String, Option<String>>>> {
        Ok(self.store.find_ledger(name)?.map(|ledger| ledger.active_map()))
    }

    /// Active value for `key`.
    ///
    /// The outer `Option` is `None` when the ledger or an active entry for the
    /// key is missing; the inner one is `None` for a stored null.
    pub fn get_active_value(&self, name: &str, key: &str) -> Result<Option<Option<String>>> {
        Ok(self
            .get_active_map(name)?
            .and_then(|mut map| map.remove(key)))
    }

    /// Number of active entries: `-1` if the ledger does not exist.
    pub fn size(&self, name: &str) -> Result<i64> {
        Ok(match self.store.find_ledger(name)? {
            Some(ledger) => ledger.active_len() as i64,
            None => -1,
        })
    }

    pub fn contains_active_key(&self, name: &str, key: &str) -> Result<bool> {
        Ok(self
            .store
            .find_ledger(name)?
            .is_some_and(|ledger| ledger.active_entry(key).is_some()))
    }

    /// Whether any active entry holds `value` (`None` matches stored nulls).
    pub fn contains_active_value(&self, name: &str, value: Option<&str>) -> Result<bool> {
        Ok(self.store.find_ledger(name)?.is_some_and(|ledger| {
            ledger
                .active_entries()
                .any(|entry| entry.value.as_deref() == value)
        }))
    }

    /// Version chain of `key`, oldest first; `None` if the ledger does not exist.
    pub fn history(&self, name: &str, key: &str) -> Result<Option<Vec<Entry>>> {
        Ok(self
            .store
            .find_ledger(name)?
            .map(|ledger| ledger.history(key).into_iter().cloned().collect()))
    }

    pub fn list_ledgers(&self) -> Result<Vec<LedgerSummary>> {
        self.store.list_ledgers()
    }

    /// Apply a batch of assignments to `name` in one commit.
    ///
    /// Every key is validated before anything is applied.
    pub fn set_many(
        &self,
        name: &str,
        batch: &EntryBatch,
        ledger_description: Option<&str>,
    ) -> Result<()> {
        validate_ledger_name(name)?;
        validate_batch(batch)?;
        let applied = self.store.update_ledger(name, |current| {
            let (mut ledger, _) = ledger_or_new(current, name, ledger_description);
            let applied = apply_batch(&mut ledger, batch);
            Ok((applied, Some(ledger)))
        })?;
        debug!(ledger = name, applied, "applied entry batch");
        Ok(())
    }

    /// Apply a key -> value mapping with descriptions passed alongside.
    ///
    /// Descriptions for keys missing from `entries` are ignored.
    pub fn set_map<V: EntryValue>(
        &self,
        name: &str,
        entries: &BTreeMap<String, V>,
        descriptions: &HashMap<String, String>,
        ledger_description: Option<&str>,
    ) -> Result<()> {
        let batch = EntryBatch::from_map(entries).describe(descriptions);
        self.set_many(name, &batch, ledger_description)
    }

    /// Assign a single value and return the new active entry.
    pub fn set_one<V: EntryValue>(
        &self,
        name: &str,
        key: &str,
        value: V,
        description: Option<&str>,
        change_id: Option<&str>,
        ledger_description: Option<&str>,
    ) -> Result<Entry> {
        validate_ledger_name(name)?;
        validate_key(key)?;
        let value = value.to_entry_value();
        let entry = self.store.update_ledger(name, |current| {
            let (mut ledger, _) = ledger_or_new(current, name, ledger_description);
            let entry = apply_entry(
                &mut ledger,
                key,
                value,
                description.map(String::from),
                change_id.map(String::from),
            )
            .clone();
            Ok((entry, Some(ledger)))
        })?;
        debug!(
            ledger = name,
            key,
            key_version = entry.key_version,
            "set entry"
        );
        Ok(entry)
    }

    /// Hard-delete the active entry for `key`. Older versions are kept.
    ///
    /// Returns `false` if the ledger or the active entry does not exist.
    pub fn delete_active_entry(&self, name: &str, key: &str) -> Result<bool> {
        let removed = self.remove_entries(name, "delete_active_entry", |ledger| {
            ledger.remove_active(key)
        })?;
        Ok(removed > 0)
    }

    /// Hard-delete every version of `key`.
    pub fn delete_all_key_entries(&self, name: &str, key: &str) -> Result<usize> {
        self.remove_entries(name, "delete_all_key_entries", |ledger| {
            ledger.remove_key(key)
        })
    }

    /// Hard-delete the active entry of each key, committing once.
    pub fn delete_keys<K: AsRef<str>>(&self, name: &str, keys: &[K]) -> Result<usize> {
        self.remove_entries(name, "delete_keys", |ledger| {
            keys.iter()
                .map(|key| ledger.remove_active(key.as_ref()))
                .sum()
        })
    }

    /// Hard-delete every entry, active or not, whose value is null.
    pub fn purge_nulls(&self, name: &str) -> Result<usize> {
        self.remove_entries(name, "purge_nulls", Ledger::remove_null_values)
    }

    /// Hard-delete every entry. The ledger itself stays.
    pub fn purge_all(&self, name: &str) -> Result<usize> {
        self.remove_entries(name, "purge_all", Ledger::clear_entries)
    }

    /// Delete the ledger and all its entries. Returns `false` if it did not exist.
    pub fn delete_ledger(&self, name: &str) -> Result<bool> {
        let deleted = self.store.delete_ledger(name)?;
        if deleted {
            info!(ledger = name, "deleted ledger");
        }
        Ok(deleted)
    }

    /// Decode a JSON document and apply it as one batch.
    pub fn set_json(&self, name: &str, text: &str, ledger_description: Option<&str>) -> Result<()> {
        let batch = json::decode(text)?;
        self.set_many(name, &batch, ledger_description)
    }

    /// Encode the active entries of `name` as JSON.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` if the ledger does not exist.
    pub fn get_json(&self, name: &str, pretty: bool) -> Result<String> {
        let ledger = self
            .store
            .find_ledger(name)?
            .ok_or_else(|| LedgerError::NotFound(format!("Ledger '{}'", name)))?;
        json::encode(&ledger, pretty)
    }
}
