//! In-memory ledger store.
//!
//! A `HashMap`-backed [`LedgerStore`] for tests and embedding. Ledgers are
//! cloned in and out, so callers never share state with the store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{LedgerError, Result};
use crate::model::{Ledger, LedgerSummary};
use crate::storage::traits::LedgerStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    ledgers: Mutex<HashMap<String, Ledger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Ledger>>> {
        self.ledgers
            .lock()
            .map_err(|_| LedgerError::Persistence("Memory store poisoned".to_string()))
    }
}

fn store_ledger(ledgers: &mut HashMap<String, Ledger>, ledger: Ledger) -> Result<()> {
    if let Some(existing) = ledgers.get(&ledger.name) {
        if existing.id != ledger.id {
            return Err(LedgerError::Persistence(format!(
                "Ledger '{}' already exists",
                ledger.name
            )));
        }
    }
    ledgers.insert(ledger.name.clone(), ledger);
    Ok(())
}

impl LedgerStore for MemoryStore {
    fn find_ledger(&self, name: &str) -> Result<Option<Ledger>> {
        Ok(self.lock()?.get(name).cloned())
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        store_ledger(&mut *self.lock()?, ledger.clone())
    }

    fn update_ledger<T, F>(&self, name: &str, apply: F) -> Result<T>
    where
        F: FnOnce(Option<Ledger>) -> Result<(T, Option<Ledger>)>,
    {
        let mut ledgers = self.lock()?;
        let (output, next) = apply(ledgers.get(name).cloned())?;
        if let Some(ledger) = next {
            store_ledger(&mut ledgers, ledger)?;
        }
        Ok(output)
    }

    fn delete_ledger(&self, name: &str) -> Result<bool> {
        Ok(self.lock()?.remove(name).is_some())
    }

    fn list_ledgers(&self) -> Result<Vec<LedgerSummary>> {
        let mut summaries: Vec<LedgerSummary> =
            self.lock()?.values().map(LedgerSummary::from).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }
}
