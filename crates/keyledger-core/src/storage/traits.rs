//! Storage trait definition.
//!
//! The `LedgerStore` trait is the persistence collaborator behind the
//! repository facade. Backends hold whole ledgers; the facade mutates one
//! in memory through [`LedgerStore::update_ledger`], which reads and commits
//! under a single write transaction.

use crate::error::Result;
use crate::model::{Ledger, LedgerSummary};

/// Persistence interface for ledgers and their entries.
///
/// All implementations must ensure:
/// - `save_ledger` is atomic: either every row change lands or none does
/// - Deleting a ledger deletes its entries
/// - Ledger names are unique
/// - Reads are never served from a cache; a change committed by another
///   writer is visible to the next read
pub trait LedgerStore: Send + Sync {
    /// Fetch a ledger and all of its entries by name.
    ///
    /// Returns `Ok(None)` if no ledger has this name.
    fn find_ledger(&self, name: &str) -> Result<Option<Ledger>>;

    /// Make the stored ledger match `ledger`, overwriting whatever is stored.
    ///
    /// Creates the ledger row when missing, updates its description, inserts
    /// entries the store has not seen, updates the `active` flag of known
    /// entries and deletes stored entries no longer present in `ledger`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Persistence` (or `LedgerError::Sqlite`) if the
    /// commit fails; the stored state is then unchanged.
    fn save_ledger(&self, ledger: &Ledger) -> Result<()>;

    /// Read, modify and commit `name` without another writer in between.
    ///
    /// `apply` receives the stored ledger (`None` if absent) and returns its
    /// output together with the ledger to commit. Returning `None` for the
    /// ledger leaves the store untouched. The read and the commit happen
    /// under one write lock, so rows another writer committed are never lost
    /// to a stale snapshot.
    ///
    /// `apply` must not call back into the same store.
    ///
    /// # Errors
    ///
    /// An error from `apply` aborts the update with nothing written.
    fn update_ledger<T, F>(&self, name: &str, apply: F) -> Result<T>
    where
        F: FnOnce(Option<Ledger>) -> Result<(T, Option<Ledger>)>;

    /// Delete a ledger and all its entries. Returns `true` if it existed.
    fn delete_ledger(&self, name: &str) -> Result<bool>;

    /// Summaries of every stored ledger, ordered by name.
    fn list_ledgers(&self) -> Result<Vec<LedgerSummary>>;
}
