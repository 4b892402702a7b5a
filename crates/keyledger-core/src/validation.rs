//! Input validation, run before any ledger mutation.

use crate::error::{LedgerError, Result};
use crate::model::EntryBatch;

/// Maximum bytes for a ledger name.
pub const MAX_NAME_BYTES: usize = 255;

/// Validate a ledger name: non-empty after trimming, bounded length.
pub fn validate_ledger_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::InvalidInput(
            "Ledger name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(LedgerError::InvalidInput(format!(
            "Ledger name too long (max {} bytes)",
            MAX_NAME_BYTES
        )));
    }
    Ok(())
}

/// Validate an entry key.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(LedgerError::InvalidInput(
            "Entry key must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate every key in a batch. Nothing is applied if any key fails.
pub fn validate_batch(batch: &EntryBatch) -> Result<()> {
    batch
        .entries()
        .iter()
        .try_for_each(|entry| validate_key(&entry.key))
}
