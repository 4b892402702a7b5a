//! Error types for Keyledger core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages.

use thiserror::Error;

/// Result type alias for Keyledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Core error type for Keyledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Invalid caller input (bad key, malformed JSON document, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Committing to the persistence backend failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// SQLite-specific persistence error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// JSON serialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl LedgerError {
    /// True for failures raised by the persistence backend.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            LedgerError::Persistence(_) | LedgerError::Sqlite { .. }
        )
    }
}
