//! # Keyledger Core
//!
//! Core library for Keyledger - named, key-versioned key/value ledgers over
//! SQLite, for configuration-like data that administrators edit at runtime.
//!
//! Setting a key never overwrites its value. The previous entry is
//! deactivated and a new entry with the next version number becomes active,
//! so the full history of every key stays queryable until it is explicitly
//! deleted.
//!
//! ## Architecture
//!
//! - **model**: `Ledger`, `Entry` and `EntryBatch`
//! - **versioning**: the supersede-and-append engine
//! - **validation**: input checks run before any mutation
//! - **value**: explicit string conversion of stored values
//! - **json**: JSON document decode/encode
//! - **storage**: `LedgerStore` trait with SQLite and in-memory backends
//! - **repository**: the `LedgerRepository` facade

pub mod error;
pub mod json;
pub mod model;
pub mod repository;
pub mod storage;
pub mod validation;
pub mod value;
pub mod versioning;

pub use error::{LedgerError, Result};
pub use model::{Entry, EntryBatch, Ledger, LedgerSummary, NewEntry};
pub use repository::LedgerRepository;
pub use storage::{LedgerStore, MemoryStore, SqliteStore};
pub use value::EntryValue;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
