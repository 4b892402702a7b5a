//! Row types for database queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::model::Entry;

/// Raw row data from the entries table, before parsing into domain types.
#[derive(Debug)]
pub struct EntryRow {
    pub id: String,
    pub key: String,
    pub value: Option<String>,
    pub description: Option<String>,
    pub key_version: i64,
    pub active: bool,
    pub change_id: Option<String>,
    pub created_at: String,
}

impl EntryRow {
    /// Column list matching [`EntryRow::from_row`].
    pub const COLUMNS: &'static str =
        "id, key, value, description, key_version, active, change_id, created_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            value: row.get(2)?,
            description: row.get(3)?,
            key_version: row.get(4)?,
            active: row.get(5)?,
            change_id: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl TryFrom<EntryRow> for Entry {
    type Error = LedgerError;

    fn try_from(row: EntryRow) -> Result<Self> {
        Ok(Entry {
            id: parse_uuid(&row.id, "entry")?,
            key: row.key,
            value: row.value,
            description: row.description,
            key_version: row.key_version,
            active: row.active,
            change_id: row.change_id,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

pub fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| LedgerError::Persistence(format!("Invalid {} UUID: {}", what, e)))
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| LedgerError::Persistence(format!("Invalid timestamp: {}", e)))
}
