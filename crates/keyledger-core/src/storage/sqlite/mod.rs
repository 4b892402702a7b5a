//! SQLite storage backend.
//!
//! Ledgers and entries live in two tables joined by a cascading foreign key.
//! Writes diff the in-memory ledger against the stored rows and apply the
//! difference inside a single `BEGIN IMMEDIATE` transaction; `update_ledger`
//! also performs its read inside that transaction.

mod row;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::model::{Entry, Ledger, LedgerSummary};
use crate::storage::traits::LedgerStore;

use row::{parse_timestamp, parse_uuid, EntryRow};

/// Current on-disk schema version.
pub const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS ledgers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entries (
        id TEXT PRIMARY KEY,
        ledger_id TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT,
        description TEXT,
        key_version INTEGER NOT NULL CHECK (key_version > 0),
        active INTEGER NOT NULL DEFAULT 1,
        change_id TEXT,
        created_at TEXT NOT NULL,

        UNIQUE (ledger_id, key, key_version),
        FOREIGN KEY (ledger_id) REFERENCES ledgers(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS entries_ledger_key
    ON entries (ledger_id, key);

    -- At most one active entry per key per ledger
    CREATE UNIQUE INDEX IF NOT EXISTS entries_active_key
    ON entries (ledger_id, key)
    WHERE active = 1;
"#;

/// SQLite-backed ledger store.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file, initialising the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn, Some(path.to_path_buf()))?;
        debug!(path = %path.display(), "opened sqlite ledger store");
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('format_version', ?)",
            [FORMAT_VERSION],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('created_at', ?)",
            [&now],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('last_modified', ?)",
            [&now],
        )?;

        let format_version: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'format_version'",
            [],
            |row| row.get(0),
        )?;
        if format_version != FORMAT_VERSION {
            return Err(LedgerError::Persistence(format!(
                "Unsupported store format version {} (expected {})",
                format_version, FORMAT_VERSION
            )));
        }

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Persistence("SQLite connection poisoned".to_string()))
    }

    /// Verify referential integrity and the version/active invariants.
    pub fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
        let mut rows = stmt.query([])?;
        if rows.next()?.is_some() {
            return Err(LedgerError::Persistence(
                "Foreign key integrity check failed".to_string(),
            ));
        }

        let multiple_active: i64 = conn.query_row(
            "SELECT COUNT(*) FROM (SELECT 1 FROM entries WHERE active = 1 GROUP BY ledger_id, key HAVING COUNT(*) > 1)",
            [],
            |row| row.get(0),
        )?;
        if multiple_active > 0 {
            return Err(LedgerError::Persistence(
                "Keys with more than one active entry".to_string(),
            ));
        }

        // The active entry must be the newest surviving version of its key.
        let stale_active: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM entries e
            WHERE e.active = 1 AND e.key_version < (
                SELECT MAX(key_version) FROM entries
                WHERE ledger_id = e.ledger_id AND key = e.key
            )
            "#,
            [],
            |row| row.get(0),
        )?;
        if stale_active > 0 {
            return Err(LedgerError::Persistence(
                "Active entries older than their key's latest version".to_string(),
            ));
        }

        let metadata_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meta WHERE key IN ('format_version', 'created_at', 'last_modified')",
            [],
            |row| row.get(0),
        )?;
        if metadata_count < 3 {
            return Err(LedgerError::Persistence(
                "Metadata table missing required keys".to_string(),
            ));
        }

        Ok(())
    }
}

fn insert_entry(tx: &Transaction<'_>, ledger_id: &str, entry: &Entry) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO entries (
            id,
            ledger_id,
            key,
            value,
            description,
            key_version,
            active,
            change_id,
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        (
            entry.id.to_string(),
            ledger_id,
            &entry.key,
            &entry.value,
            &entry.description,
            entry.key_version,
            entry.active,
            &entry.change_id,
            entry.created_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

fn load_ledger(conn: &Connection, name: &str) -> Result<Option<Ledger>> {
    let header = conn
        .query_row(
            "SELECT id, name, description, created_at FROM ledgers WHERE name = ?",
            [name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let (id, name, description, created_at) = match header {
        Some(header) => header,
        None => return Ok(None),
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM entries WHERE ledger_id = ? ORDER BY rowid",
        EntryRow::COLUMNS
    ))?;
    let rows = stmt.query_map([&id], EntryRow::from_row)?;

    let mut entries: Vec<Entry> = Vec::new();
    for row in rows {
        entries.push(row?.try_into()?);
    }

    Ok(Some(Ledger {
        id: parse_uuid(&id, "ledger")?,
        name,
        description,
        created_at: parse_timestamp(&created_at)?,
        entries,
    }))
}

/// Apply the difference between `ledger` and its stored rows.
fn write_ledger(tx: &Transaction<'_>, ledger: &Ledger) -> Result<()> {
    let ledger_id = ledger.id.to_string();

    tx.execute(
        r#"
        INSERT INTO ledgers (id, name, description, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET description = excluded.description
        "#,
        (
            &ledger_id,
            &ledger.name,
            &ledger.description,
            ledger.created_at.to_rfc3339(),
        ),
    )?;

    let stored: HashSet<String> = {
        let mut stmt = tx.prepare("SELECT id FROM entries WHERE ledger_id = ?")?;
        let ids = stmt
            .query_map([&ledger_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        ids
    };
    let current: HashSet<String> = ledger.entries.iter().map(|e| e.id.to_string()).collect();

    let mut deleted = 0;
    for id in stored.difference(&current) {
        deleted += tx.execute("DELETE FROM entries WHERE id = ?", [id])?;
    }

    // Deactivations must land before inserts to keep the active-key index satisfied.
    let mut updated = 0;
    for entry in &ledger.entries {
        let id = entry.id.to_string();
        if stored.contains(&id) {
            updated += tx.execute(
                "UPDATE entries SET active = ? WHERE id = ? AND active != ?",
                (entry.active, &id, entry.active),
            )?;
        }
    }

    let mut inserted = 0;
    for entry in &ledger.entries {
        if !stored.contains(&entry.id.to_string()) {
            insert_entry(tx, &ledger_id, entry)?;
            inserted += 1;
        }
    }

    tx.execute(
        "UPDATE meta SET value = ? WHERE key = 'last_modified'",
        [Utc::now().to_rfc3339()],
    )?;

    debug!(
        ledger = %ledger.name,
        inserted,
        updated,
        deleted,
        "wrote ledger"
    );
    Ok(())
}

impl LedgerStore for SqliteStore {
    fn find_ledger(&self, name: &str) -> Result<Option<Ledger>> {
        let conn = self.lock_conn()?;
        load_ledger(&conn, name)
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_ledger(&tx, ledger)?;
        tx.commit()?;
        Ok(())
    }

    fn update_ledger<T, F>(&self, name: &str, apply: F) -> Result<T>
    where
        F: FnOnce(Option<Ledger>) -> Result<(T, Option<Ledger>)>,
    {
        let mut conn = self.lock_conn()?;
        // IMMEDIATE takes the write lock up front, so no other connection can
        // commit between the read below and our write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_ledger(&tx, name)?;
        let (output, next) = apply(current)?;
        if let Some(ledger) = next {
            write_ledger(&tx, &ledger)?;
        }
        tx.commit()?;
        Ok(output)
    }

    fn delete_ledger(&self, name: &str) -> Result<bool> {
        let conn = self.lock_conn()?;
        let removed = conn.execute("DELETE FROM ledgers WHERE name = ?", [name])?;
        Ok(removed > 0)
    }

    fn list_ledgers(&self) -> Result<Vec<LedgerSummary>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT l.name, l.description, l.created_at,
                   COALESCE(SUM(e.active), 0), COUNT(e.id)
            FROM ledgers l
            LEFT JOIN entries e ON e.ledger_id = l.id
            GROUP BY l.id
            ORDER BY l.name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (name, description, created_at, active, total) = row?;
            summaries.push(LedgerSummary {
                name,
                description,
                created_at: parse_timestamp(&created_at)?,
                active_entries: active as usize,
                total_entries: total as usize,
            });
        }

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::apply_entry;

    fn fruits() -> Ledger {
        let mut ledger = Ledger::new("fruits", Some("things that grow".to_string()));
        apply_entry(&mut ledger, "a", Some("apple".to_string()), None, None);
        apply_entry(&mut ledger, "a", Some("apricot".to_string()), None, None);
        apply_entry(&mut ledger, "b", None, Some("nothing yet".to_string()), None);
        ledger
    }

    #[test]
    fn test_save_and_find_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ledger = fruits();
        store.save_ledger(&ledger).unwrap();

        let loaded = store.find_ledger("fruits").unwrap().unwrap();
        assert_eq!(loaded.id, ledger.id);
        assert_eq!(loaded.description.as_deref(), Some("things that grow"));
        assert_eq!(loaded.entries.len(), 3);
        assert_eq!(loaded.active_map(), ledger.active_map());
        assert!(store.find_ledger("nope").unwrap().is_none());
        store.check_integrity().unwrap();
    }

    #[test]
    fn test_save_applies_deletes_and_deactivations() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut ledger = fruits();
        store.save_ledger(&ledger).unwrap();

        ledger.remove_null_values();
        apply_entry(&mut ledger, "a", Some("avocado".to_string()), None, None);
        store.save_ledger(&ledger).unwrap();

        let loaded = store.find_ledger("fruits").unwrap().unwrap();
        assert!(loaded.active_entry("b").is_none());
        let chain: Vec<(i64, bool)> = loaded
            .history("a")
            .iter()
            .map(|e| (e.key_version, e.active))
            .collect();
        assert_eq!(chain, vec![(1, false), (2, false), (3, true)]);
        store.check_integrity().unwrap();
    }

    #[test]
    fn test_failed_commit_leaves_store_unchanged() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut ledger = fruits();
        store.save_ledger(&ledger).unwrap();

        // Two active entries for one key violate the active-key index.
        apply_entry(&mut ledger, "c", Some("cherry".to_string()), None, None);
        let mut duplicate = ledger.entries.last().unwrap().clone();
        duplicate.id = uuid::Uuid::new_v4();
        duplicate.key_version = 2;
        ledger.entries.push(duplicate);

        let err = store.save_ledger(&ledger).unwrap_err();
        assert!(err.is_persistence());

        let loaded = store.find_ledger("fruits").unwrap().unwrap();
        assert_eq!(loaded.entries.len(), 3);
        assert!(loaded.active_entry("c").is_none());
    }

    #[test]
    fn test_update_ledger_commits_only_returned_ledger() {
        let store = SqliteStore::open_in_memory().unwrap();

        let seen = store
            .update_ledger("fruits", |current| Ok((current.is_some(), None)))
            .unwrap();
        assert!(!seen);
        assert!(store.find_ledger("fruits").unwrap().is_none());

        let version = store
            .update_ledger("fruits", |current| {
                let mut ledger = current.unwrap_or_else(|| Ledger::new("fruits", None));
                let version = apply_entry(&mut ledger, "a", Some("apple".to_string()), None, None)
                    .key_version;
                Ok((version, Some(ledger)))
            })
            .unwrap();
        assert_eq!(version, 1);
        assert_eq!(store.find_ledger("fruits").unwrap().unwrap().active_len(), 1);
    }

    #[test]
    fn test_update_ledger_error_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_ledger(&fruits()).unwrap();

        let err = store
            .update_ledger("fruits", |current| -> Result<((), Option<Ledger>)> {
                let mut ledger = current.unwrap();
                ledger.clear_entries();
                Err(LedgerError::InvalidInput("rejected".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert_eq!(store.find_ledger("fruits").unwrap().unwrap().entries.len(), 3);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_ledger(&Ledger::new("fruits", None)).unwrap();
        let err = store.save_ledger(&Ledger::new("fruits", None)).unwrap_err();
        assert!(err.is_persistence());
    }

    #[test]
    fn test_delete_cascades_and_list() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_ledger(&fruits()).unwrap();
        store.save_ledger(&Ledger::new("animals", None)).unwrap();

        let names: Vec<String> = store
            .list_ledgers()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["animals", "fruits"]);

        let summary = &store.list_ledgers().unwrap()[1];
        assert_eq!(summary.active_entries, 2);
        assert_eq!(summary.total_entries, 3);

        assert!(store.delete_ledger("fruits").unwrap());
        assert!(!store.delete_ledger("fruits").unwrap());

        let conn = store.lock_conn().unwrap();
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
