use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use keyledger_core::versioning::apply_entry;
use keyledger_core::{EntryBatch, LedgerError, LedgerRepository, LedgerStore, SqliteStore};
use tempfile::TempDir;

struct TempRepo {
    _dir: TempDir,
    path: std::path::PathBuf,
    repo: LedgerRepository<SqliteStore>,
}

impl TempRepo {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("keyledger.db");
        let store = SqliteStore::open(&path).expect("open should succeed");
        assert_eq!(store.path(), Some(path.as_path()));
        Self {
            _dir: dir,
            path,
            repo: LedgerRepository::new(store),
        }
    }

    fn reopen(&self) -> LedgerRepository<SqliteStore> {
        LedgerRepository::new(SqliteStore::open(&self.path).expect("reopen should succeed"))
    }
}

fn fruit_batch(pairs: &[(&str, &str)]) -> EntryBatch {
    pairs.iter().fold(EntryBatch::new(), |batch, (key, value)| {
        batch.set(*key, Some(value.to_string()))
    })
}

fn expected(pairs: &[(&str, &str)]) -> BTreeMap<String, Option<String>> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.to_string())))
        .collect()
}

#[test]
fn test_set_many_then_get_active_map() {
    let t = TempRepo::new();
    t.repo
        .set_many("fruits", &fruit_batch(&[("a", "apple"), ("b", "banana")]), None)
        .expect("set_many should succeed");

    let map = t.repo.get_active_map("fruits").unwrap().unwrap();
    assert_eq!(map, expected(&[("a", "apple"), ("b", "banana")]));
}

#[test]
fn test_second_batch_keeps_history() {
    let t = TempRepo::new();
    t.repo
        .set_many("fruits", &fruit_batch(&[("a", "apple"), ("b", "banana")]), None)
        .unwrap();
    t.repo
        .set_many("fruits", &fruit_batch(&[("a", "apricot")]), None)
        .unwrap();

    let history = t.repo.history("fruits", "a").unwrap().unwrap();
    let chain: Vec<(i64, &str, bool)> = history
        .iter()
        .map(|e| (e.key_version, e.value.as_deref().unwrap(), e.active))
        .collect();
    assert_eq!(chain, vec![(1, "apple", false), (2, "apricot", true)]);

    // Survives a fresh connection.
    let reopened = t.reopen();
    assert_eq!(
        reopened.get_active_map("fruits").unwrap().unwrap(),
        expected(&[("a", "apricot"), ("b", "banana")])
    );
    reopened.store().check_integrity().unwrap();
}

#[test]
fn test_same_key_twice_in_one_batch() {
    let t = TempRepo::new();
    let batch = fruit_batch(&[("a", "apple"), ("a", "apricot")]);
    t.repo.set_many("fruits", &batch, None).unwrap();

    let history = t.repo.history("fruits", "a").unwrap().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].key_version, 2);
    assert!(history[1].active);
    assert!(!history[0].active);
    assert_eq!(t.repo.size("fruits").unwrap(), 1);
}

#[test]
fn test_versions_increase_and_single_active() {
    let t = TempRepo::new();
    for (i, value) in ["one", "two", "three", "four"].iter().enumerate() {
        let entry = t
            .repo
            .set_one("numbers", "n", *value, None, Some("CHG-7"), None)
            .unwrap();
        assert_eq!(entry.key_version, i as i64 + 1);
        assert_eq!(entry.change_id.as_deref(), Some("CHG-7"));

        let history = t.repo.history("numbers", "n").unwrap().unwrap();
        assert_eq!(history.iter().filter(|e| e.active).count(), 1);
    }
}

#[test]
fn test_size_sentinels() {
    let t = TempRepo::new();
    assert_eq!(t.repo.size("nope").unwrap(), -1);
    t.repo.find_or_create("fruits", Some("orchard")).unwrap();
    assert_eq!(t.repo.size("fruits").unwrap(), 0);
    t.repo
        .set_many("fruits", &fruit_batch(&[("a", "apple"), ("b", "banana")]), None)
        .unwrap();
    assert_eq!(t.repo.size("fruits").unwrap(), 2);
}

#[test]
fn test_version_resumes_after_active_delete() {
    let t = TempRepo::new();
    t.repo.set_one("fruits", "a", "apple", None, None, None).unwrap();
    t.repo.set_one("fruits", "a", "apricot", None, None, None).unwrap();
    t.repo.set_one("fruits", "a", "avocado", None, None, None).unwrap();

    assert!(t.repo.delete_active_entry("fruits", "a").unwrap());
    assert!(!t.repo.contains_active_key("fruits", "a").unwrap());
    assert_eq!(t.repo.history("fruits", "a").unwrap().unwrap().len(), 2);

    let entry = t.repo.set_one("fruits", "a", "acai", None, None, None).unwrap();
    assert_eq!(entry.key_version, 3);

    let versions: Vec<i64> = t
        .repo
        .history("fruits", "a")
        .unwrap()
        .unwrap()
        .iter()
        .map(|e| e.key_version)
        .collect();
    assert_eq!(versions, vec![1, 2, 3]);
    t.repo.store().check_integrity().unwrap();
}

#[test]
fn test_delete_keys_only_removes_active_versions() {
    let t = TempRepo::new();
    for value in ["apple", "apricot"] {
        t.repo.set_one("fruits", "a", value, None, None, None).unwrap();
    }
    for value in ["banana", "blueberry"] {
        t.repo.set_one("fruits", "b", value, None, None, None).unwrap();
    }
    t.repo.set_one("fruits", "c", "cherry", None, None, None).unwrap();

    let removed = t.repo.delete_keys("fruits", &["a", "b", "missing"]).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(t.repo.size("fruits").unwrap(), 1);

    let a_history = t.repo.history("fruits", "a").unwrap().unwrap();
    assert_eq!(a_history.len(), 1);
    assert_eq!(a_history[0].value.as_deref(), Some("apple"));
    assert!(!a_history[0].active);
}

#[test]
fn test_delete_all_key_entries_removes_history() {
    let t = TempRepo::new();
    for value in ["apple", "apricot", "avocado"] {
        t.repo.set_one("fruits", "a", value, None, None, None).unwrap();
    }
    t.repo.set_one("fruits", "b", "banana", None, None, None).unwrap();

    assert_eq!(t.repo.delete_all_key_entries("fruits", "a").unwrap(), 3);
    assert!(t.repo.history("fruits", "a").unwrap().unwrap().is_empty());
    assert_eq!(t.repo.delete_all_key_entries("fruits", "a").unwrap(), 0);
    assert_eq!(t.repo.size("fruits").unwrap(), 1);

    // With no history left, numbering starts over.
    let entry = t.repo.set_one("fruits", "a", "acai", None, None, None).unwrap();
    assert_eq!(entry.key_version, 1);
}

#[test]
fn test_purge_nulls_removes_active_and_inactive_nulls() {
    let t = TempRepo::new();
    t.repo.set_one("fruits", "a", None::<&str>, None, None, None).unwrap();
    t.repo.set_one("fruits", "a", "apple", None, None, None).unwrap();
    t.repo.set_one("fruits", "b", None::<&str>, None, None, None).unwrap();
    t.repo.set_one("fruits", "c", "cherry", None, None, None).unwrap();

    assert_eq!(t.repo.purge_nulls("fruits").unwrap(), 2);

    let ledger = t.repo.get_ledger("fruits").unwrap().unwrap();
    assert_eq!(ledger.entries.len(), 2);
    assert!(ledger.entries.iter().all(|e| e.value.is_some()));
    assert_eq!(
        t.repo.get_active_map("fruits").unwrap().unwrap(),
        expected(&[("a", "apple"), ("c", "cherry")])
    );
    assert_eq!(t.repo.purge_nulls("fruits").unwrap(), 0);
}

#[test]
fn test_purge_all_keeps_ledger() {
    let t = TempRepo::new();
    t.repo
        .set_many("fruits", &fruit_batch(&[("a", "apple"), ("b", "banana")]), Some("orchard"))
        .unwrap();
    assert_eq!(t.repo.purge_all("fruits").unwrap(), 2);
    assert_eq!(t.repo.size("fruits").unwrap(), 0);
    assert_eq!(t.repo.get_active_map("fruits").unwrap(), Some(BTreeMap::new()));
    assert_eq!(t.repo.purge_all("fruits").unwrap(), 0);

    let ledger = t.repo.get_ledger("fruits").unwrap().unwrap();
    assert_eq!(ledger.description.as_deref(), Some("orchard"));
}

#[test]
fn test_delete_ledger_cascades() {
    let t = TempRepo::new();
    t.repo
        .set_many("fruits", &fruit_batch(&[("a", "apple")]), None)
        .unwrap();
    assert!(t.repo.delete_ledger("fruits").unwrap());
    assert_eq!(t.repo.size("fruits").unwrap(), -1);
    assert!(!t.repo.delete_ledger("fruits").unwrap());
    assert!(t.repo.list_ledgers().unwrap().is_empty());
    t.repo.store().check_integrity().unwrap();
}

#[test]
fn test_contains_queries() {
    let t = TempRepo::new();
    t.repo.set_one("fruits", "a", "apple", None, None, None).unwrap();
    t.repo.set_one("fruits", "a", "apricot", None, None, None).unwrap();

    assert!(t.repo.contains_active_key("fruits", "a").unwrap());
    assert!(!t.repo.contains_active_key("fruits", "b").unwrap());
    assert!(t.repo.contains_active_value("fruits", Some("apricot")).unwrap());
    // Superseded values are not active.
    assert!(!t.repo.contains_active_value("fruits", Some("apple")).unwrap());
}

#[test]
fn test_json_documents() {
    let t = TempRepo::new();
    let err = t
        .repo
        .set_json("fruits", r#"["apple","banana"]"#, None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
    assert_eq!(t.repo.size("fruits").unwrap(), -1);

    t.repo
        .set_json(
            "fruits",
            r#"{"a":"apple","entryDescriptions":{"a":"desc","z":"ignored"}}"#,
            None,
        )
        .unwrap();
    let ledger = t.repo.get_ledger("fruits").unwrap().unwrap();
    assert_eq!(ledger.entries.len(), 1);
    assert_eq!(
        ledger.active_entry("a").and_then(|e| e.description.as_deref()),
        Some("desc")
    );
    assert!(ledger.active_entry("z").is_none());

    assert_eq!(t.repo.get_json("fruits", false).unwrap(), r#"{"a":"apple"}"#);
    assert!(matches!(
        t.repo.get_json("nope", true),
        Err(LedgerError::NotFound(_))
    ));
}

#[test]
fn test_changes_visible_across_connections() {
    let t = TempRepo::new();
    let other = t.reopen();
    t.repo.set_one("settings", "timeout", 30_u32, None, None, None).unwrap();
    assert_eq!(
        other.get_active_value("settings", "timeout").unwrap(),
        Some(Some("30".to_string()))
    );

    other.set_one("settings", "timeout", 45_u32, None, None, None).unwrap();
    assert_eq!(
        t.repo.get_active_value("settings", "timeout").unwrap(),
        Some(Some("45".to_string()))
    );
}

#[test]
fn test_concurrent_writers_keep_each_others_history() {
    let t = TempRepo::new();
    let other = t.reopen();
    t.repo.set_one("fruits", "a", "apple", None, None, None).unwrap();

    // The second connection writes key `a` while the first is midway through
    // its own read-modify-write of the same ledger.
    let rival = thread::scope(|s| {
        let rival = t
            .repo
            .store()
            .update_ledger("fruits", |current| {
                let mut ledger = current.expect("ledger was created");
                let rival = s.spawn(|| other.set_one("fruits", "a", "apricot", None, None, None));
                thread::sleep(Duration::from_millis(100));
                apply_entry(&mut ledger, "b", Some("banana".to_string()), None, None);
                Ok((rival, Some(ledger)))
            })
            .unwrap();
        rival.join().expect("rival writer panicked")
    })
    .unwrap();
    assert_eq!(rival.key_version, 2);

    let history = t.repo.history("fruits", "a").unwrap().unwrap();
    let chain: Vec<(i64, &str, bool)> = history
        .iter()
        .map(|e| (e.key_version, e.value.as_deref().unwrap(), e.active))
        .collect();
    assert_eq!(chain, vec![(1, "apple", false), (2, "apricot", true)]);
    assert_eq!(
        t.repo.get_active_map("fruits").unwrap().unwrap(),
        expected(&[("a", "apricot"), ("b", "banana")])
    );
    t.repo.store().check_integrity().unwrap();
}

#[test]
fn test_interleaved_set_one_from_two_connections() {
    let t = TempRepo::new();
    let other = t.reopen();

    thread::scope(|s| {
        let first = s.spawn(|| {
            for i in 0..20 {
                t.repo
                    .set_one("counters", "x", i, None, None, None)
                    .unwrap();
            }
        });
        let second = s.spawn(|| {
            for i in 0..20 {
                other.set_one("counters", "y", i, None, None, None).unwrap();
            }
        });
        first.join().unwrap();
        second.join().unwrap();
    });

    for key in ["x", "y"] {
        let history = t.repo.history("counters", key).unwrap().unwrap();
        let versions: Vec<i64> = history.iter().map(|e| e.key_version).collect();
        assert_eq!(versions, (1..=20).collect::<Vec<i64>>());
        assert_eq!(history.iter().filter(|e| e.active).count(), 1);
    }
    t.repo.store().check_integrity().unwrap();
}
