use std::time::{SystemTime, UNIX_EPOCH};

use swiftlaunch_core::history_store::{HistoryStore, SqliteHistoryStore};

#[test]
fn add_use_inserts_then_increments() {
    let store = SqliteHistoryStore::open_memory().unwrap();

    store.add_use("C:\\Tools\\App.exe").unwrap();
    store.add_use("c:/tools/app.exe").unwrap();
    store.add_use("C:\\Tools\\Other.exe").unwrap();

    let entries = store.list_all_history().unwrap();
    assert_eq!(entries.len(), 2);

    let app = entries
        .iter()
        .find(|entry| entry.path == "c:/tools/app.exe")
        .expect("normalized entry should exist");
    assert_eq!(app.use_count(), 2);
    assert_eq!(app.display_name, "app.exe");
}

#[test]
fn delete_history_tolerates_missing_rows() {
    let store = SqliteHistoryStore::open_memory().unwrap();
    assert!(store.delete_history("c:/never-seen.exe").is_ok());

    store.add_use("c:/seen.exe").unwrap();
    store.delete_history("C:\\Seen.exe").unwrap();
    assert!(store.list_all_history().unwrap().is_empty());
}

#[test]
fn index_entries_round_trip_and_remove() {
    let store = SqliteHistoryStore::open_memory().unwrap();

    store
        .upsert_index_entry("C:\\Program Files\\App\\App.exe", "App")
        .unwrap();
    assert_eq!(
        store
            .index_title("c:/program files/app/app.exe")
            .unwrap()
            .as_deref(),
        Some("App")
    );

    store
        .remove_from_index("C:\\Program Files\\App\\App.exe")
        .unwrap();
    assert!(store
        .index_title("c:/program files/app/app.exe")
        .unwrap()
        .is_none());
}

#[test]
fn history_persists_across_reopen() {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let db_path = std::env::temp_dir()
        .join("swiftlaunch")
        .join(format!("store-reopen-{unique}.sqlite3"));

    {
        let store = SqliteHistoryStore::open_file(&db_path).unwrap();
        store.add_use("c:/docs/report.xlsx").unwrap();
        store.add_use("c:/docs/report.xlsx").unwrap();
    }

    let reopened = SqliteHistoryStore::open_file(&db_path).unwrap();
    let entries = reopened.list_all_history().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].use_count(), 2);

    std::fs::remove_file(&db_path).unwrap();
}
