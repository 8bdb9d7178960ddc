use std::sync::Arc;

use swiftlaunch_core::history_cache::{HistoryCache, RecordPolicy};
use swiftlaunch_core::history_store::{HistoryStore, SqliteHistoryStore};
use swiftlaunch_core::model::CandidateKind;
use swiftlaunch_core::reconcile::ReconcileWorker;

fn file_kind(path: &str) -> CandidateKind {
    CandidateKind::File {
        path: path.to_string(),
        is_folder: false,
    }
}

#[test]
fn persisted_uses_come_back_with_backend_counts() {
    let cache = Arc::new(HistoryCache::new(RecordPolicy::default()));
    let store: Arc<SqliteHistoryStore> = Arc::new(SqliteHistoryStore::open_memory().unwrap());
    let worker = ReconcileWorker::spawn(cache.clone(), store.clone());
    let handle = worker.handle();

    for round in 0..3 {
        let key = cache
            .record_use("C:\\Tools\\App.exe", &file_kind("C:\\Tools\\App.exe"), round)
            .expect("use should record");
        handle.queue_use(&key);
    }
    worker.flush();

    let entries = cache.entries();
    assert_eq!(entries.len(), 1);
    // the mirror now reflects the backend-owned count
    assert_eq!(entries[0].use_count(), 3);
    assert!(cache.is_loaded());
}

#[test]
fn uses_recorded_during_inflight_reconcile_are_not_lost() {
    let cache = Arc::new(HistoryCache::new(RecordPolicy::default()));
    let store: Arc<SqliteHistoryStore> = Arc::new(SqliteHistoryStore::open_memory().unwrap());

    // a third path is already persisting/reconciling when two new uses land
    store.add_use("c:/third.txt").unwrap();
    let worker = ReconcileWorker::spawn(cache.clone(), store.clone());
    let handle = worker.handle();
    handle.queue_refresh();

    for path in ["C:\\First.txt", "C:\\Second.txt"] {
        let key = cache
            .record_use(path, &file_kind(path), 10)
            .expect("use should record");
        handle.queue_use(&key);
    }
    worker.flush();

    let entries = cache.entries();
    let mut paths: Vec<&str> = entries.iter().map(|entry| entry.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["c:/first.txt", "c:/second.txt", "c:/third.txt"]);
    assert!(entries.iter().all(|entry| entry.use_count() >= 1));
}

#[test]
fn queued_removal_drops_entry_from_backend_and_mirror() {
    let cache = Arc::new(HistoryCache::new(RecordPolicy::default()));
    let store: Arc<SqliteHistoryStore> = Arc::new(SqliteHistoryStore::open_memory().unwrap());
    store.add_use("c:/doomed.txt").unwrap();
    store.add_use("c:/kept.txt").unwrap();

    let worker = ReconcileWorker::spawn(cache.clone(), store.clone());
    let handle = worker.handle();
    handle.queue_refresh();
    handle.queue_remove("c:/doomed.txt");
    worker.flush();

    let entries = cache.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "c:/kept.txt");
    assert_eq!(store.list_all_history().unwrap().len(), 1);
}

#[test]
fn worker_shuts_down_cleanly_on_drop() {
    let cache = Arc::new(HistoryCache::new(RecordPolicy::default()));
    let store: Arc<SqliteHistoryStore> = Arc::new(SqliteHistoryStore::open_memory().unwrap());

    let worker = ReconcileWorker::spawn(cache.clone(), store);
    let key = cache
        .record_use("C:\\Last.txt", &file_kind("C:\\Last.txt"), 5)
        .expect("use should record");
    worker.handle().queue_use(&key);
    drop(worker);

    // the queue drained before the thread joined
    assert_eq!(cache.entries()[0].use_count(), 1);
}
