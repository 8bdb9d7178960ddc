use swiftlaunch_core::history_cache::{HistoryCache, RecordPolicy};
use swiftlaunch_core::model::{CandidateKind, HistoryEntry};

fn file_kind(path: &str) -> CandidateKind {
    CandidateKind::File {
        path: path.to_string(),
        is_folder: false,
    }
}

#[test]
fn raw_spellings_collapse_to_one_entry_with_latest_timestamp() {
    let cache = HistoryCache::new(RecordPolicy::default());

    let first = cache.record_use(
        "C:\\Users\\Test\\App.exe",
        &file_kind("C:\\Users\\Test\\App.exe"),
        1_000,
    );
    let second = cache.record_use(
        "c:/users/test/app.exe",
        &file_kind("c:/users/test/app.exe"),
        2_000,
    );
    assert_eq!(first.as_deref(), Some("c:/users/test/app.exe"));
    assert_eq!(second.as_deref(), Some("c:/users/test/app.exe"));

    let entries = cache.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].path, "c:/users/test/app.exe");
    assert_eq!(entries[0].last_used_epoch_secs, 2_000);
}

#[test]
fn optimistic_entries_never_count_locally() {
    let cache = HistoryCache::new(RecordPolicy::default());
    assert!(cache.record_use("C:\\A.txt", &file_kind("C:\\A.txt"), 10).is_some());
    assert!(cache.record_use("C:\\A.txt", &file_kind("C:\\A.txt"), 20).is_some());

    // counting is the backend's job; the mirror only moves last_used
    let entries = cache.entries();
    assert_eq!(entries[0].use_count(), 0);
    assert_eq!(entries[0].last_used_epoch_secs, 20);
}

#[test]
fn reconcile_replaces_mirror_with_store_truth() {
    let cache = HistoryCache::new(RecordPolicy::default());
    assert!(cache.record_use("C:\\Local.txt", &file_kind("C:\\Local.txt"), 50).is_some());

    cache.reconcile(vec![
        HistoryEntry::from_store_row("c:/a.txt", "a.txt", 100, 7, Some(false)),
        HistoryEntry::from_store_row("c:/b.txt", "b.txt", 200, 3, None),
    ]);

    assert!(cache.is_loaded());
    let entries = cache.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].path, "c:/b.txt");
    assert_eq!(entries[1].use_count(), 7);

    let snapshot = cache.snapshot();
    assert!(snapshot.contains("C:\\A.txt"));
    assert!(!snapshot.contains("C:\\Local.txt"));
}

#[test]
fn remove_entry_clears_mirror_and_open_index() {
    let cache = HistoryCache::new(RecordPolicy::default());
    assert!(cache.record_use("C:\\Gone.txt", &file_kind("C:\\Gone.txt"), 10).is_some());
    assert!(cache.snapshot().contains("c:/gone.txt"));

    cache.remove_entry("C:\\GONE.TXT");

    assert!(cache.is_empty());
    assert!(!cache.snapshot().contains("c:/gone.txt"));
}

#[test]
fn snapshot_reports_usage_signals_by_any_spelling() {
    let cache = HistoryCache::new(RecordPolicy::default());
    cache.reconcile(vec![HistoryEntry::from_store_row(
        "c:/tools/app.exe",
        "app.exe",
        1_234,
        9,
        None,
    )]);

    let snapshot = cache.snapshot();
    let signals = snapshot
        .signals_for("C:\\Tools\\App.exe")
        .expect("signals should resolve through normalization");
    assert_eq!(signals.use_count, 9);
    assert_eq!(signals.last_used_epoch_secs, 1_234);
}

#[test]
fn everything_results_record_like_files() {
    let cache = HistoryCache::new(RecordPolicy::default());
    let kind = CandidateKind::Everything {
        path: "C:\\Media\\clip.mp4".to_string(),
        is_folder: false,
    };

    let key = cache.record_use("C:\\Media\\clip.mp4", &kind, 42);

    assert_eq!(key.as_deref(), Some("c:/media/clip.mp4"));
    assert_eq!(cache.entries()[0].is_folder, Some(false));
}

#[test]
fn concurrent_record_use_for_distinct_paths_does_not_interfere() {
    let cache = std::sync::Arc::new(HistoryCache::new(RecordPolicy::default()));

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let cache = cache.clone();
            scope.spawn(move || {
                for round in 0..50 {
                    let path = format!("C:\\Docs\\file-{worker}-{round}.txt");
                    let _ = cache.record_use(&path, &file_kind(&path), round);
                }
            });
        }
    });

    assert_eq!(cache.len(), 200);
}

#[test]
fn concurrent_same_path_record_use_never_double_inserts() {
    let cache = std::sync::Arc::new(HistoryCache::new(RecordPolicy::default()));

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let cache = cache.clone();
            scope.spawn(move || {
                for round in 0..100 {
                    let _ = cache.record_use("C:\\Shared.txt", &file_kind("C:\\Shared.txt"), round);
                }
            });
        }
    });

    assert_eq!(cache.len(), 1);
}
