use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::model::{display_name_for_path, CandidateKind, HistoryEntry};
use crate::path_key::{normalize, normalize_for_comparison};

/// In-memory mirror of the backend history store, keyed by normalized path.
///
/// The mirror may briefly run ahead of the store (optimistic `last_used`),
/// but identity never diverges: one entry per normalized key. `use_count` is
/// read-only here and only overwritten wholesale by `reconcile`.
pub struct HistoryCache {
    state: Mutex<CacheState>,
    epoch: AtomicU64,
    policy: RecordPolicy,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, HistoryEntry>,
    open_index: HashMap<String, i64>,
    loaded: bool,
}

/// Decides which uses count as "opened a target" at all.
#[derive(Debug, Clone, Default)]
pub struct RecordPolicy {
    pub recent_items_dirs: Vec<String>,
}

impl RecordPolicy {
    /// Ephemeral kinds are transient actions, not opened targets. Apps only
    /// count when the path is a real file artifact outside the shell's
    /// "Recent items" alias folder.
    pub fn should_record(&self, kind: &CandidateKind, path: &str) -> bool {
        match kind {
            CandidateKind::File { .. } | CandidateKind::Everything { .. } | CandidateKind::Url { .. } => {
                !path.trim().is_empty()
            }
            CandidateKind::App { .. } => self.is_recordable_app_path(path),
            CandidateKind::Email { .. }
            | CandidateKind::WebSearch { .. }
            | CandidateKind::Plugin { .. }
            | CandidateKind::Settings { .. }
            | CandidateKind::HistoryPanel
            | CandidateKind::Memo
            | CandidateKind::JsonFormatter => false,
        }
    }

    fn is_recordable_app_path(&self, path: &str) -> bool {
        let key = normalize(path);
        if !(key.ends_with(".exe") || key.ends_with(".lnk")) {
            return false;
        }
        !self
            .recent_items_dirs
            .iter()
            .any(|dir| {
                let dir_key = normalize_for_comparison(dir);
                !dir_key.is_empty() && key.starts_with(&format!("{dir_key}/"))
            })
    }
}

impl HistoryCache {
    pub fn new(policy: RecordPolicy) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            epoch: AtomicU64::new(0),
            policy,
        }
    }

    /// Optimistic local update for one use. Returns the normalized key when
    /// the use was recorded, `None` when the policy excluded it.
    ///
    /// `last_used` moves forward immediately; `use_count` is left to the
    /// backend and only changes on `reconcile`. An existence check against
    /// the normalized key keeps concurrent calls for the same path from
    /// double-inserting.
    pub fn record_use(&self, path: &str, kind: &CandidateKind, now_epoch_secs: i64) -> Option<String> {
        if !self.policy.should_record(kind, path) {
            return None;
        }

        let key = normalize(path);
        if key.is_empty() {
            return None;
        }

        let mut state = self.lock_state();
        match state.entries.get_mut(&key) {
            Some(entry) => {
                entry.last_used_epoch_secs = entry.last_used_epoch_secs.max(now_epoch_secs);
            }
            None => {
                let display_name = display_name_for_path(path);
                let mut entry = HistoryEntry::new_local(&key, &display_name, now_epoch_secs);
                if let CandidateKind::File { is_folder, .. } | CandidateKind::Everything { is_folder, .. } =
                    kind
                {
                    entry.is_folder = Some(*is_folder);
                }
                state.entries.insert(key.clone(), entry);
            }
        }
        state.open_index.insert(key.clone(), now_epoch_secs);
        drop(state);

        self.bump_epoch();
        Some(key)
    }

    /// Replace the mirror with the authoritative store snapshot. Last write
    /// wins; the open index is rebuilt from the new entries.
    pub fn reconcile(&self, entries: Vec<HistoryEntry>) {
        let mut state = self.lock_state();
        state.entries.clear();
        state.open_index.clear();
        for entry in entries {
            let key = normalize(&entry.path);
            if key.is_empty() {
                continue;
            }
            state.open_index.insert(key.clone(), entry.last_used_epoch_secs);
            let mut stored = entry;
            stored.path = key.clone();
            state.entries.insert(key, stored);
        }
        state.loaded = true;
        drop(state);

        self.bump_epoch();
    }

    /// Drop an entry from mirror and open index; used by self-healing.
    pub fn remove_entry(&self, path: &str) {
        let key = normalize(path);
        let mut state = self.lock_state();
        let removed = state.entries.remove(&key).is_some();
        state.open_index.remove(&key);
        drop(state);

        if removed {
            self.bump_epoch();
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.lock_state().loaded
    }

    /// Monotonic change counter for result-list consumers.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        let state = self.lock_state();
        HistorySnapshot {
            by_key: state
                .entries
                .iter()
                .map(|(key, entry)| {
                    (
                        key.clone(),
                        UsageSignals {
                            use_count: entry.use_count(),
                            last_used_epoch_secs: entry.last_used_epoch_secs,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Entries sorted by recency, newest first, for the history panel.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let state = self.lock_state();
        let mut entries: Vec<HistoryEntry> = state.entries.values().cloned().collect();
        entries.sort_by(|a, b| {
            b.last_used_epoch_secs
                .cmp(&a.last_used_epoch_secs)
                .then_with(|| a.path.cmp(&b.path))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

/// Read-only usage view handed to the ranking layer; one clone per query so
/// scoring never holds the cache lock.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    by_key: HashMap<String, UsageSignals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSignals {
    pub use_count: u32,
    pub last_used_epoch_secs: i64,
}

impl HistorySnapshot {
    pub fn signals_for(&self, raw_path: &str) -> Option<UsageSignals> {
        self.by_key.get(&normalize(raw_path)).copied()
    }

    pub fn contains(&self, raw_path: &str) -> bool {
        self.by_key.contains_key(&normalize(raw_path))
    }
}
