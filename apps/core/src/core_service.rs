use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{validate, Config};
use crate::discovery::{derive_query_candidates, CandidateProvider, ProviderError};
use crate::history_cache::{HistoryCache, HistorySnapshot, RecordPolicy};
use crate::history_store::{HistoryStore, SqliteHistoryStore, StoreError};
use crate::host_actions::{HostActions, SystemHost};
use crate::launch::{LaunchDispatcher, LaunchOutcome};
use crate::model::{now_epoch_secs, Candidate, HistoryEntry, ScoreContext};
use crate::path_key::{normalize, normalize_for_comparison};
use crate::reconcile::ReconcileWorker;
use crate::score;

#[derive(Debug)]
pub enum ServiceError {
    Config(String),
    Store(StoreError),
    Provider(ProviderError),
    ItemNotFound(String),
    InvalidRequest(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Store(error) => write!(f, "store error: {error}"),
            Self::Provider(error) => write!(f, "provider error: {error}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::InvalidRequest(error) => write!(f, "invalid request: {error}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ProviderError> for ServiceError {
    fn from(value: ProviderError) -> Self {
        Self::Provider(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub score: i64,
}

/// Owns the launch-and-reconcile subsystem: the cache, the store handle, the
/// background worker, and the dispatcher. Everything else sees read-only
/// snapshots and outcomes.
pub struct CoreService {
    config: Config,
    cache: Arc<HistoryCache>,
    store: Arc<dyn HistoryStore>,
    providers: Vec<Box<dyn CandidateProvider>>,
    // dispatcher before worker: its queue handle must drop first so the
    // worker thread can drain and join on shutdown
    dispatcher: LaunchDispatcher,
    worker: ReconcileWorker,
}

impl CoreService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        let store = Arc::new(SqliteHistoryStore::open_from_config(&config)?);
        Self::with_collaborators(config, store, Arc::new(SystemHost))
    }

    /// Test seam: inject the backend store and host surface.
    pub fn with_collaborators(
        config: Config,
        store: Arc<dyn HistoryStore>,
        host: Arc<dyn HostActions>,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(|error| ServiceError::Config(error.to_string()))?;

        let policy = RecordPolicy {
            recent_items_dirs: config
                .recent_items_dirs
                .iter()
                .map(|dir| dir.to_string_lossy().into_owned())
                .collect(),
        };
        let cache = Arc::new(HistoryCache::new(policy));
        let worker = ReconcileWorker::spawn(cache.clone(), store.clone());
        let dispatcher = LaunchDispatcher::new(
            cache.clone(),
            store.clone(),
            host,
            worker.handle(),
            Duration::from_millis(config.launch_feedback_delay_ms),
        );

        Ok(Self {
            config,
            cache,
            store,
            providers: Vec::new(),
            dispatcher,
            worker,
        })
    }

    pub fn add_provider(&mut self, provider: Box<dyn CandidateProvider>) {
        self.providers.push(provider);
    }

    /// Load the mirror from the authoritative store. Called once at startup;
    /// afterwards the worker keeps the mirror converged.
    pub fn hydrate(&self) -> Result<usize, ServiceError> {
        let entries = self.store.list_all_history()?;
        let count = entries.len();
        self.cache.reconcile(entries);
        Ok(count)
    }

    /// Rank provider candidates plus query-derived ones. A non-empty query
    /// requires a text-tier match; an empty query ranks on history bonuses
    /// alone, which is exactly the "recents" listing.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedCandidate>, ServiceError> {
        let max_results = self.config.max_results as usize;
        let effective_limit = if limit == 0 {
            max_results
        } else {
            limit.min(max_results)
        };
        if effective_limit == 0 {
            return Ok(Vec::new());
        }

        // a failed startup hydrate is retried here, off the query path
        if !self.cache.is_loaded() {
            self.worker.handle().queue_refresh();
        }

        let mut candidates = Vec::new();
        for provider in &self.providers {
            candidates.extend(provider.discover()?);
        }
        candidates.extend(derive_query_candidates(query, &self.config.web_search_template));

        let snapshot = self.cache.snapshot();
        let now = now_epoch_secs();
        let trimmed = query.trim();

        let mut scored: Vec<(i64, usize, Candidate)> = candidates
            .into_iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let context = self.context_for(&candidate, trimmed, &snapshot, now);
                let path = candidate.target_path().unwrap_or_default();
                let split = score::breakdown(&candidate.title, path, &context);
                let relevant = if trimmed.is_empty() {
                    split.bonus > 0
                } else {
                    split.text > 0
                };
                relevant.then(|| (split.total(), index, candidate))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        Ok(scored
            .into_iter()
            .take(effective_limit)
            .map(|(score, _, candidate)| RankedCandidate { candidate, score })
            .collect())
    }

    pub fn launch(&self, candidate: &Candidate) -> LaunchOutcome {
        self.dispatcher.dispatch(candidate)
    }

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.cache.entries()
    }

    /// Drop one history record everywhere: mirror now, backend via the
    /// worker queue.
    pub fn remove_history(&self, path: &str) {
        self.cache.remove_entry(path);
        self.worker.handle().queue_remove(&normalize(path));
    }

    /// Bumps whenever the mirror changes; result-list consumers re-render
    /// bonuses when it moves.
    pub fn history_epoch(&self) -> u64 {
        self.cache.epoch()
    }

    pub fn is_history_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    /// Drain the persistence queue. Teardown and tests only.
    pub fn flush_worker(&self) {
        self.worker.flush();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn context_for(
        &self,
        candidate: &Candidate,
        query: &str,
        snapshot: &HistorySnapshot,
        now: i64,
    ) -> ScoreContext {
        let mut context = ScoreContext::for_query(query, now);
        context.is_app = candidate.kind.is_app();
        context.is_running = candidate.kind.is_running();
        context.pinyin_full = candidate.pinyin_full.clone();
        context.pinyin_initials = candidate.pinyin_initials.clone();

        if let Some(path) = candidate.target_path() {
            if let Some(signals) = snapshot.signals_for(path) {
                context.use_count = Some(signals.use_count);
                context.last_used_epoch_secs = Some(signals.last_used_epoch_secs);
                context.is_history_item = true;
            }
        }
        context
    }
}

/// Drop every ranked result whose target collapses to the pruned key.
pub fn filter_pruned(results: &mut Vec<RankedCandidate>, pruned_key: &str) {
    results.retain(|ranked| match ranked.candidate.target_path() {
        Some(path) => normalize_for_comparison(path) != pruned_key,
        None => true,
    });
}
