use std::sync::Arc;
use std::time::Duration;

use crate::history_cache::HistoryCache;
use crate::history_store::HistoryStore;
use crate::host_actions::{HostActions, HostError, InternalView};
use crate::logging;
use crate::model::{now_epoch_secs, Candidate, CandidateKind};
use crate::path_key::normalize_for_comparison;
use crate::reconcile::WorkerHandle;

/// Terminal states of one launch attempt; the dispatcher returns to idle
/// after each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Host action succeeded. `hide_window` is false for in-place views.
    Launched { hide_window: bool },
    /// Target is gone; the stale entry was pruned from index and history.
    SelfHealed { pruned_key: String, message: String },
    /// Unclassified host failure, surfaced verbatim, nothing destroyed.
    Failed { message: String },
    /// Malformed candidate; defensive no-op.
    Ignored { reason: String },
}

pub struct LaunchDispatcher {
    cache: Arc<HistoryCache>,
    store: Arc<dyn HistoryStore>,
    host: Arc<dyn HostActions>,
    worker: WorkerHandle,
    feedback_delay: Duration,
}

impl LaunchDispatcher {
    pub fn new(
        cache: Arc<HistoryCache>,
        store: Arc<dyn HistoryStore>,
        host: Arc<dyn HostActions>,
        worker: WorkerHandle,
        feedback_delay: Duration,
    ) -> Self {
        Self {
            cache,
            store,
            host,
            worker,
            feedback_delay,
        }
    }

    /// One launch attempt: record the use optimistically, queue persistence
    /// without blocking, invoke exactly one host action, classify failures.
    pub fn dispatch(&self, candidate: &Candidate) -> LaunchOutcome {
        let action = match plan_action(candidate) {
            Ok(action) => action,
            Err(reason) => {
                logging::warn(&format!(
                    "ignoring malformed candidate '{}' ({}): {reason}",
                    candidate.id,
                    candidate.kind.tag()
                ));
                return LaunchOutcome::Ignored { reason };
            }
        };

        if let Some(path) = candidate.target_path() {
            if let Some(key) = self.cache.record_use(path, &candidate.kind, now_epoch_secs()) {
                self.worker.queue_use(&key);
            }
        }

        if candidate.kind.is_app() && !self.feedback_delay.is_zero() {
            // brief visual feedback before the app steals focus
            std::thread::sleep(self.feedback_delay);
        }

        match self.invoke(&action) {
            Ok(()) => LaunchOutcome::Launched {
                hide_window: !candidate.kind.keeps_window_open(),
            },
            Err(error) if error.is_target_missing() => self.self_heal(candidate, &error),
            Err(error) => {
                logging::warn(&format!(
                    "launch failed for '{}' ({}): {error}",
                    candidate.id,
                    candidate.kind.tag()
                ));
                LaunchOutcome::Failed {
                    message: error.message,
                }
            }
        }
    }

    fn invoke(&self, action: &HostAction) -> Result<(), HostError> {
        match action {
            HostAction::LaunchApplication(path) => self.host.launch_application(path),
            HostAction::LaunchFile(path) => self.host.launch_file(path),
            HostAction::OpenUrl(url) => self.host.open_url(url),
            HostAction::CopyText(text) => self.host.copy_to_clipboard(text),
            HostAction::OpenView(view) => self.host.open_view(*view),
            HostAction::RunPlugin { plugin_id, command, args } => {
                self.host.run_plugin(plugin_id, command, args)
            }
        }
    }

    /// Best-effort double delete: the index removal and the history removal
    /// run independently and are joined; neither failure blocks the other,
    /// and a history miss is expected (the entry may never have existed).
    fn self_heal(&self, candidate: &Candidate, error: &HostError) -> LaunchOutcome {
        let path = candidate.target_path().unwrap_or(&candidate.id).to_string();
        let pruned_key = normalize_for_comparison(&path);

        // let the optimistic persist for this very launch land first, so the
        // deletes below are not overtaken by it
        self.worker.flush();

        let (index_result, history_result) = std::thread::scope(|scope| {
            let index_task = scope.spawn(|| self.store.remove_from_index(&path));
            let history_task = scope.spawn(|| self.store.delete_history(&path));
            (
                index_task.join().unwrap_or_else(|_| {
                    Err(crate::history_store::StoreError::Unavailable(
                        "index removal panicked".to_string(),
                    ))
                }),
                history_task.join().unwrap_or_else(|_| {
                    Err(crate::history_store::StoreError::Unavailable(
                        "history removal panicked".to_string(),
                    ))
                }),
            )
        });

        if let Err(store_error) = index_result {
            logging::warn(&format!("stale index removal failed for {path}: {store_error}"));
        }
        if let Err(store_error) = history_result {
            // tolerated: the path may never have been in history
            logging::info(&format!("stale history removal skipped for {path}: {store_error}"));
        }

        self.cache.remove_entry(&path);

        logging::info(&format!(
            "pruned stale entry '{}' after: {}",
            candidate.title, error.message
        ));
        LaunchOutcome::SelfHealed {
            pruned_key,
            message: format!("'{}' no longer exists and was removed", candidate.title),
        }
    }
}

/// Exactly one host action per candidate, chosen by exhaustive match.
enum HostAction {
    LaunchApplication(String),
    LaunchFile(String),
    OpenUrl(String),
    CopyText(String),
    OpenView(InternalView),
    RunPlugin {
        plugin_id: String,
        command: String,
        args: Vec<String>,
    },
}

fn plan_action(candidate: &Candidate) -> Result<HostAction, String> {
    let action = match &candidate.kind {
        CandidateKind::App { path, .. } => {
            HostAction::LaunchApplication(required(path, "app path")?)
        }
        CandidateKind::File { path, .. } | CandidateKind::Everything { path, .. } => {
            HostAction::LaunchFile(required(path, "file path")?)
        }
        CandidateKind::Url { url } | CandidateKind::WebSearch { url } => {
            HostAction::OpenUrl(required(url, "url")?)
        }
        CandidateKind::Settings { uri } => {
            HostAction::LaunchApplication(required(uri, "settings uri")?)
        }
        CandidateKind::Email { address } => HostAction::CopyText(required(address, "email address")?),
        CandidateKind::Plugin { plugin_id, command, args } => HostAction::RunPlugin {
            plugin_id: required(plugin_id, "plugin id")?,
            command: required(command, "plugin command")?,
            args: args.clone(),
        },
        CandidateKind::HistoryPanel => HostAction::OpenView(InternalView::HistoryPanel),
        CandidateKind::Memo => HostAction::OpenView(InternalView::Memo),
        CandidateKind::JsonFormatter => HostAction::OpenView(InternalView::JsonFormatter),
    };
    Ok(action)
}

fn required(value: &str, what: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{what} is empty"));
    }
    Ok(trimmed.to_string())
}
