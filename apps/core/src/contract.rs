use serde::{Deserialize, Serialize};

use crate::core_service::RankedCandidate;
use crate::launch::LaunchOutcome;
use crate::model::HistoryEntry;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateDto {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub path: String,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    pub results: Vec<CandidateDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchRequest {
    pub id: String,
}

/// Outcome of one launch attempt. `pruned` carries the comparison key of a
/// self-healed entry so consumers can drop it from any visible list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchResponse {
    pub launched: bool,
    pub hide_window: bool,
    pub pruned: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntryDto {
    pub path: String,
    pub display_name: String,
    pub last_used_epoch_secs: i64,
    pub use_count: u32,
    pub is_folder: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteHistoryRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    Search(SearchRequest),
    Launch(LaunchRequest),
    History,
    DeleteHistory(DeleteHistoryRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    Search(SearchResponse),
    Launch(LaunchResponse),
    History(HistoryResponse),
    DeleteHistory(HistoryResponse),
}

/// Out-of-band event emitted after reconciliation changes the mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreEvent {
    HistoryChanged { epoch: u64 },
}

impl From<&RankedCandidate> for CandidateDto {
    fn from(value: &RankedCandidate) -> Self {
        Self {
            id: value.candidate.id.clone(),
            kind: value.candidate.kind.tag().to_string(),
            title: value.candidate.title.clone(),
            path: value.candidate.target_path().unwrap_or_default().to_string(),
            score: value.score,
        }
    }
}

impl From<&HistoryEntry> for HistoryEntryDto {
    fn from(value: &HistoryEntry) -> Self {
        Self {
            path: value.path.clone(),
            display_name: value.display_name.clone(),
            last_used_epoch_secs: value.last_used_epoch_secs,
            use_count: value.use_count(),
            is_folder: value.is_folder,
        }
    }
}

impl From<&LaunchOutcome> for LaunchResponse {
    fn from(value: &LaunchOutcome) -> Self {
        match value {
            LaunchOutcome::Launched { hide_window } => Self {
                launched: true,
                hide_window: *hide_window,
                pruned: None,
                message: None,
            },
            LaunchOutcome::SelfHealed { pruned_key, message } => Self {
                launched: false,
                hide_window: false,
                pruned: Some(pruned_key.clone()),
                message: Some(message.clone()),
            },
            LaunchOutcome::Failed { message } => Self {
                launched: false,
                hide_window: false,
                pruned: None,
                message: Some(message.clone()),
            },
            LaunchOutcome::Ignored { reason } => Self {
                launched: false,
                hide_window: false,
                pruned: None,
                message: Some(reason.clone()),
            },
        }
    }
}
