use serde::{Deserialize, Serialize};

use crate::contract::{
    CandidateDto, CoreEvent, CoreRequest, CoreResponse, HistoryResponse, LaunchResponse,
    SearchResponse,
};
use crate::core_service::{filter_pruned, CoreService, RankedCandidate, ServiceError};
use crate::launch::LaunchOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
    ItemNotFound,
    Store,
    Config,
    Provider,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransportResponse {
    Ok { response: CoreResponse },
    Err { error: ErrorResponse },
}

/// One consumer's view of the core: the service plus the result list the
/// consumer is currently showing. Launch requests address that list by id,
/// and self-healing filters it in place.
pub struct TransportSession {
    service: CoreService,
    last_results: Vec<RankedCandidate>,
    seen_epoch: u64,
}

impl TransportSession {
    pub fn new(service: CoreService) -> Self {
        let seen_epoch = service.history_epoch();
        Self {
            service,
            last_results: Vec::new(),
            seen_epoch,
        }
    }

    pub fn service(&self) -> &CoreService {
        &self.service
    }

    pub fn handle_json(&mut self, payload: &str) -> String {
        let response = match serde_json::from_str::<CoreRequest>(payload) {
            Ok(request) => self.handle_request(request),
            Err(error) => TransportResponse::Err {
                error: ErrorResponse {
                    code: ErrorCode::InvalidJson,
                    message: error.to_string(),
                },
            },
        };

        serde_json::to_string(&response).expect("transport response should serialize")
    }

    pub fn handle_request(&mut self, request: CoreRequest) -> TransportResponse {
        match self.dispatch(request) {
            Ok(response) => TransportResponse::Ok { response },
            Err(error) => TransportResponse::Err {
                error: map_service_error(error),
            },
        }
    }

    /// The history-changed notification: one JSON event line whenever the
    /// mirror moved since the consumer last heard about it.
    pub fn poll_history_event(&mut self) -> Option<String> {
        let epoch = self.service.history_epoch();
        if epoch == self.seen_epoch {
            return None;
        }
        self.seen_epoch = epoch;
        let event = CoreEvent::HistoryChanged { epoch };
        Some(serde_json::to_string(&event).expect("event should serialize"))
    }

    fn dispatch(&mut self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::Search(search) => {
                let results = self
                    .service
                    .search(&search.query, search.limit.unwrap_or(0))?;
                let dtos: Vec<CandidateDto> = results.iter().map(CandidateDto::from).collect();
                self.last_results = results;
                Ok(CoreResponse::Search(SearchResponse { results: dtos }))
            }
            CoreRequest::Launch(launch) => {
                let id = launch.id.trim();
                if id.is_empty() {
                    return Err(ServiceError::InvalidRequest("launch id is empty".into()));
                }
                let selected = self
                    .last_results
                    .iter()
                    .find(|ranked| ranked.candidate.id == id)
                    .map(|ranked| ranked.candidate.clone())
                    .ok_or_else(|| ServiceError::ItemNotFound(id.to_string()))?;

                let outcome = self.service.launch(&selected);
                if let LaunchOutcome::SelfHealed { pruned_key, .. } = &outcome {
                    filter_pruned(&mut self.last_results, pruned_key);
                }
                Ok(CoreResponse::Launch(LaunchResponse::from(&outcome)))
            }
            CoreRequest::History => {
                let entries = self.service.history_entries();
                Ok(CoreResponse::History(HistoryResponse {
                    entries: entries.iter().map(Into::into).collect(),
                }))
            }
            CoreRequest::DeleteHistory(delete) => {
                let path = delete.path.trim();
                if path.is_empty() {
                    return Err(ServiceError::InvalidRequest("history path is empty".into()));
                }
                self.service.remove_history(path);
                let entries = self.service.history_entries();
                Ok(CoreResponse::DeleteHistory(HistoryResponse {
                    entries: entries.iter().map(Into::into).collect(),
                }))
            }
        }
    }
}

fn map_service_error(error: ServiceError) -> ErrorResponse {
    match error {
        ServiceError::InvalidRequest(message) => ErrorResponse {
            code: ErrorCode::InvalidRequest,
            message,
        },
        ServiceError::ItemNotFound(message) => ErrorResponse {
            code: ErrorCode::ItemNotFound,
            message,
        },
        ServiceError::Store(error) => ErrorResponse {
            code: ErrorCode::Store,
            message: error.to_string(),
        },
        ServiceError::Config(message) => ErrorResponse {
            code: ErrorCode::Config,
            message,
        },
        ServiceError::Provider(error) => ErrorResponse {
            code: ErrorCode::Provider,
            message: error.to_string(),
        },
    }
}
