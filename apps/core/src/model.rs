use std::time::{SystemTime, UNIX_EPOCH};

/// One selectable, typed search result. Immutable once constructed; a fresh
/// list is built per query and discarded after selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub kind: CandidateKind,
    pub pinyin_full: Option<String>,
    pub pinyin_initials: Option<String>,
}

/// Exactly one payload per variant; dispatch over kinds is an exhaustive
/// match, not a tag-string comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateKind {
    App { path: String, is_running: bool },
    File { path: String, is_folder: bool },
    Everything { path: String, is_folder: bool },
    Url { url: String },
    Email { address: String },
    WebSearch { url: String },
    Plugin { plugin_id: String, command: String, args: Vec<String> },
    Settings { uri: String },
    HistoryPanel,
    Memo,
    JsonFormatter,
}

impl Candidate {
    pub fn new(id: &str, title: &str, kind: CandidateKind) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            kind,
            pinyin_full: None,
            pinyin_initials: None,
        }
    }

    pub fn with_pinyin(mut self, full: &str, initials: &str) -> Self {
        self.pinyin_full = Some(full.to_string());
        self.pinyin_initials = Some(initials.to_string());
        self
    }

    /// The path-like identifier this candidate launches, when it has one.
    pub fn target_path(&self) -> Option<&str> {
        match &self.kind {
            CandidateKind::App { path, .. }
            | CandidateKind::File { path, .. }
            | CandidateKind::Everything { path, .. } => Some(path),
            CandidateKind::Url { url } | CandidateKind::WebSearch { url } => Some(url),
            CandidateKind::Settings { uri } => Some(uri),
            CandidateKind::Email { address } => Some(address),
            CandidateKind::Plugin { .. }
            | CandidateKind::HistoryPanel
            | CandidateKind::Memo
            | CandidateKind::JsonFormatter => None,
        }
    }
}

impl CandidateKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::App { .. } => "app",
            Self::File { .. } => "file",
            Self::Everything { .. } => "everything",
            Self::Url { .. } => "url",
            Self::Email { .. } => "email",
            Self::WebSearch { .. } => "search",
            Self::Plugin { .. } => "plugin",
            Self::Settings { .. } => "settings",
            Self::HistoryPanel => "history",
            Self::Memo => "memo",
            Self::JsonFormatter => "json_formatter",
        }
    }

    pub fn is_app(&self) -> bool {
        matches!(self, Self::App { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::App { is_running: true, .. })
    }

    /// In-place views keep the launcher window open after a successful launch.
    pub fn keeps_window_open(&self) -> bool {
        matches!(self, Self::HistoryPanel | Self::Memo | Self::JsonFormatter)
    }
}

/// A persisted record of a previously used path. `use_count` is owned by the
/// backend store: there is no public setter, and the only constructor that
/// accepts a count is the one reconciliation uses for store rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub path: String,
    pub display_name: String,
    pub last_used_epoch_secs: i64,
    use_count: u32,
    pub is_folder: Option<bool>,
}

impl HistoryEntry {
    /// Fresh optimistic entry for a use the backend has not confirmed yet.
    pub fn new_local(path: &str, display_name: &str, last_used_epoch_secs: i64) -> Self {
        Self {
            path: path.to_string(),
            display_name: display_name.to_string(),
            last_used_epoch_secs,
            use_count: 0,
            is_folder: None,
        }
    }

    /// Authoritative row from the backend store.
    pub fn from_store_row(
        path: &str,
        display_name: &str,
        last_used_epoch_secs: i64,
        use_count: u32,
        is_folder: Option<bool>,
    ) -> Self {
        Self {
            path: path.to_string(),
            display_name: display_name.to_string(),
            last_used_epoch_secs,
            use_count,
            is_folder,
        }
    }

    pub fn use_count(&self) -> u32 {
        self.use_count
    }
}

/// Immutable per-query snapshot of the signals the scorer fuses. Built once
/// per candidate from the query and a history snapshot, never mutated
/// mid-computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreContext {
    pub query: String,
    pub use_count: Option<u32>,
    pub last_used_epoch_secs: Option<i64>,
    pub now_epoch_secs: i64,
    pub is_running: bool,
    pub is_app: bool,
    pub pinyin_full: Option<String>,
    pub pinyin_initials: Option<String>,
    pub is_history_item: bool,
}

impl ScoreContext {
    pub fn for_query(query: &str, now_epoch_secs: i64) -> Self {
        Self {
            query: query.to_string(),
            use_count: None,
            last_used_epoch_secs: None,
            now_epoch_secs,
            is_running: false,
            is_app: false,
            pinyin_full: None,
            pinyin_initials: None,
            is_history_item: false,
        }
    }

    pub fn with_usage(mut self, use_count: u32, last_used_epoch_secs: i64) -> Self {
        self.use_count = Some(use_count);
        self.last_used_epoch_secs = Some(last_used_epoch_secs);
        self.is_history_item = true;
        self
    }
}

pub fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn display_name_for_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    unified
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_string()
}
