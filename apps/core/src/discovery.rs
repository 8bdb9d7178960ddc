use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::model::{display_name_for_path, Candidate, CandidateKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Upstream candidate source. Providers return typed candidates; ranking and
/// history bonuses are applied downstream.
pub trait CandidateProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn discover(&self) -> Result<Vec<Candidate>, ProviderError>;
}

const APP_SCAN_DEPTH: usize = 4;

/// Installed applications, from fixed candidates or a directory scan over
/// configured roots filtered to launchable artifacts.
pub struct AppProvider {
    apps: Vec<Candidate>,
}

impl AppProvider {
    pub fn from_apps(apps: Vec<Candidate>) -> Self {
        Self { apps }
    }

    pub fn scan_roots(roots: &[PathBuf]) -> Self {
        let mut apps = Vec::new();
        for root in roots {
            scan_root(root, &mut apps);
        }
        Self { apps }
    }

    pub fn deterministic_fixture() -> Self {
        Self {
            apps: vec![
                Candidate::new(
                    "app-wechat",
                    "微信",
                    CandidateKind::App {
                        path: "C:\\Program Files\\Tencent\\WeChat\\WeChat.exe".to_string(),
                        is_running: false,
                    },
                )
                .with_pinyin("weixin", "wx"),
                Candidate::new(
                    "app-code",
                    "Visual Studio Code",
                    CandidateKind::App {
                        path: "C:\\Program Files\\Microsoft VS Code\\Code.exe".to_string(),
                        is_running: false,
                    },
                ),
                Candidate::new(
                    "app-settings-display",
                    "Display Settings",
                    CandidateKind::Settings {
                        uri: "ms-settings:display".to_string(),
                    },
                ),
            ],
        }
    }
}

impl CandidateProvider for AppProvider {
    fn provider_name(&self) -> &'static str {
        "app"
    }

    fn discover(&self) -> Result<Vec<Candidate>, ProviderError> {
        Ok(self.apps.clone())
    }
}

fn scan_root(root: &Path, out: &mut Vec<Candidate>) {
    if !root.is_dir() {
        return;
    }

    for entry in WalkDir::new(root)
        .max_depth(APP_SCAN_DEPTH)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_launchable_artifact(path) {
            continue;
        }
        let path_text = path.to_string_lossy().into_owned();
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| display_name_for_path(&path_text));
        out.push(Candidate::new(
            &format!("app:{path_text}"),
            &title,
            CandidateKind::App {
                path: path_text,
                is_running: false,
            },
        ));
    }
}

fn is_launchable_artifact(path: &Path) -> bool {
    matches!(
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .as_deref(),
        Some("exe") | Some("lnk")
    )
}

/// Known files, from fixtures or an injected list; real deployments feed
/// this from an external file index.
pub struct FileProvider {
    files: Vec<Candidate>,
}

impl FileProvider {
    pub fn from_files(files: Vec<Candidate>) -> Self {
        Self { files }
    }

    pub fn deterministic_fixture() -> Self {
        Self {
            files: vec![
                Candidate::new(
                    "file-report",
                    "Q4_Report.xlsx",
                    CandidateKind::File {
                        path: "C:\\Users\\Admin\\Documents\\Q4_Report.xlsx".to_string(),
                        is_folder: false,
                    },
                ),
                Candidate::new(
                    "file-docs",
                    "Documents",
                    CandidateKind::File {
                        path: "C:\\Users\\Admin\\Documents".to_string(),
                        is_folder: true,
                    },
                ),
            ],
        }
    }
}

impl CandidateProvider for FileProvider {
    fn provider_name(&self) -> &'static str {
        "file"
    }

    fn discover(&self) -> Result<Vec<Candidate>, ProviderError> {
        Ok(self.files.clone())
    }
}

/// Candidates derived from the query text itself: literal URLs, email
/// addresses to copy, and a web-search fallback.
pub fn derive_query_candidates(query: &str, web_search_template: &str) -> Vec<Candidate> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();

    if looks_like_url(trimmed) {
        let url = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        out.push(Candidate::new(
            &format!("url:{trimmed}"),
            trimmed,
            CandidateKind::Url { url },
        ));
    }

    if looks_like_email(trimmed) {
        out.push(Candidate::new(
            &format!("email:{trimmed}"),
            trimmed,
            CandidateKind::Email {
                address: trimmed.to_string(),
            },
        ));
    }

    if !web_search_template.trim().is_empty() && web_search_template.contains("{query}") {
        let url = web_search_template.replace("{query}", &url_encode_component(trimmed));
        out.push(Candidate::new(
            &format!("search:{trimmed}"),
            &format!("Search Web for \"{trimmed}\""),
            CandidateKind::WebSearch { url },
        ));
    }

    out
}

fn looks_like_url(value: &str) -> bool {
    if value.contains(char::is_whitespace) {
        return false;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return true;
    }
    if value.starts_with("www.") {
        return value.len() > 4;
    }
    // bare domain: at least one dot with alphanumeric segments on both sides
    let Some((head, tail)) = value.rsplit_once('.') else {
        return false;
    };
    !head.is_empty()
        && tail.len() >= 2
        && tail.chars().all(|ch| ch.is_ascii_alphabetic())
        && !head.contains('@')
}

fn looks_like_email(value: &str) -> bool {
    if value.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn url_encode_component(input: &str) -> String {
    let mut out = String::new();
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else if byte == b' ' {
            out.push('+');
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}
