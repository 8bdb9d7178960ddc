use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Parse(error) => write!(f, "parse error: {error}"),
            Self::Invalid(error) => write!(f, "invalid config: {error}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub max_results: u16,
    pub history_db_path: PathBuf,
    #[serde(skip)]
    pub config_path: PathBuf,
    /// "Recent items" alias folders whose shortcuts never count as usage.
    pub recent_items_dirs: Vec<PathBuf>,
    /// Roots scanned for launchable application artifacts.
    pub app_roots: Vec<PathBuf>,
    pub plugin_paths: Vec<PathBuf>,
    pub launch_feedback_delay_ms: u64,
    pub web_search_template: String,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            max_results: 20,
            history_db_path: base.join("history.sqlite3"),
            config_path: base.join("config.toml"),
            recent_items_dirs: default_recent_items_dirs(),
            app_roots: Vec::new(),
            plugin_paths: Vec::new(),
            launch_feedback_delay_ms: 150,
            web_search_template: "https://duckduckgo.com/?q={query}".to_string(),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    if let Ok(local) = std::env::var("LOCALAPPDATA") {
        if !local.trim().is_empty() {
            return PathBuf::from(local).join("swiftlaunch");
        }
    }
    std::env::temp_dir().join("swiftlaunch")
}

fn default_recent_items_dirs() -> Vec<PathBuf> {
    match std::env::var("APPDATA") {
        Ok(appdata) if !appdata.trim().is_empty() => {
            vec![PathBuf::from(appdata).join("Microsoft\\Windows\\Recent")]
        }
        _ => Vec::new(),
    }
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.max_results < 5 || cfg.max_results > 100 {
        return Err(ConfigError::Invalid("max_results out of range".into()));
    }
    if cfg.history_db_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("history_db_path is required".into()));
    }
    if cfg.config_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("config_path is required".into()));
    }
    if cfg.launch_feedback_delay_ms > 2_000 {
        return Err(ConfigError::Invalid(
            "launch_feedback_delay_ms must be at most 2000".into(),
        ));
    }
    Ok(())
}

pub fn load(explicit_path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::default().config_path);

    if !config_path.exists() {
        let mut cfg = Config::default();
        cfg.config_path = config_path;
        validate(&cfg)?;
        return Ok(cfg);
    }

    let raw = std::fs::read_to_string(&config_path)?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|error| ConfigError::Parse(error.to_string()))?;
    cfg.config_path = config_path;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg)?;
    if let Some(parent) = cfg.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let encoded =
        toml::to_string_pretty(cfg).map_err(|error| ConfigError::Parse(error.to_string()))?;
    std::fs::write(&cfg.config_path, encoded)?;
    Ok(())
}
