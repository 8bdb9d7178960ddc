use std::time::{SystemTime, UNIX_EPOCH};

use swiftlaunch_core::config::{self, Config};

#[test]
fn accepts_default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.max_results, 20);
    assert!(cfg.history_db_path.to_string_lossy().contains("swiftlaunch"));
    assert!(cfg.config_path.to_string_lossy().contains("swiftlaunch"));
    assert!(config::validate(&cfg).is_ok());
}

#[test]
fn rejects_max_results_out_of_range() {
    let cfg = Config {
        max_results: 200,
        ..Default::default()
    };
    assert!(config::validate(&cfg).is_err());

    let cfg = Config {
        max_results: 2,
        ..Default::default()
    };
    assert!(config::validate(&cfg).is_err());
}

#[test]
fn rejects_excessive_feedback_delay() {
    let cfg = Config {
        launch_feedback_delay_ms: 60_000,
        ..Default::default()
    };
    assert!(config::validate(&cfg).is_err());
}

#[test]
fn save_and_load_round_trip() {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let config_path = std::env::temp_dir()
        .join("swiftlaunch")
        .join(format!("cfg-roundtrip-{unique}.toml"));

    let mut cfg = Config::default();
    cfg.config_path = config_path.clone();
    cfg.max_results = 42;
    cfg.web_search_template = "https://www.bing.com/search?q={query}".to_string();
    config::save(&cfg).unwrap();

    let loaded = config::load(Some(&config_path)).unwrap();
    assert_eq!(loaded.max_results, 42);
    assert_eq!(loaded.web_search_template, "https://www.bing.com/search?q={query}");
    assert_eq!(loaded.config_path, config_path);

    std::fs::remove_file(&config_path).unwrap();
}

#[test]
fn loading_missing_file_yields_defaults_bound_to_that_path() {
    let config_path = std::env::temp_dir()
        .join("swiftlaunch")
        .join("does-not-exist.toml");

    let cfg = config::load(Some(&config_path)).unwrap();
    assert_eq!(cfg.max_results, 20);
    assert_eq!(cfg.config_path, config_path);
}
