//! Canonical path keys for identity comparison.
//!
//! History and index rows are keyed by `normalize`; `normalize_for_comparison`
//! additionally trims trailing separators and is only used for equality
//! checks, never as a storage key.

pub fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if is_opaque_identifier(trimmed) {
        return trimmed.to_string();
    }

    trimmed
        .chars()
        .map(|ch| if ch == '\\' { '/' } else { ch })
        .flat_map(|ch| ch.to_lowercase())
        .collect()
}

pub fn normalize_for_comparison(path: &str) -> String {
    let key = normalize(path);
    if is_opaque_identifier(&key) {
        return key;
    }

    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        // the path was nothing but separators; keep one so the key stays non-empty
        return "/".to_string();
    }
    trimmed.to_string()
}

/// Scheme-style identifiers (`ms-settings:display`, `shell:::{GUID}`) are
/// opaque tokens: case and separators are part of their meaning.
fn is_opaque_identifier(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    if lowered.starts_with("shell:") {
        return true;
    }

    let Some(colon) = value.find(':') else {
        return false;
    };

    // a single letter before ':' is a drive, not a scheme
    if colon < 2 {
        return false;
    }

    // separators before the colon mean it is a plain path segment
    !value[..colon].contains(['\\', '/'])
}
