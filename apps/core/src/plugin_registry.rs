use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::Config;
use crate::discovery::{CandidateProvider, ProviderError};
use crate::model::{Candidate, CandidateKind};

/// Plugin commands loaded from manifest files. Manifests are written by
/// hand, so they are parsed leniently (json5: comments, trailing commas).
/// Execution stays behind the host-action surface.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    pub candidates: Vec<Candidate>,
    pub load_warnings: Vec<String>,
}

impl PluginRegistry {
    pub fn load_from_config(cfg: &Config) -> Self {
        let mut registry = Self::default();
        for root in &cfg.plugin_paths {
            for manifest_path in discover_manifest_paths(root) {
                match load_manifest(&manifest_path) {
                    Ok(manifest) => append_manifest(&mut registry, manifest),
                    Err(error) => registry.load_warnings.push(format!(
                        "plugin manifest '{}' failed: {error}",
                        manifest_path.display()
                    )),
                }
            }
        }
        registry
    }
}

pub struct PluginProvider {
    candidates: Vec<Candidate>,
}

impl PluginProvider {
    pub fn from_registry(registry: &PluginRegistry) -> Self {
        Self {
            candidates: registry.candidates.clone(),
        }
    }
}

impl CandidateProvider for PluginProvider {
    fn provider_name(&self) -> &'static str {
        "plugin"
    }

    fn discover(&self) -> Result<Vec<Candidate>, ProviderError> {
        Ok(self.candidates.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PluginManifest {
    id: String,
    name: String,
    enabled: bool,
    commands: Vec<ManifestCommand>,
}

impl Default for PluginManifest {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            enabled: true,
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestCommand {
    id: String,
    title: String,
    command: String,
    args: Vec<String>,
    pinyin: Option<String>,
    pinyin_initials: Option<String>,
}

fn discover_manifest_paths(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };

    let mut manifests: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.ends_with(".json5") || name == "plugin.json")
                .unwrap_or(false)
        })
        .collect();
    manifests.sort();
    manifests
}

fn load_manifest(path: &Path) -> Result<PluginManifest, String> {
    let raw = std::fs::read_to_string(path).map_err(|error| format!("read failed: {error}"))?;
    let manifest: PluginManifest =
        json5::from_str(&raw).map_err(|error| format!("parse failed: {error}"))?;
    if manifest.id.trim().is_empty() {
        return Err("manifest id is required".to_string());
    }
    Ok(manifest)
}

fn append_manifest(registry: &mut PluginRegistry, manifest: PluginManifest) {
    if !manifest.enabled {
        return;
    }

    for command in manifest.commands {
        if command.command.trim().is_empty() {
            registry.load_warnings.push(format!(
                "plugin '{}' command '{}' has no executable",
                manifest.id, command.id
            ));
            continue;
        }

        let title = if command.title.trim().is_empty() {
            format!("{}: {}", manifest.name, command.id)
        } else {
            command.title.clone()
        };
        let mut candidate = Candidate::new(
            &format!("plugin:{}:{}", manifest.id, command.id),
            &title,
            CandidateKind::Plugin {
                plugin_id: manifest.id.clone(),
                command: command.command.clone(),
                args: command.args.clone(),
            },
        );
        if let (Some(full), Some(initials)) = (&command.pinyin, &command.pinyin_initials) {
            candidate = candidate.with_pinyin(full, initials);
        }
        registry.candidates.push(candidate);
    }
}
