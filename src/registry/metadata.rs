// SPDX-License-Identifier: MIT
//! Metadata sidecar model and reconciliation.
//!
//! The registry is the sole writer of the *default* sidecar. Anything else —
//! the settings endpoint, a hand edit — may overwrite it afterwards, so a
//! sidecar is read as a partial record: known keys are merged field-by-field,
//! unknown or wrong-typed keys are preserved under `extra`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::METADATA_FILE;

/// `instructions` appears in sidecars both as a single string and as a list
/// of steps. Accept either; [`Instructions::into_list`] is the canonical form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Instructions {
    One(String),
    Many(Vec<String>),
}

impl Instructions {
    pub fn into_list(self) -> Vec<String> {
        match self {
            Instructions::One(step) => vec![step],
            Instructions::Many(steps) => steps,
        }
    }
}

/// Validated view of one `metadata.json`.
///
/// Every field is optional on disk; [`ProjectMetadata::default_for`] fills
/// them all when the registry synthesizes a sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
    /// Sidecar keys the gallery does not recognize, kept out of the
    /// descriptor's top level so they can never shadow `id`/`path`/etc.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ProjectMetadata {
    /// The template written for a project that has no sidecar yet.
    pub fn default_for(name: &str) -> Self {
        Self {
            title: Some(name.to_string()),
            description: Some(format!("{name} AR experience")),
            author: Some("AR Projects Team".to_string()),
            version: Some("1.0.0".to_string()),
            technologies: vec![
                "A-Frame".to_string(),
                "AR.js".to_string(),
                "WebXR".to_string(),
            ],
            instructions: vec!["Allow camera access when prompted".to_string()],
            extra: BTreeMap::new(),
        }
    }
}

/// Read the project's sidecar, creating the default one when absent.
///
/// Returns `None` when a sidecar exists but cannot be used (malformed JSON,
/// non-object top level, unreadable file) — the caller serves the project
/// without metadata for this scan and the file is left untouched. A failed
/// write of the default template is logged and retried on the next scan; the
/// in-memory value still backs the current response.
pub(crate) fn reconcile(project_dir: &Path, name: &str) -> Option<ProjectMetadata> {
    let path = project_dir.join(METADATA_FILE);
    match fs::read_to_string(&path) {
        Ok(raw) => match parse_sidecar(&raw) {
            Some(meta) => Some(meta),
            None => {
                warn!(
                    file = %path.display(),
                    "malformed metadata sidecar — serving project without metadata"
                );
                None
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let meta = ProjectMetadata::default_for(name);
            match serde_json::to_string_pretty(&meta) {
                Ok(json) => {
                    if let Err(e) = fs::write(&path, json) {
                        warn!(
                            file = %path.display(),
                            err = %e,
                            "could not persist default metadata — will retry on next scan"
                        );
                    } else {
                        info!(project = %name, "created default metadata sidecar");
                    }
                }
                Err(e) => warn!(project = %name, err = %e, "could not serialize default metadata"),
            }
            Some(meta)
        }
        Err(e) => {
            warn!(file = %path.display(), err = %e, "cannot read metadata sidecar");
            None
        }
    }
}

fn parse_sidecar(raw: &str) -> Option<ProjectMetadata> {
    let mut map = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };

    let mut meta = ProjectMetadata::default();
    meta.title = take_string(&mut map, "title", &mut meta.extra);
    meta.description = take_string(&mut map, "description", &mut meta.extra);
    meta.author = take_string(&mut map, "author", &mut meta.extra);
    meta.version = take_string(&mut map, "version", &mut meta.extra);

    if let Some(value) = map.remove("technologies") {
        match serde_json::from_value::<Vec<String>>(value.clone()) {
            Ok(list) => meta.technologies = list,
            Err(_) => {
                meta.extra.insert("technologies".to_string(), value);
            }
        }
    }
    if let Some(value) = map.remove("instructions") {
        match serde_json::from_value::<Instructions>(value.clone()) {
            Ok(ins) => meta.instructions = ins.into_list(),
            Err(_) => {
                meta.extra.insert("instructions".to_string(), value);
            }
        }
    }

    meta.extra.extend(map);
    Some(meta)
}

/// Pull a string field out of the sidecar; a present-but-wrong-typed value is
/// preserved in `extra` instead of being dropped.
fn take_string(
    map: &mut Map<String, Value>,
    key: &str,
    extra: &mut BTreeMap<String, Value>,
) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            extra.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
