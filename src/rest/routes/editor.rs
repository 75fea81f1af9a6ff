// SPDX-License-Identifier: MIT
//! Project editor API (debug capability).
//!
//! File read/write over project folders plus the metadata overwrite used by
//! the gallery settings panel. Every caller-supplied path goes through the
//! path guard before any filesystem access; the registry does not coordinate
//! with writes made here — it simply re-reads sidecars on the next scan.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::registry::{normalize_id, ENTRY_FILE, METADATA_FILE};
use crate::security;
use crate::AppContext;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("file path is required")]
    MissingPath,
    #[error("access denied")]
    AccessDenied,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("metadata must be a JSON object")]
    NotAnObject,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    fn status(&self) -> StatusCode {
        match self {
            EditorError::MissingPath | EditorError::NotAnObject => StatusCode::BAD_REQUEST,
            EditorError::AccessDenied => StatusCode::FORBIDDEN,
            EditorError::NotFound(_) => StatusCode::NOT_FOUND,
            EditorError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                StatusCode::FORBIDDEN
            }
            EditorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EditorError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("regex: html title"));

/// GET /debug/api/projects — lightweight listing for the editor sidebar,
/// with the display title scraped from each project's entry file. No sidecar
/// reconciliation here; the editor must not create files as a side effect of
/// listing.
pub async fn list_projects(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let mut projects = Vec::new();
    let entries = match std::fs::read_dir(ctx.registry.projects_dir()) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(err = %e, "editor cannot list projects root");
            return Json(json!(projects));
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let index = dir.join(ENTRY_FILE);
        if !index.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let title = std::fs::read_to_string(&index)
            .ok()
            .and_then(|html| {
                TITLE_RE
                    .captures(&html)
                    .map(|c| c[1].trim().to_string())
            })
            .unwrap_or_else(|| name.clone());

        projects.push(json!({
            "id": normalize_id(&name),
            "name": name,
            "title": title,
            "path": format!("/projects/{name}/{ENTRY_FILE}"),
        }));
    }

    Json(json!(projects))
}

#[derive(Deserialize)]
pub struct FileQuery {
    pub path: Option<String>,
}

/// GET /debug/api/project/{id}/file?path=<relative> — read a project file.
pub async fn load_file(
    State(ctx): State<Arc<AppContext>>,
    Path(_id): Path<String>,
    Query(query): Query<FileQuery>,
) -> Result<Json<Value>, EditorError> {
    let rel = query.path.ok_or(EditorError::MissingPath)?;
    let full = resolve(ctx.registry.projects_dir(), &rel)?;
    if !full.is_file() {
        return Err(EditorError::NotFound(rel));
    }
    let content = std::fs::read_to_string(&full)?;
    Ok(Json(json!({ "content": content })))
}

#[derive(Deserialize)]
pub struct SaveFileRequest {
    pub path: Option<String>,
    pub content: Option<String>,
}

/// POST /debug/api/project/{id}/file — overwrite an existing project file.
pub async fn save_file(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<SaveFileRequest>,
) -> Result<Json<Value>, EditorError> {
    let (Some(rel), Some(content)) = (body.path, body.content) else {
        return Err(EditorError::MissingPath);
    };
    let full = resolve(ctx.registry.projects_dir(), &rel)?;
    if !full.is_file() {
        return Err(EditorError::NotFound(rel));
    }
    std::fs::write(&full, content)?;
    info!(project = %id, file = %rel, "editor saved file");
    Ok(Json(json!({ "success": true })))
}

/// PUT /debug/api/project/{id}/metadata — replace a project's sidecar.
///
/// This is the "other writer" the registry tolerates: whatever object is
/// stored here is re-read as a partial record on the next scan. Non-object
/// bodies are rejected so a scan never meets a syntactically valid but
/// unusable sidecar of our own making.
pub async fn save_metadata(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, EditorError> {
    if !body.is_object() {
        return Err(EditorError::NotAnObject);
    }
    let root = ctx.registry.projects_dir();
    let dir = find_project_dir(root, &id).ok_or_else(|| EditorError::NotFound(id.clone()))?;

    let pretty = serde_json::to_string_pretty(&body)
        .map_err(|e| EditorError::Io(std::io::Error::other(e)))?;
    std::fs::write(dir.join(METADATA_FILE), pretty)?;
    info!(project = %id, "metadata sidecar replaced");
    Ok(Json(json!({ "success": true })))
}

fn resolve(root: &FsPath, rel: &str) -> Result<PathBuf, EditorError> {
    security::safe_path(root, FsPath::new(rel)).map_err(|e| {
        warn!(path = %rel, err = %e, "rejected editor path");
        EditorError::AccessDenied
    })
}

/// Match `id` against the eligible project folders — by raw name or
/// normalized id. The id is only ever compared against listing entries,
/// never joined into a path, so it cannot traverse. On a normalized-id
/// collision the last match in listing order wins, same as descriptor
/// indexing.
fn find_project_dir(root: &FsPath, id: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    let mut found = None;
    for entry in entries.filter_map(|e| e.ok()) {
        let dir = entry.path();
        if !dir.is_dir() || !dir.join(ENTRY_FILE).is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == id || normalize_id(&name) == id {
            found = Some(dir);
        }
    }
    found
}

// ─── Tests ────────────────────────────────────────────────────────────────────
