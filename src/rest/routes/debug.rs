// rest/routes/debug.rs — debug-capability routes.
//
// Only /api/debug/status is always mounted; the rest exist iff the server
// was started with the debug capability (build_router adds them once — there
// is no runtime toggle).

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppContext;

/// GET /api/debug/status — reports the configured capability, so the
/// front-end can hide its debug panel on production servers.
pub async fn debug_status(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    Json(json!({ "debug": ctx.config.debug }))
}

/// GET /api/debug/scan — scan result plus the raw root listing and server
/// info, for diagnosing "why is my project not showing up".
pub async fn debug_scan(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let projects = ctx.registry.scan();
    Json(json!({
        "projectsCount": projects.len(),
        "projects": projects,
        "directories": ctx.registry.raw_listing(),
        "serverInfo": {
            "port": ctx.config.port,
            "version": env!("CARGO_PKG_VERSION"),
            "platform": std::env::consts::OS,
        },
    }))
}

/// GET /debug/check-permissions — read/write diagnostics over the projects
/// root and a sample of entry files, for the "files cannot be saved" support
/// path.
pub async fn check_permissions(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let dir = &ctx.config.projects_dir;
    let readable = std::fs::read_dir(dir).is_ok();
    let writable = std::fs::metadata(dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false);

    let mut files = Vec::new();
    if readable {
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.filter_map(|e| e.ok()).take(3) {
                let index = entry.path().join(crate::registry::ENTRY_FILE);
                if !index.is_file() {
                    continue;
                }
                let file_readable = std::fs::File::open(&index).is_ok();
                let file_writable = std::fs::OpenOptions::new()
                    .append(true)
                    .open(&index)
                    .is_ok();
                files.push(json!({
                    "path": index.display().to_string(),
                    "readable": file_readable,
                    "writable": file_writable,
                }));
            }
        }
    }

    Json(json!({
        "directory": dir.display().to_string(),
        "readable": readable,
        "writable": writable,
        "files": files,
    }))
}
