// rest/routes/projects.rs — project registry routes.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::registry::ProjectDescriptor;
use crate::AppContext;

/// GET /api/projects — the full scan result, fresh from disk on every call.
///
/// The scan degrades internally (missing root, broken sidecars), so this
/// handler cannot fail; the worst case is an empty array.
pub async fn list_projects(State(ctx): State<Arc<AppContext>>) -> Json<Vec<ProjectDescriptor>> {
    Json(ctx.registry.scan())
}

/// GET /api/test — liveness probe used by the gallery front-end.
pub async fn api_test() -> Json<Value> {
    Json(json!({ "status": "API is working" }))
}

/// GET /api/audio/list — audio clips available under `public/audio`.
pub async fn list_audio(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let audio_dir = ctx.config.public_dir.join("audio");
    match std::fs::read_dir(&audio_dir) {
        Ok(entries) => {
            let files: Vec<Value> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| {
                    let filename = e.file_name().to_string_lossy().into_owned();
                    json!({
                        "filename": filename,
                        "path": format!("/audio/{filename}"),
                    })
                })
                .collect();
            Ok(Json(json!(files)))
        }
        Err(e) => {
            error!(dir = %audio_dir.display(), err = %e, "cannot list audio directory");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read audio directory" })),
            ))
        }
    }
}
