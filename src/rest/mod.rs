// rest/mod.rs — Gallery HTTP server.
//
// Axum server bridging the project registry to the browser front-end.
//
// Endpoints:
//   GET  /api/projects
//   GET  /api/test
//   GET  /api/health
//   GET  /api/device-info
//   GET  /api/debug/status
//   GET  /api/audio/list
//   GET  /project/{id}                          (redirect to /#{id})
//   GET  /projects/*                            (static, projects root)
//   GET  /*                                     (static, public dir)
//
// Debug capability only (config.debug — routes are added at construction
// time, never toggled at runtime):
//   GET  /api/debug/scan
//   GET  /debug/api/projects
//   GET  /debug/api/project/{id}/file
//   POST /debug/api/project/{id}/file
//   PUT  /debug/api/project/{id}/metadata
//   GET  /debug/check-permissions

pub mod routes;

use anyhow::Result;
use axum::extract::Path;
use axum::response::Redirect;
use axum::routing::{get, put};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

use crate::AppContext;

pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;
    let port = ctx.config.port;

    let router = build_router(ctx);

    info!("gallery listening on http://{}", addr);
    if let Ok(ip) = local_ip_address::local_ip() {
        info!("local network access: http://{}:{}", ip, port);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let mut router = Router::new()
        .route("/api/projects", get(routes::projects::list_projects))
        .route("/api/test", get(routes::projects::api_test))
        .route("/api/health", get(routes::health::health))
        .route("/api/device-info", get(routes::device::device_info))
        .route("/api/debug/status", get(routes::debug::debug_status))
        .route("/api/audio/list", get(routes::projects::list_audio))
        .route("/project/{id}", get(project_redirect));

    if ctx.config.debug {
        router = router
            .route("/api/debug/scan", get(routes::debug::debug_scan))
            .route("/debug/api/projects", get(routes::editor::list_projects))
            .route(
                "/debug/api/project/{id}/file",
                get(routes::editor::load_file).post(routes::editor::save_file),
            )
            .route(
                "/debug/api/project/{id}/metadata",
                put(routes::editor::save_metadata),
            )
            .route(
                "/debug/check-permissions",
                get(routes::debug::check_permissions),
            );
    }

    router
        .nest_service("/projects", ServeDir::new(&ctx.config.projects_dir))
        .fallback_service(ServeDir::new(&ctx.config.public_dir))
        // AR.js loads marker/model assets cross-origin
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Deep link: `/project/foo` opens the gallery with that project selected.
async fn project_redirect(Path(id): Path<String>) -> Redirect {
    Redirect::temporary(&format!("/#{id}"))
}
