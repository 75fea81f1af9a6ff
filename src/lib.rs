pub mod config;
pub mod registry;
pub mod rest;
pub mod security;

use std::sync::Arc;

use config::ServerConfig;
use registry::ProjectRegistry;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    /// Project registry over the configured projects root. Stateless — every
    /// call performs a fresh scan.
    pub registry: Arc<ProjectRegistry>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let registry = Arc::new(ProjectRegistry::new(config.projects_dir.clone()));
        Arc::new(Self {
            config: Arc::new(config),
            registry,
            started_at: std::time::Instant::now(),
        })
    }
}
