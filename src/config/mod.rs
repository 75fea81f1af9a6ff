use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 8080;

fn default_bind_address() -> String {
    // The gallery is meant to be opened from phones on the same LAN.
    "0.0.0.0".to_string()
}

/// `{root_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 8080).
    port: Option<u16>,
    /// Bind address (default: "0.0.0.0"; use "127.0.0.1" for local-only).
    bind_address: Option<String>,
    /// Projects root (default: `{root_dir}/projects`).
    projects_dir: Option<PathBuf>,
    /// Static assets directory (default: `{root_dir}/public`).
    public_dir: Option<PathBuf>,
    /// Log level filter string, e.g. "debug", "info,ard=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json".
    log_format: Option<String>,
    /// Debug capability: editor API, debug scan, permission diagnostics.
    debug: Option<bool>,
}

fn load_toml(root_dir: &Path) -> Option<TomlConfig> {
    let path = root_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    /// Directory holding `projects/`, `public/`, and `config.toml`.
    pub root_dir: PathBuf,
    pub projects_dir: PathBuf,
    pub public_dir: PathBuf,
    pub log: String,
    /// "pretty" (default) | "json".
    pub log_format: String,
    /// Debug capability flag. Fixed at startup — the route table is built
    /// from it once, and no request can flip it afterwards.
    pub debug: bool,
}

impl ServerConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{root_dir}/config.toml`
    ///   3. Built-in defaults
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port: Option<u16>,
        root_dir: Option<PathBuf>,
        projects_dir: Option<PathBuf>,
        public_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
        debug: Option<bool>,
    ) -> Self {
        let root_dir = root_dir.unwrap_or_else(|| PathBuf::from("."));

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&root_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let bind_address = bind_address
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);
        let projects_dir = projects_dir
            .or(toml.projects_dir)
            .unwrap_or_else(|| root_dir.join("projects"));
        let public_dir = public_dir
            .or(toml.public_dir)
            .unwrap_or_else(|| root_dir.join("public"));
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("ARD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let debug = debug.or(toml.debug).unwrap_or(false);

        Self {
            port,
            bind_address,
            root_dir,
            projects_dir,
            public_dir,
            log,
            log_format,
            debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = ServerConfig::new(
            None,
            Some(tmp.path().to_path_buf()),
            None,
            None,
            None,
            None,
            None,
        );
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.bind_address, "0.0.0.0");
        assert_eq!(cfg.projects_dir, tmp.path().join("projects"));
        assert_eq!(cfg.public_dir, tmp.path().join("public"));
        assert_eq!(cfg.log, "info");
        assert!(!cfg.debug);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "port = 9090\ndebug = true\nbind_address = \"127.0.0.1\"\n",
        )
        .unwrap();

        let cfg = ServerConfig::new(
            None,
            Some(tmp.path().to_path_buf()),
            None,
            None,
            None,
            None,
            None,
        );
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.bind_address, "127.0.0.1");
        assert!(cfg.debug);
    }

    #[test]
    fn test_cli_beats_toml() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "port = 9090\ndebug = true\n").unwrap();

        let cfg = ServerConfig::new(
            Some(8081),
            Some(tmp.path().to_path_buf()),
            None,
            None,
            None,
            None,
            Some(false),
        );
        assert_eq!(cfg.port, 8081);
        assert!(!cfg.debug);
    }

    #[test]
    fn test_malformed_toml_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "port = \"not a number").unwrap();

        let cfg = ServerConfig::new(
            None,
            Some(tmp.path().to_path_buf()),
            None,
            None,
            None,
            None,
            None,
        );
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}
