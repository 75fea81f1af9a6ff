use anyhow::Result;
use ard::{config::ServerConfig, registry::ProjectRegistry, AppContext};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ard",
    about = "AR gallery host — serves browser-based AR demos",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "ARD_PORT")]
    port: Option<u16>,

    /// Root directory holding projects/, public/, and config.toml
    #[arg(long, env = "ARD_ROOT_DIR")]
    root_dir: Option<PathBuf>,

    /// Projects directory (default: {root_dir}/projects)
    #[arg(long, env = "ARD_PROJECTS_DIR")]
    projects_dir: Option<PathBuf>,

    /// Public assets directory (default: {root_dir}/public)
    #[arg(long, env = "ARD_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "ARD_LOG")]
    log: Option<String>,

    /// Bind address (default: 0.0.0.0; use 127.0.0.1 for local-only)
    #[arg(long, env = "ARD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "ARD_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Enable the debug capability: project editor API, debug scan, and
    /// permission diagnostics. Fixed for the lifetime of the process.
    #[arg(long, env = "ARD_DEBUG")]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the gallery server (default when no subcommand given).
    ///
    /// Examples:
    ///   ard serve
    ///   ard --debug
    Serve,
    /// Scan the projects root once and print the descriptors.
    ///
    /// Creates missing metadata sidecars exactly like a server-side scan.
    ///
    /// Examples:
    ///   ard scan
    ///   ard scan --json
    Scan {
        /// Output as a JSON array (for piping)
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ── Logging setup ────────────────────────────────────────────────────────
    // Init once — must happen before any tracing calls.
    let log_level = args.log.as_deref().unwrap_or("info").to_owned();
    let log_format = std::env::var("ARD_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let _file_guard = setup_logging(&log_level, args.log_file.as_deref(), &log_format);

    let config = ServerConfig::new(
        args.port,
        args.root_dir,
        args.projects_dir,
        args.public_dir,
        args.log,
        args.bind_address,
        args.debug.then_some(true),
    );

    match args.command {
        Some(Command::Scan { json }) => run_scan(config, json),
        None | Some(Command::Serve) => {
            let ctx = AppContext::new(config);
            ard::rest::serve(ctx).await
        }
    }
}

fn run_scan(config: ServerConfig, json: bool) -> Result<()> {
    let registry = ProjectRegistry::new(config.projects_dir);
    let projects = registry.scan();

    if json {
        println!("{}", serde_json::to_string(&projects)?);
    } else if projects.is_empty() {
        println!("No projects found.");
    } else {
        println!("{:<24} {:<28} {:<5} PATH", "ID", "NAME", "META");
        println!("{}", "-".repeat(72));
        for p in &projects {
            println!(
                "{:<24} {:<28} {:<5} {}",
                p.id,
                p.name,
                if p.has_metadata { "yes" } else { "no" },
                p.path
            );
        }
        println!("\n{} project(s)", projects.len());
    }
    Ok(())
}

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("ard.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(log_level)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_env_filter(log_level)
                    .compact()
                    .init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
        None
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
        None
    }
}
