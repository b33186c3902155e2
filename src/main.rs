//! Diagnostics demo server.
//!
//! Serves a small application behind the diagnostic hook pipeline.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ TraceLayer → RequestIdLayer → Timeout → BodyLimit
//!                         → HookPipeline ─ request hooks (devel: FIRST)
//!                              → application routes / admin API
//!                         ← HookPipeline ─ response hooks (devel: LAST)
//!     ◀──────────────      (scope dropped: report flushed to sinks)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use devel_diagnostics::config::{load_config, watcher::ConfigWatcher, DevelConfig};
use devel_diagnostics::lifecycle::{spawn_signal_handler, Shutdown};
use devel_diagnostics::observability::{logging, metrics};
use devel_diagnostics::HttpServer;

#[derive(Parser)]
#[command(name = "devel-diagnostics")]
#[command(about = "Demo server with request diagnostics and redirect interception", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DevelConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_tracing(&config.observability);
    tracing::info!("devel-diagnostics v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        memory = config.devel.memory,
        query_log = config.devel.query_log,
        redirect_page = config.devel.redirect_page,
        tokens = config.access.tokens.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the lifetime of the server.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(w) => (updates, Some(w)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    (updates, None)
                }
            }
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
