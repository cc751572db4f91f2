//! Media console daemon: serves the admin API for one media server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use media_console::audit::{AuditAction, AuditEvent, AuditSink, TracingAuditSink};
use media_console::config::{load_config, ConfigWatcher};
use media_console::http::{AppState, HttpServer};
use media_console::lifecycle::{wait_for_signal, ConsoleRuntime, ControlSignal, Shutdown};
use media_console::observability;
use media_console::snapshots::{SnapshotStore, SqliteSnapshotStore};

#[derive(Parser)]
#[command(name = "media-console", version, about = "Admin console for a media server")]
struct Args {
    /// Console settings file
    #[arg(short, long, default_value = "console.toml", env = "MEDIA_CONSOLE_CONFIG")]
    config: PathBuf,

    /// Do not reload when the settings file changes
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    observability::logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "media-console starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store: Arc<dyn SnapshotStore> =
        Arc::new(SqliteSnapshotStore::open(Path::new(&config.snapshots.database_path))?);
    let bind_address = config.listener.bind_address.clone();
    let runtime = ConsoleRuntime::build(config, store, Arc::new(Mutex::new(())))?;

    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let state = AppState::new(runtime, audit).with_config_path(&args.config);

    // Dropping the watcher stops events, so it lives until main returns.
    let _watcher = if args.no_watch {
        None
    } else {
        let (watcher, mut updates) = ConfigWatcher::new(&args.config);
        let watcher = watcher.run()?;
        let state = state.clone();
        tokio::spawn(async move {
            while let Some(new_config) = updates.recv().await {
                let result = state.apply_config(new_config);
                if let Err(e) = &result {
                    tracing::error!(error = %e, "Reload failed. Keeping current runtime.");
                }
                state.audit.record(
                    AuditEvent::new("system", AuditAction::Reload, "console")
                        .description("settings file changed")
                        .outcome_of(&result),
                );
            }
        });
        Some(watcher)
    };

    let shutdown = Shutdown::new();
    let stop = shutdown.wait();
    {
        let state = state.clone();
        tokio::spawn(async move {
            loop {
                match wait_for_signal().await {
                    Ok(ControlSignal::Reload) => {
                        tracing::info!("SIGHUP received, reloading");
                        let result = state.reload();
                        if let Err(e) = &result {
                            tracing::error!(error = %e, "Reload failed. Keeping current runtime.");
                        }
                        state.audit.record(
                            AuditEvent::new("system", AuditAction::Reload, "console")
                                .description("SIGHUP")
                                .outcome_of(&result),
                        );
                    }
                    Ok(ControlSignal::Shutdown) => {
                        tracing::info!("Shutdown signal received");
                        shutdown.trigger();
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to install signal handlers");
                        shutdown.trigger();
                        break;
                    }
                }
            }
        });
    }

    let listener = TcpListener::bind(&bind_address).await?;
    HttpServer::new(state).run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
