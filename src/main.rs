use std::future::Future;
use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use unit_proxy::{AppState, Config, build_router, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Unit Proxy v{}", env!("CARGO_PKG_VERSION"));

    match run().await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

/// Run the application, returning an exit code on error.
async fn run() -> Result<(), exitcode::ExitCode> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {e}");
        exitcode::CONFIG
    })?;
    info!(
        host = %config.host,
        port = %config.port,
        upstream = %config.query_url(),
        cache_dir = %config.cache_dir.display(),
        "Configuration loaded"
    );

    if !config.api_key_usable() {
        // Deliberately not fatal: the auth layer fails closed per request,
        // which keeps /health reachable for deployment checks
        warn!("API_KEY is unset or still the placeholder; /units will answer 500");
    }

    // Start Prometheus metrics exporter (if enabled)
    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::init_metrics(metrics_addr).map_err(|e| {
            error!("Failed to start metrics exporter: {e}");
            exitcode::UNAVAILABLE
        })?;
    } else {
        info!("Metrics disabled (METRICS_PORT=0)");
    }

    // Build application state and router
    let state = AppState::new(config.clone()).map_err(|e| {
        error!("Failed to initialize application state: {e}");
        exitcode::CONFIG
    })?;
    let app = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /health  - Health check");
    info!("  GET  /ready   - Readiness check");
    info!("  GET  /units   - Query Unit telemetry records");

    // Signal handlers are installed before serving so a failed install is
    // a startup error, not a surprise at shutdown time
    let shutdown = shutdown_signal().map_err(|e| {
        error!("Failed to install shutdown signal handlers: {e}");
        exitcode::OSERR
    })?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}

/// Build the future that resolves on Ctrl+C or SIGTERM.
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    Ok(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Ctrl+C listener failed: {e}");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            terminate.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => warn!("Received Ctrl+C, initiating graceful shutdown..."),
            _ = terminate => warn!("Received SIGTERM, initiating graceful shutdown..."),
        }
    })
}
