//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the configuration file and apply command line flags
//! - Initialize logging and metrics
//! - Build the route table from configuration
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener binds last (traffic only when routes are ready)

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;
use crate::config::{load_config, validate_config, ConfigError, ServerConfig};
use crate::handlers::{mount_doc, StaticFiles, StaticFilesError};
use crate::http::HttpServer;
use crate::lifecycle::signals::forward_signals;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::{logging, metrics};
use crate::routing::{Router, RouterError};
use crate::security::RequestLimits;

/// Error type for startup and serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    StaticFiles(#[from] StaticFilesError),

    #[error("failed to register route: {0}")]
    Route(#[from] RouterError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Configuration file (if any) with `cli` flags applied, validated.
pub fn resolve_config(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Route table serving `config.files`.
///
/// The doc route is registered first so the catch-all file route under the
/// same prefix cannot shadow it.
pub fn build_router<S>(config: &ServerConfig) -> Result<Router<S>, StartupError>
where
    S: Send + Sync + 'static,
{
    let mut router = Router::new();
    if let Some(doc_path) = &config.files.doc_path {
        mount_doc(&mut router, doc_path)?;
    }
    StaticFiles::new(&config.files.directory)?
        .with_index(config.files.index)
        .with_chunk_size(config.files.chunk_size)
        .mount(&mut router, &config.files.url_prefix)?;
    Ok(router)
}

/// Bind and serve `router` until `shutdown` is triggered.
pub async fn serve<S>(
    config: &ServerConfig,
    router: Router<S>,
    state: S,
    shutdown: &Shutdown,
) -> Result<(), StartupError>
where
    S: Send + Sync + 'static,
{
    let server = HttpServer::new(router, state)
        .with_limits(RequestLimits::from(&config.limits))
        .with_shutdown_grace(Duration::from_secs(config.listener.shutdown_grace_secs));

    let listener = Listener::bind(&config.listener).await?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(
            address = %addr,
            directory = %config.files.directory.display(),
            "Serving on http://{addr}"
        );
    }

    server.run(listener, shutdown.subscribe()).await?;
    Ok(())
}

/// Entry point of the `grole` binary.
pub async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = resolve_config(&cli)?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.listener.address,
        port = config.listener.port,
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let router = build_router::<()>(&config)?;
    let shutdown = Shutdown::new();
    forward_signals(shutdown.clone());

    serve(&config, router, (), &shutdown).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
