use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streamrelay_core::debrid::PollPolicy;
use streamrelay_core::{
    load_config, validate_config, ConfigStore, DebridManager, EnvSecretStore, HttpIndexerFactory,
    HttpProviderFactory, HttpTransport, IndexerAggregator, ReqwestTransport, SecretStore,
    StaticConfigStore,
};
use streamrelay_server::api::create_router;
use streamrelay_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("RELAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!(version = VERSION, "Configuration loaded successfully");
    info!(
        indexers = config.indexers.iter().filter(|i| i.is_active).count(),
        debrid_services = config.debrid_services.iter().filter(|d| d.is_active).count(),
        "Active providers"
    );

    // Shared HTTP transport for indexers and debrid providers
    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::new(config.debrid.request_timeout())
            .context("Failed to create HTTP client")?,
    );

    let store: Arc<dyn ConfigStore> = Arc::new(StaticConfigStore::from_config(&config));
    let secrets: Arc<dyn SecretStore> = Arc::new(EnvSecretStore::new());

    let aggregator = IndexerAggregator::new(
        Arc::clone(&store),
        Arc::clone(&secrets),
        Arc::new(HttpIndexerFactory::new(
            Arc::clone(&transport),
            config.search.indexer_timeout(),
        )),
    )
    .with_timeout(config.search.indexer_timeout());

    let debrid = DebridManager::new(
        store,
        secrets,
        Arc::new(HttpProviderFactory::new(
            transport,
            config.debrid.request_timeout(),
        )),
    )
    .with_poll_policy(PollPolicy::from(&config.debrid));

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, aggregator, debrid));
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
