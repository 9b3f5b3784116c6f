use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use fundtrace_detector::api::{self, AppState};
use fundtrace_detector::config::Config;
use fundtrace_detector::wallet::metadata::InfrastructureRegistry;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=info for output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("FundTrace detector starting");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = if Path::new(&config_path).exists() {
        let config = Config::load(&config_path)?;
        tracing::info!("Configuration loaded from {}", config_path);
        config
    } else {
        tracing::warn!(path = %config_path, "Config file not found, using defaults");
        Config::default()
    };

    let registry = match config.infrastructure.known_addresses_path {
        Some(ref path) => InfrastructureRegistry::load(path)?,
        None => InfrastructureRegistry::default(),
    };

    if !config.api.enabled {
        tracing::info!("API disabled, nothing to serve");
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let state = AppState::new(&config, registry);
    let host = config.api.host.clone();
    let port = config.api.port;

    let server_shutdown = shutdown.clone();
    let mut server =
        tokio::spawn(async move { api::serve(state, &host, port, server_shutdown).await });

    tracing::info!("Detector ready. Press Ctrl+C to stop.");

    // Wait for shutdown signal, or bail out if the server dies first (e.g. bind failure)
    tokio::select! {
        res = &mut server => {
            res??;
            eyre::bail!("API server exited unexpectedly");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutdown signal received, stopping API server...");
        }
    }
    shutdown.cancel();

    if let Err(e) = server.await? {
        tracing::error!(error = %e, "API server failed during shutdown");
        return Err(e);
    }

    tracing::info!("FundTrace detector stopped gracefully");
    Ok(())
}
