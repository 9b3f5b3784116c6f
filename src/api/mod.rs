pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::anomaly::engine::SuspiciousDetector;
use crate::config::{Config, InfrastructureConfig};
use crate::wallet::metadata::InfrastructureRegistry;

pub struct AppState {
    pub detector: SuspiciousDetector,
    pub registry: InfrastructureRegistry,
    pub infrastructure: InfrastructureConfig,
    pub max_transactions: usize,
}

impl AppState {
    pub fn new(config: &Config, registry: InfrastructureRegistry) -> Self {
        Self {
            detector: SuspiciousDetector::new(config.detection.clone()),
            registry,
            infrastructure: config.infrastructure.clone(),
            max_transactions: config.api.max_transactions,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/analyze", post(handlers::analyze))
        .route("/api/v1/risk-score", post(handlers::risk_score))
        .route("/api/v1/blocks", post(handlers::blocks))
        .route("/api/v1/classify", post(handlers::classify))
        .route("/api/v1/sybil-clusters", post(handlers::sybil_clusters))
        .route("/api/v1/compare", post(handlers::compare))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serve_returns_error_when_port_taken() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let state = AppState::new(&Config::default(), InfrastructureRegistry::default());
        let res = serve(state, "127.0.0.1", port, CancellationToken::new()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let shutdown = CancellationToken::new();
        let state = AppState::new(&Config::default(), InfrastructureRegistry::default());
        let server = tokio::spawn(serve(state, "127.0.0.1", 0, shutdown.clone()));

        shutdown.cancel();
        assert!(server.await.unwrap().is_ok());
    }
}
