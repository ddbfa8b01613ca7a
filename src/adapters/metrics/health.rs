//! Metrics Server - Prometheus Scrape Endpoint and Health Probes
//!
//! One axum server exposes `/metrics`, `/live` and `/ready`. Readiness
//! follows the keeper lifecycle: ready only while `Running`.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::watch;
use tracing::{info, instrument};

use crate::usecases::LifecycleState;

use super::prometheus::KeeperMetrics;

#[derive(Clone)]
struct ServerState {
    metrics: Arc<KeeperMetrics>,
    lifecycle: watch::Receiver<LifecycleState>,
}

/// Axum-based metrics and health HTTP server.
pub struct MetricsServer {
    state: ServerState,
}

impl MetricsServer {
    pub fn new(metrics: Arc<KeeperMetrics>, lifecycle: watch::Receiver<LifecycleState>) -> Self {
        Self {
            state: ServerState { metrics, lifecycle },
        }
    }

    fn router(self) -> Router {
        Router::new()
            .route("/metrics", get(metrics))
            .route("/live", get(liveness))
            .route("/ready", get(readiness))
            .with_state(self.state)
    }

    /// Serve until `shutdown` resolves.
    #[instrument(skip(self, shutdown))]
    pub async fn serve(
        self,
        bind_address: String,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Metrics server started");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
    state.metrics.render()
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness(State(state): State<ServerState>) -> impl IntoResponse {
    let current = *state.lifecycle.borrow();
    if current == LifecycleState::Running {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, current.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_follows_lifecycle() {
        let (tx, rx) = watch::channel(LifecycleState::Init);
        let state = ServerState {
            metrics: Arc::new(KeeperMetrics::new().unwrap()),
            lifecycle: rx,
        };

        let response = readiness(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        tx.send_replace(LifecycleState::Running);
        let response = readiness(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        tx.send_replace(LifecycleState::ShuttingDown);
        let response = readiness(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = liveness().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
