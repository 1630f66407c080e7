//! Health Check Server - Liveness, Readiness and Metrics
//!
//! Exposes /live, /ready and /metrics via axum 0.7. Readiness turns
//! false as soon as shutdown begins so probes stop routing to a bot
//! that is winding down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::watch;
use tracing::{info, instrument};

use super::prometheus::MetricsRegistry;

/// Shared health state polled by readiness probes.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Cleared when shutdown begins.
    pub running: Arc<AtomicBool>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (ready by default).
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Check if the bot is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Flip readiness off.
    pub fn mark_stopping(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

#[derive(Clone)]
struct AppState {
    health: HealthState,
    metrics: Arc<MetricsRegistry>,
}

/// Axum-based health and metrics HTTP server.
pub struct HealthServer {
    /// Health state shared with main.
    state: HealthState,
    /// Metrics rendered on /metrics.
    metrics: Arc<MetricsRegistry>,
    /// Bind port (default 9090 from config).
    port: u16,
}

impl HealthServer {
    /// Create a new health server.
    pub fn new(state: HealthState, metrics: Arc<MetricsRegistry>, port: u16) -> Self {
        Self {
            state,
            metrics,
            port,
        }
    }

    /// Build the router.
    fn router(&self) -> Router {
        Router::new()
            .route("/live", get(liveness))
            .route("/ready", get(readiness))
            .route("/metrics", get(metrics))
            .with_state(AppState {
                health: self.state.clone(),
                metrics: Arc::clone(&self.metrics),
            })
    }

    /// Serve until the shutdown channel flips to `true`.
    ///
    /// # Errors
    /// Fails if the port cannot be bound.
    #[instrument(skip(self, shutdown_rx), fields(port = self.port))]
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
        let app = self.router();

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        let health = self.state.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
                health.mark_stopping();
            })
            .await?;

        Ok(())
    }
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: returns 503 once shutdown has begun.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if state.health.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, state.metrics.render())
}
