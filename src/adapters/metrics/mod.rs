//! Metrics and Monitoring Adapters
//!
//! Prometheus counters for the decision loop and an axum server with
//! health check endpoints (/live, /ready) and /metrics.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use prometheus::MetricsRegistry;
