//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, Prometheus, axum).
//!
//! Adapter categories:
//! - `api`: Swarm Vault REST API client and auth
//! - `metrics`: Prometheus metrics export and health checks

pub mod api;
pub mod metrics;
