//! Swarm Vault API Adapter
//!
//! Implements the HTTP client for the Swarm Vault REST API: holdings,
//! swap preview and execution, transaction status, and swarm metadata.
//!
//! Sub-modules:
//! - `auth`: Bearer API key handling
//! - `client`: HTTP client with pacing and retries
//! - `swarm`: Port implementations on top of the client
//! - `types`: API request/response type definitions

pub mod auth;
pub mod client;
pub mod swarm;
pub mod types;

pub use auth::ApiAuth;
pub use client::{SwarmVaultClient, SwarmVaultClientConfig};
