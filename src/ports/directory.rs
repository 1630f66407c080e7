//! Directory Port - Identity and Swarm Metadata
//!
//! Used at startup to verify the API key and confirm that the caller
//! manages the configured swarm, and by operator tooling to list swarms
//! and their transaction history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::trade::Transaction;

/// Authenticated caller as reported by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
  /// User ID, when returned.
  pub id: Option<String>,
  /// Wallet address bound to the API key.
  pub wallet_address: Option<String>,
}

/// Basic swarm information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmInfo {
  pub id: String,
  pub name: String,
  pub description: String,
  /// Number of member accounts.
  pub member_count: u32,
  /// Whether the authenticated caller manages this swarm.
  pub is_manager: bool,
  /// Manager wallet addresses.
  pub managers: Vec<String>,
}

/// Trait for identity and swarm lookups.
#[async_trait]
pub trait SwarmDirectory: Send + Sync + 'static {
  /// Verify the API key and return the caller's identity.
  async fn whoami(&self) -> anyhow::Result<Identity>;

  /// Details of one swarm.
  async fn get_swarm(&self, swarm_id: &str) -> anyhow::Result<SwarmInfo>;

  /// All swarms visible to the caller.
  async fn list_swarms(&self) -> anyhow::Result<Vec<SwarmInfo>>;

  /// Transaction history of a swarm, newest first as returned.
  async fn list_swarm_transactions(&self, swarm_id: &str) -> anyhow::Result<Vec<Transaction>>;
}
