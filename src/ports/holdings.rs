//! Holdings Port - Swarm Balance Interface

use async_trait::async_trait;

use crate::domain::holdings::HoldingsSnapshot;

/// Provider of aggregate swarm holdings.
#[async_trait]
pub trait HoldingsSource: Send + Sync + 'static {
  /// Fetch a fresh snapshot of the swarm's aggregate balances.
  ///
  /// # Errors
  /// Returns error on transport failure or an unsuccessful API envelope.
  async fn get_holdings(&self, swarm_id: &str) -> anyhow::Result<HoldingsSnapshot>;
}
