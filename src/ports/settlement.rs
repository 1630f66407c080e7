//! Settlement Port - Multi-party Swap Interface
//!
//! A swap runs in two steps on the platform:
//! 1. `preview_swap` simulates the trade for every member and reports
//!    per-member amounts and errors. Nothing is submitted.
//! 2. `execute_swap` submits the same parameters and returns a
//!    transaction ID whose status is then polled with `get_transaction`.
//!
//! Callers must preview before executing and must not execute a preview
//! with zero successful members.

use async_trait::async_trait;

use crate::domain::trade::{PreviewResult, TradeProposal, Transaction, TransactionId};

/// Trait for the external settlement service.
#[async_trait]
pub trait SwapSettlement: Send + Sync + 'static {
  /// Simulate a swap across all swarm members.
  async fn preview_swap(
    &self,
    swarm_id: &str,
    proposal: &TradeProposal,
  ) -> anyhow::Result<PreviewResult>;

  /// Submit a swap for asynchronous execution.
  ///
  /// # Errors
  /// Returns error if the platform rejects the submission.
  async fn execute_swap(
    &self,
    swarm_id: &str,
    proposal: &TradeProposal,
  ) -> anyhow::Result<TransactionId>;

  /// Current status of a submitted transaction.
  async fn get_transaction(&self, transaction_id: &str) -> anyhow::Result<Transaction>;
}
