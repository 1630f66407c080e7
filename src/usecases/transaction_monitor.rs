//! Transaction Monitor - Settlement Tracking
//!
//! Polls a submitted transaction at a fixed cadence until it reaches a
//! terminal status, the timeout elapses, or shutdown is requested.
//!
//! State machine:
//! ```text
//! PENDING ─┬─> PROCESSING ─┬─> COMPLETED
//!          │               └─> FAILED
//!          ├─> COMPLETED
//!          └─> FAILED
//! ```
//! The timeout is checked after each non-terminal fetch, so the status
//! is always read at least once. Transport errors abort monitoring and
//! propagate; they say nothing about the transaction itself.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use super::shutdown::sleep_or_shutdown;
use crate::config::MonitorConfig;
use crate::domain::trade::{Transaction, TransactionStatus};
use crate::ports::settlement::SwapSettlement;

/// How monitoring ended.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
  /// Platform reported COMPLETED.
  Completed(Transaction),
  /// Platform reported FAILED.
  Failed(Transaction),
  /// No terminal status within the timeout; last observed state attached.
  TimedOut(Transaction),
  /// Shutdown requested while waiting.
  Interrupted,
}

impl SettlementOutcome {
  /// Label for logs and metrics.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Completed(_) => "completed",
      Self::Failed(_) => "failed",
      Self::TimedOut(_) => "timed_out",
      Self::Interrupted => "interrupted",
    }
  }
}

/// Polls the settlement port for transaction status.
pub struct TransactionMonitor<S: SwapSettlement> {
  /// Settlement adapter.
  settlement: Arc<S>,
  /// Overall wait budget.
  timeout: Duration,
  /// Delay between polls.
  poll_interval: Duration,
}

impl<S: SwapSettlement> TransactionMonitor<S> {
  /// Create a new transaction monitor.
  pub fn new(settlement: Arc<S>, timeout: Duration, poll_interval: Duration) -> Self {
    Self {
      settlement,
      timeout,
      poll_interval,
    }
  }

  /// Create a monitor from the `[monitor]` config section.
  pub fn from_config(settlement: Arc<S>, config: &MonitorConfig) -> Self {
    Self::new(
      settlement,
      Duration::from_secs(config.timeout_seconds),
      Duration::from_secs(config.poll_interval_seconds),
    )
  }

  /// Wait for `transaction_id` to settle.
  ///
  /// # Errors
  /// Transport or API errors while fetching status.
  #[instrument(skip(self, shutdown), fields(tx_id = %transaction_id))]
  pub async fn await_settlement(
    &self,
    transaction_id: &str,
    shutdown: &mut watch::Receiver<bool>,
  ) -> Result<SettlementOutcome> {
    info!(timeout_secs = self.timeout.as_secs(), "Waiting for transaction to complete");

    let start = Instant::now();

    loop {
      let tx = self
        .settlement
        .get_transaction(transaction_id)
        .await
        .context("Failed to fetch transaction status")?;

      match tx.status {
        TransactionStatus::Completed => {
          info!(
            confirmed = tx.confirmed_count(),
            target = ?tx.target_count,
            "Transaction completed successfully"
          );
          return Ok(SettlementOutcome::Completed(tx));
        }
        TransactionStatus::Failed => {
          error!(failed = tx.failed_count(), "Transaction failed");
          return Ok(SettlementOutcome::Failed(tx));
        }
        TransactionStatus::Pending | TransactionStatus::Processing | TransactionStatus::Unknown => {}
      }

      if start.elapsed() > self.timeout {
        warn!(
          status = %tx.status,
          timeout_secs = self.timeout.as_secs(),
          "Transaction did not complete within timeout"
        );
        return Ok(SettlementOutcome::TimedOut(tx));
      }

      if tx.status_counts.is_some() {
        info!(
          status = %tx.status,
          confirmed = tx.confirmed_count(),
          target = ?tx.target_count,
          failed = tx.failed_count(),
          "Progress"
        );
      }

      if sleep_or_shutdown(self.poll_interval, shutdown).await {
        warn!("Shutdown requested while monitoring transaction");
        return Ok(SettlementOutcome::Interrupted);
      }
    }
  }
}
