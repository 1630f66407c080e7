//! Trade Executor - Preview, Validate, Submit
//!
//! Turns an approved proposal into a platform transaction:
//! 1. Preview the swap for every member
//! 2. Stop if no member can trade
//! 3. Stop after the preview in simulation mode
//! 4. Submit for execution and record the submission in the ledger
//!
//! The ledger and last-trade time change only after a successful
//! submission.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use super::context::TradingContext;
use crate::domain::trade::{PreviewResult, StrategyState, TradeLedgerEntry, TradeProposal, TransactionId};
use crate::ports::settlement::SwapSettlement;

/// Members listed individually in preview errors before truncating.
const MAX_LOGGED_MEMBER_ERRORS: usize = 5;

/// Result of one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
  /// Swap submitted; poll this transaction.
  Submitted { transaction_id: TransactionId },
  /// Preview showed zero members able to trade; nothing submitted.
  NoViableMembers,
  /// Simulation mode; preview succeeded, nothing submitted.
  Simulated,
}

/// Executes proposals through the settlement port.
pub struct TradeExecutor<S: SwapSettlement> {
  /// Settlement adapter.
  settlement: Arc<S>,
  /// Run context.
  ctx: TradingContext,
}

impl<S: SwapSettlement> TradeExecutor<S> {
  /// Create a new trade executor.
  pub fn new(settlement: Arc<S>, ctx: TradingContext) -> Self {
    Self { settlement, ctx }
  }

  /// Preview and, outside simulation, submit a proposal.
  ///
  /// `state` is updated only on `Submitted`.
  ///
  /// # Errors
  /// Transport or API errors from preview or execute. A failed execute
  /// leaves `state` untouched.
  #[instrument(skip(self, proposal, state, now), fields(proposal = %proposal))]
  pub async fn execute(
    &self,
    proposal: &TradeProposal,
    state: &mut StrategyState,
    now: DateTime<Utc>,
  ) -> Result<ExecutionOutcome> {
    let preview = self
      .settlement
      .preview_swap(&self.ctx.swarm_id, proposal)
      .await
      .context("Swap preview failed")?;

    Self::log_preview(&preview);
    self
      .ctx
      .metrics
      .last_preview_success_count
      .set(i64::from(preview.success_count));

    if !preview.is_viable() {
      warn!(
        error_count = preview.error_count,
        "No members can execute this swap, skipping"
      );
      self.ctx.metrics.zero_viable_previews.inc();
      return Ok(ExecutionOutcome::NoViableMembers);
    }

    if self.ctx.simulation {
      info!(
        success_count = preview.success_count,
        "[DRY RUN] Would execute swap (not executing)"
      );
      self.ctx.metrics.simulated_trades.inc();
      return Ok(ExecutionOutcome::Simulated);
    }

    let transaction_id = self
      .settlement
      .execute_swap(&self.ctx.swarm_id, proposal)
      .await
      .context("Swap execution failed")?;

    state.record_submission(TradeLedgerEntry {
      timestamp: now,
      transaction_id: transaction_id.clone(),
      proposal: proposal.clone(),
      preview: preview.summary(),
    });
    self.ctx.metrics.submitted_trades.inc();

    info!(tx_id = %transaction_id, "Trade submitted");

    Ok(ExecutionOutcome::Submitted { transaction_id })
  }

  fn log_preview(preview: &PreviewResult) {
    info!(
      total_sell = %preview.total_sell_amount,
      total_buy = %preview.total_buy_amount,
      total_fee = %preview.total_fee_amount,
      success = preview.success_count,
      members = preview.members.len(),
      "Swap preview"
    );

    if let Some(fee) = &preview.fee {
      info!(
        percentage = ?fee.percentage,
        recipient = ?fee.recipient_address,
        "Platform fee"
      );
    }

    if preview.error_count > 0 {
      warn!(errors = preview.error_count, "Some members cannot trade");
      for member in preview
        .members
        .iter()
        .filter(|m| m.error.is_some())
        .take(MAX_LOGGED_MEMBER_ERRORS)
      {
        warn!(
          member = %member.agent_wallet_address,
          error = member.error.as_deref().unwrap_or_default(),
          "Member preview error"
        );
      }
    }

    for member in preview.members.iter().filter(|m| m.error.is_none()) {
      debug!(
        member = %member.agent_wallet_address,
        sell = %member.sell_amount,
        buy = %member.buy_amount,
        impact = %member.estimated_price_impact,
        "Member preview"
      );
    }
  }
}
