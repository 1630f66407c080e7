//! Orchestrator - Periodic Decision Loop
//!
//! One tick, in strict order:
//! 1. Fetch a holdings snapshot
//! 2. Ask the strategy whether a trade is due, then for a proposal
//! 3. Gate the proposal through the risk limits
//! 4. Preview and (outside simulation) execute it
//! 5. Monitor the submitted transaction to a terminal outcome
//!
//! Ticks are strictly sequential: the next one starts only after the
//! previous tick, including settlement monitoring, has finished and the
//! check interval has elapsed. Tick errors are logged and counted, never
//! fatal to the loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::context::TradingContext;
use super::risk_gate::{RiskGate, RiskRejection};
use super::shutdown::sleep_or_shutdown;
use super::trade_executor::{ExecutionOutcome, TradeExecutor};
use super::transaction_monitor::{SettlementOutcome, TransactionMonitor};
use crate::domain::holdings::{HoldingsSnapshot, NATIVE_DECIMALS, format_token_amount};
use crate::domain::strategy::{DecisionContext, Strategy, StrategyEngine};
use crate::domain::trade::{StrategyState, TransactionId};
use crate::ports::holdings::HoldingsSource;
use crate::ports::settlement::SwapSettlement;

/// Tokens listed individually in the per-tick holdings log.
const LOGGED_TOKENS: usize = 5;

/// How a single tick ended.
#[derive(Debug, Clone)]
pub enum TickOutcome {
  /// Strategy saw no reason to trade.
  NoSignal,
  /// Trade was due but no sensible proposal existed.
  NoProposal,
  /// Risk gate rejected the proposal.
  Blocked(RiskRejection),
  /// Preview showed no member able to trade.
  NoViableMembers,
  /// Preview succeeded; simulation mode stopped before execution.
  Simulated,
  /// Submitted, but settlement could not be observed.
  Submitted { transaction_id: TransactionId },
  /// Submitted and monitored to an outcome.
  Settled {
    transaction_id: TransactionId,
    outcome: SettlementOutcome,
  },
}

impl TickOutcome {
  /// Label for logs.
  pub fn label(&self) -> &'static str {
    match self {
      Self::NoSignal => "no_signal",
      Self::NoProposal => "no_proposal",
      Self::Blocked(_) => "blocked",
      Self::NoViableMembers => "no_viable_members",
      Self::Simulated => "simulated",
      Self::Submitted { .. } => "submitted",
      Self::Settled { .. } => "settled",
    }
  }
}

/// Summary logged when the loop stops.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReport {
  pub iterations: u64,
  pub total_trades: usize,
  pub strategy: &'static str,
  pub last_trade_at: Option<DateTime<Utc>>,
  pub simulation: bool,
}

/// Drives the strategy, risk gate, executor and monitor on a fixed cadence.
pub struct Orchestrator<H: HoldingsSource, S: SwapSettlement> {
  /// Holdings adapter.
  holdings: Arc<H>,
  /// Active strategy.
  strategy: StrategyEngine,
  /// Ledger and last-trade time.
  state: StrategyState,
  /// Pre-submission limits.
  risk_gate: RiskGate,
  /// Preview/submit step.
  executor: TradeExecutor<S>,
  /// Settlement tracking.
  monitor: TransactionMonitor<S>,
  /// Run context.
  ctx: TradingContext,
  /// Delay between ticks.
  check_interval: Duration,
  /// Ticks started.
  iteration: u64,
  /// Shutdown signal receiver.
  shutdown_rx: watch::Receiver<bool>,
}

impl<H: HoldingsSource, S: SwapSettlement> Orchestrator<H, S> {
  /// Create a new orchestrator.
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    holdings: Arc<H>,
    settlement: Arc<S>,
    strategy: StrategyEngine,
    risk_gate: RiskGate,
    monitor: TransactionMonitor<S>,
    ctx: TradingContext,
    check_interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
  ) -> Self {
    Self {
      holdings,
      executor: TradeExecutor::new(settlement, ctx.clone()),
      strategy,
      state: StrategyState::new(),
      risk_gate,
      monitor,
      ctx,
      check_interval,
      iteration: 0,
      shutdown_rx,
    }
  }

  /// Ticks started so far.
  pub fn iterations(&self) -> u64 {
    self.iteration
  }

  /// Ledger and last-trade time.
  pub fn state(&self) -> &StrategyState {
    &self.state
  }

  /// Active strategy.
  pub fn strategy(&self) -> &StrategyEngine {
    &self.strategy
  }

  /// Run ticks until shutdown, then log the final report.
  pub async fn run(&mut self) -> FinalReport {
    info!(
      strategy = self.strategy.name(),
      description = %self.strategy.describe(),
      interval_secs = self.check_interval.as_secs(),
      simulation = self.ctx.simulation,
      "Starting decision loop"
    );

    loop {
      if *self.shutdown_rx.borrow() {
        break;
      }

      match self.tick().await {
        Ok(outcome) => debug!(outcome = outcome.label(), "Tick finished"),
        Err(e) => {
          self.ctx.metrics.tick_errors.inc();
          error!(error = format!("{e:#}"), "Error in strategy iteration");
        }
      }

      debug!(secs = self.check_interval.as_secs(), "Sleeping until next iteration");
      let interval = self.check_interval;
      if sleep_or_shutdown(interval, &mut self.shutdown_rx).await {
        info!("Shutdown signal received, stopping decision loop");
        break;
      }
    }

    let report = self.report();
    info!(
      iterations = report.iterations,
      total_trades = report.total_trades,
      strategy = report.strategy,
      last_trade_at = ?report.last_trade_at,
      simulation = report.simulation,
      "Trading bot shutting down"
    );
    report
  }

  /// Current run summary.
  pub fn report(&self) -> FinalReport {
    FinalReport {
      iterations: self.iteration,
      total_trades: self.state.ledger().len(),
      strategy: self.strategy.name(),
      last_trade_at: self.state.last_trade_at(),
      simulation: self.ctx.simulation,
    }
  }

  /// Run one full decision tick.
  ///
  /// # Errors
  /// Transport or API errors before a trade is submitted. Errors while
  /// monitoring an already submitted trade are logged and reported as
  /// [`TickOutcome::Submitted`].
  pub async fn tick(&mut self) -> Result<TickOutcome> {
    self.iteration += 1;
    self.ctx.metrics.iterations.inc();

    let span = info_span!("iteration", n = self.iteration, swarm_id = %self.ctx.swarm_id);
    self.tick_inner().instrument(span).await
  }

  async fn tick_inner(&mut self) -> Result<TickOutcome> {
    info!("Iteration started");

    let snapshot = self
      .holdings
      .get_holdings(&self.ctx.swarm_id)
      .await
      .context("Failed to fetch holdings")?;
    log_holdings(&snapshot);

    let now = Utc::now();
    let decision = DecisionContext::new(now, self.state.last_trade_at());

    if !self.strategy.should_trade(&decision, &snapshot) {
      debug!("Trade conditions not met");
      return Ok(TickOutcome::NoSignal);
    }

    let Some(proposal) = self.strategy.propose_trade(&decision, &snapshot) else {
      debug!("No trade parameters generated");
      return Ok(TickOutcome::NoProposal);
    };

    info!(proposal = %proposal, "Trade proposed");

    if let Err(rejection) = self.risk_gate.check(&proposal, self.state.last_trade_at(), now) {
      warn!(reason = rejection.reason(), "Trade blocked by risk management: {rejection}");
      self
        .ctx
        .metrics
        .proposals_blocked
        .with_label_values(&[rejection.reason()])
        .inc();
      return Ok(TickOutcome::Blocked(rejection));
    }

    let transaction_id = match self.executor.execute(&proposal, &mut self.state, now).await? {
      ExecutionOutcome::NoViableMembers => return Ok(TickOutcome::NoViableMembers),
      ExecutionOutcome::Simulated => return Ok(TickOutcome::Simulated),
      ExecutionOutcome::Submitted { transaction_id } => transaction_id,
    };

    match self
      .monitor
      .await_settlement(&transaction_id, &mut self.shutdown_rx)
      .await
    {
      Ok(outcome) => {
        info!(tx_id = %transaction_id, outcome = outcome.label(), "Transaction settled");
        self
          .ctx
          .metrics
          .settlement_outcomes
          .with_label_values(&[outcome.label()])
          .inc();
        Ok(TickOutcome::Settled {
          transaction_id,
          outcome,
        })
      }
      Err(e) => {
        self.ctx.metrics.tick_errors.inc();
        error!(tx_id = %transaction_id, error = format!("{e:#}"), "Error waiting for transaction");
        Ok(TickOutcome::Submitted { transaction_id })
      }
    }
  }
}

fn log_holdings(snapshot: &HoldingsSnapshot) {
  info!(
    eth = %format_token_amount(&snapshot.native_balance, NATIVE_DECIMALS, 4),
    tokens = snapshot.tokens.len(),
    members = snapshot.member_count,
    "Current holdings"
  );
  for token in snapshot.tokens.iter().take(LOGGED_TOKENS) {
    let raw = token.total_balance.as_deref().unwrap_or(&token.balance);
    info!(
      symbol = %token.symbol,
      amount = %format_token_amount(raw, token.decimals, 4),
      "Token holding"
    );
  }
}
