//! Risk Gate - Pre-submission Trade Limits
//!
//! Enforces risk controls on every proposal before it reaches the
//! settlement API:
//! - Minimum interval since the last submitted trade
//! - Maximum sell percentage per trade
//!
//! Both checks are pure. A rejected proposal is dropped for the current
//! tick; the next tick re-evaluates from scratch.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::RiskConfig;
use crate::domain::calc::seconds;
use crate::domain::trade::TradeProposal;

/// Why a proposal was blocked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskRejection {
  #[error("min trade interval not met: {elapsed_secs}s elapsed, {min_secs}s required")]
  IntervalNotMet { elapsed_secs: i64, min_secs: u64 },

  #[error("sell percentage {percentage}% exceeds max {max}%")]
  PercentageTooHigh { percentage: f64, max: f64 },
}

impl RiskRejection {
  /// Short label for metrics.
  pub fn reason(&self) -> &'static str {
    match self {
      Self::IntervalNotMet { .. } => "interval",
      Self::PercentageTooHigh { .. } => "percentage",
    }
  }
}

/// Risk gate enforcing trading limits.
#[derive(Debug, Clone)]
pub struct RiskGate {
  /// Minimum seconds between submissions.
  min_trade_interval: u64,
  /// Maximum sell percentage per proposal.
  max_trade_percentage: f64,
}

impl RiskGate {
  /// Create a new risk gate from config.
  pub fn new(config: &RiskConfig) -> Self {
    Self {
      min_trade_interval: config.min_trade_interval,
      max_trade_percentage: config.max_trade_percentage,
    }
  }

  /// Check a proposal against both limits.
  ///
  /// No previous trade always satisfies the interval check.
  ///
  /// # Errors
  /// Returns the first violated limit.
  pub fn check(
    &self,
    proposal: &TradeProposal,
    last_trade_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
  ) -> Result<(), RiskRejection> {
    if let Some(last) = last_trade_at {
      let elapsed = now - last;
      if elapsed < seconds(self.min_trade_interval) {
        return Err(RiskRejection::IntervalNotMet {
          elapsed_secs: elapsed.num_seconds(),
          min_secs: self.min_trade_interval,
        });
      }
    }

    if proposal.sell_percentage > self.max_trade_percentage {
      return Err(RiskRejection::PercentageTooHigh {
        percentage: proposal.sell_percentage,
        max: self.max_trade_percentage,
      });
    }

    Ok(())
  }

  /// Boolean form of [`check`](Self::check) that logs the rejection.
  pub fn check_risk_limits(
    &self,
    proposal: &TradeProposal,
    last_trade_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
  ) -> bool {
    match self.check(proposal, last_trade_at, now) {
      Ok(()) => {
        debug!(proposal = %proposal, "Risk checks passed");
        true
      }
      Err(rejection) => {
        warn!(reason = rejection.reason(), "Trade blocked: {rejection}");
        false
      }
    }
  }
}
