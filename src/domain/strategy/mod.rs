//! Trading strategies.
//!
//! Every strategy answers two questions about a holdings snapshot:
//! is a trade due (`should_trade`), and if so which one (`propose_trade`).
//! The set of strategies is closed; [`StrategyEngine`] is the tagged
//! union the orchestrator drives.
//!
//! Strategies:
//! - `dca`: fixed-size swap on a fixed interval
//! - `rebalance`: swap from the most over- to the most under-allocated token
//! - `price_based`: swap when the balance ratio crosses configured thresholds

pub mod dca;
pub mod price_threshold;
pub mod rebalance;

use chrono::{DateTime, Utc};

use super::error::ConfigError;
use super::holdings::HoldingsSnapshot;
use super::trade::TradeProposal;

pub use dca::{DcaSettings, DcaStrategy};
pub use price_threshold::{
    PriceCondition, PriceRule, PriceThresholdSettings, PriceThresholdStrategy, RuleAction,
};
pub use rebalance::{RebalanceSettings, RebalanceStrategy};

/// Time inputs to a trading decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext {
    /// Wall-clock time of the decision.
    pub now: DateTime<Utc>,
    /// Last submitted trade, `None` before the first.
    pub last_trade_at: Option<DateTime<Utc>>,
}

impl DecisionContext {
    pub fn new(now: DateTime<Utc>, last_trade_at: Option<DateTime<Utc>>) -> Self {
        Self { now, last_trade_at }
    }
}

/// Capability shared by all strategies.
///
/// `propose_trade` takes `&self`: it may be called without a preceding
/// `should_trade` and never changes strategy memory. `should_trade` may
/// update memory where a strategy documents it.
pub trait Strategy {
    /// Config name of the strategy.
    fn name(&self) -> &'static str;

    /// One-line human summary of the configured behaviour.
    fn describe(&self) -> String;

    /// Whether trade conditions are met for this snapshot.
    fn should_trade(&mut self, ctx: &DecisionContext, snapshot: &HoldingsSnapshot) -> bool;

    /// The trade to perform, or `None` when no sensible trade exists.
    fn propose_trade(
        &self,
        ctx: &DecisionContext,
        snapshot: &HoldingsSnapshot,
    ) -> Option<TradeProposal>;
}

/// The active strategy, one of a closed set of variants.
#[derive(Debug, Clone)]
pub enum StrategyEngine {
    Dca(DcaStrategy),
    Rebalance(RebalanceStrategy),
    PriceThreshold(PriceThresholdStrategy),
}

impl Strategy for StrategyEngine {
    fn name(&self) -> &'static str {
        match self {
            Self::Dca(s) => s.name(),
            Self::Rebalance(s) => s.name(),
            Self::PriceThreshold(s) => s.name(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Dca(s) => s.describe(),
            Self::Rebalance(s) => s.describe(),
            Self::PriceThreshold(s) => s.describe(),
        }
    }

    fn should_trade(&mut self, ctx: &DecisionContext, snapshot: &HoldingsSnapshot) -> bool {
        match self {
            Self::Dca(s) => s.should_trade(ctx, snapshot),
            Self::Rebalance(s) => s.should_trade(ctx, snapshot),
            Self::PriceThreshold(s) => s.should_trade(ctx, snapshot),
        }
    }

    fn propose_trade(
        &self,
        ctx: &DecisionContext,
        snapshot: &HoldingsSnapshot,
    ) -> Option<TradeProposal> {
        match self {
            Self::Dca(s) => s.propose_trade(ctx, snapshot),
            Self::Rebalance(s) => s.propose_trade(ctx, snapshot),
            Self::PriceThreshold(s) => s.propose_trade(ctx, snapshot),
        }
    }
}

impl From<DcaStrategy> for StrategyEngine {
    fn from(s: DcaStrategy) -> Self {
        Self::Dca(s)
    }
}

impl From<RebalanceStrategy> for StrategyEngine {
    fn from(s: RebalanceStrategy) -> Self {
        Self::Rebalance(s)
    }
}

impl From<PriceThresholdStrategy> for StrategyEngine {
    fn from(s: PriceThresholdStrategy) -> Self {
        Self::PriceThreshold(s)
    }
}

/// Symbol for well-known tokens, the address otherwise.
pub(crate) fn token_label(address: &str) -> &str {
    super::tokens::symbol_for(address).unwrap_or(address)
}

/// Sell percentages must lie in (0, 100].
pub(crate) fn check_sell_percentage(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 100.0 {
        return Ok(());
    }
    Err(ConfigError::OutOfRange {
        field,
        range: "(0, 100]",
        value,
    })
}

/// Slippage tolerance must lie in (0, 50].
pub(crate) fn check_slippage(value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 50.0 {
        return Ok(());
    }
    Err(ConfigError::OutOfRange {
        field: "slippage_percentage",
        range: "(0, 50]",
        value,
    })
}
