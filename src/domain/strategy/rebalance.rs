//! Portfolio rebalancing.
//!
//! Keeps the swarm near a target allocation. Each tracked token's share
//! of total snapshot value is compared with its target; once the largest
//! absolute drift exceeds `drift_threshold`, the most over-allocated
//! token is partly swapped into the most under-allocated one.
//!
//! Value is the human-unit balance, not a price-adjusted value. Mixed
//! portfolios are therefore only comparable when their tokens trade
//! near parity.

use tracing::{debug, info, warn};

use super::{DecisionContext, Strategy, check_slippage, token_label};
use crate::domain::error::ConfigError;
use crate::domain::holdings::{HoldingsSnapshot, TokenAddress, same_token};
use crate::domain::trade::TradeProposal;

/// Allowed deviation of the allocation sum from 100%.
pub const ALLOCATION_SUM_TOLERANCE: f64 = 0.01;

/// Upper bound on a single rebalancing swap, in percent of the position.
pub const MAX_REBALANCE_PERCENTAGE: f64 = 50.0;

/// Validated rebalancing parameters.
#[derive(Debug, Clone)]
pub struct RebalanceSettings {
    /// Target share per tracked token, in percent. Must sum to 100.
    pub target_allocation: Vec<(TokenAddress, f64)>,
    /// Drift (percentage points) that triggers a rebalance.
    pub drift_threshold: f64,
    /// Slippage tolerance in percent.
    pub slippage_percentage: f64,
}

/// Current share of one tracked token next to its target.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationDrift {
    pub token: TokenAddress,
    pub target_pct: f64,
    pub current_pct: f64,
}

impl AllocationDrift {
    /// Signed deviation: positive when over-allocated.
    pub fn deviation(&self) -> f64 {
        self.current_pct - self.target_pct
    }
}

/// Allocation-drift strategy.
#[derive(Debug, Clone)]
pub struct RebalanceStrategy {
    settings: RebalanceSettings,
}

impl RebalanceStrategy {
    /// Validate settings and build the strategy.
    ///
    /// # Errors
    /// Rejects allocations that do not sum to 100 ± 0.01 and bad slippage.
    pub fn new(settings: RebalanceSettings) -> Result<Self, ConfigError> {
        let total: f64 = settings.target_allocation.iter().map(|(_, pct)| pct).sum();
        if (total - 100.0).abs() > ALLOCATION_SUM_TOLERANCE {
            return Err(ConfigError::AllocationSum(total));
        }
        check_slippage(settings.slippage_percentage)?;

        info!(
            tokens = settings.target_allocation.len(),
            drift_threshold = settings.drift_threshold,
            "Rebalancing strategy initialized"
        );
        for (token, pct) in &settings.target_allocation {
            info!(token = %token, target_pct = pct, "Target allocation");
        }

        Ok(Self { settings })
    }

    pub fn settings(&self) -> &RebalanceSettings {
        &self.settings
    }

    /// Current vs target share for every tracked token.
    ///
    /// Returns `None` when the snapshot has zero total value.
    pub fn drifts(&self, snapshot: &HoldingsSnapshot) -> Option<Vec<AllocationDrift>> {
        let values = snapshot.values();
        let total: f64 = values.iter().map(|(_, v)| v).sum();
        if total <= 0.0 {
            return None;
        }

        let drifts = self
            .settings
            .target_allocation
            .iter()
            .map(|(token, target_pct)| {
                let value = values
                    .iter()
                    .find(|(address, _)| same_token(address, token))
                    .map_or(0.0, |(_, v)| *v);
                AllocationDrift {
                    token: token.clone(),
                    target_pct: *target_pct,
                    current_pct: value / total * 100.0,
                }
            })
            .collect();

        Some(drifts)
    }
}

impl Strategy for RebalanceStrategy {
    fn name(&self) -> &'static str {
        "rebalance"
    }

    fn describe(&self) -> String {
        let targets: Vec<String> = self
            .settings
            .target_allocation
            .iter()
            .map(|(token, pct)| format!("{} {pct}%", token_label(token)))
            .collect();
        format!(
            "Rebalance to [{}] when drift exceeds {}%",
            targets.join(", "),
            self.settings.drift_threshold
        )
    }

    fn should_trade(&mut self, _ctx: &DecisionContext, snapshot: &HoldingsSnapshot) -> bool {
        let Some(drifts) = self.drifts(snapshot) else {
            warn!("Portfolio has zero value");
            return false;
        };

        let max_drift = drifts
            .iter()
            .map(|d| d.deviation().abs())
            .fold(0.0_f64, f64::max);

        for d in &drifts {
            info!(
                token = %d.token,
                target_pct = d.target_pct,
                current_pct = format!("{:.1}", d.current_pct),
                drift = format!("{:.1}", d.deviation().abs()),
                "Allocation status"
            );
        }

        if max_drift > self.settings.drift_threshold {
            info!(
                max_drift = format!("{max_drift:.1}"),
                threshold = self.settings.drift_threshold,
                "Rebalancing needed"
            );
            return true;
        }

        debug!(
            max_drift = format!("{max_drift:.1}"),
            threshold = self.settings.drift_threshold,
            "Portfolio balanced"
        );
        false
    }

    fn propose_trade(
        &self,
        _ctx: &DecisionContext,
        snapshot: &HoldingsSnapshot,
    ) -> Option<TradeProposal> {
        let drifts = self.drifts(snapshot)?;

        let mut over: Option<(&AllocationDrift, f64)> = None;
        let mut under: Option<(&AllocationDrift, f64)> = None;

        for d in &drifts {
            let deviation = d.deviation();
            if deviation > over.map_or(0.0, |(_, v)| v) {
                over = Some((d, deviation));
            } else if deviation < -under.map_or(0.0, |(_, v)| v) {
                under = Some((d, -deviation));
            }
        }

        let (Some((over, overweight)), Some((under, _))) = (over, under) else {
            warn!("Could not determine rebalancing trade");
            return None;
        };

        let sell_percentage = (overweight * 2.0).min(MAX_REBALANCE_PERCENTAGE);

        info!(
            sell_percentage = format!("{sell_percentage:.1}"),
            sell_token = %over.token,
            buy_token = %under.token,
            "Rebalancing trade"
        );

        Some(TradeProposal {
            sell_token: over.token.clone(),
            buy_token: under.token.clone(),
            sell_percentage,
            slippage_percentage: self.settings.slippage_percentage,
        })
    }
}
