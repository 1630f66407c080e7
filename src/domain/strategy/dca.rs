//! Dollar-cost averaging.
//!
//! Swaps a fixed percentage of one token into another every
//! `interval_secs`, regardless of price. The first evaluation always
//! trades.

use chrono::TimeDelta;
use tracing::{debug, info, warn};

use super::{DecisionContext, Strategy, check_sell_percentage, check_slippage, token_label};
use crate::domain::calc::{format_duration, seconds};
use crate::domain::error::ConfigError;
use crate::domain::holdings::{HoldingsSnapshot, TokenAddress};
use crate::domain::trade::TradeProposal;

/// Validated DCA parameters.
#[derive(Debug, Clone)]
pub struct DcaSettings {
    /// Source of funds.
    pub sell_token: TokenAddress,
    /// Accumulated token.
    pub buy_token: TokenAddress,
    /// Share of the sell-token balance swapped each time.
    pub sell_percentage: f64,
    /// Seconds between purchases.
    pub interval_secs: u64,
    /// Slippage tolerance in percent.
    pub slippage_percentage: f64,
}

/// Interval-driven strategy.
#[derive(Debug, Clone)]
pub struct DcaStrategy {
    settings: DcaSettings,
}

impl DcaStrategy {
    /// Validate settings and build the strategy.
    ///
    /// # Errors
    /// Rejects percentages outside their allowed ranges.
    pub fn new(settings: DcaSettings) -> Result<Self, ConfigError> {
        check_sell_percentage("sell_percentage", settings.sell_percentage)?;
        check_slippage(settings.slippage_percentage)?;

        info!(
            sell_percentage = settings.sell_percentage,
            sell_token = %settings.sell_token,
            buy_token = %settings.buy_token,
            interval_secs = settings.interval_secs,
            "DCA strategy initialized"
        );

        Ok(Self { settings })
    }

    pub fn settings(&self) -> &DcaSettings {
        &self.settings
    }

    fn interval(&self) -> TimeDelta {
        seconds(self.settings.interval_secs)
    }
}

impl Strategy for DcaStrategy {
    fn name(&self) -> &'static str {
        "dca"
    }

    fn describe(&self) -> String {
        format!(
            "DCA {}% of {} into {} every {}",
            self.settings.sell_percentage,
            token_label(&self.settings.sell_token),
            token_label(&self.settings.buy_token),
            format_duration(self.settings.interval_secs)
        )
    }

    fn should_trade(&mut self, ctx: &DecisionContext, _snapshot: &HoldingsSnapshot) -> bool {
        let Some(last) = ctx.last_trade_at else {
            return true;
        };

        let elapsed = ctx.now - last;
        let due = elapsed >= self.interval();

        if due {
            info!(
                elapsed_secs = elapsed.num_seconds(),
                interval_secs = self.settings.interval_secs,
                "DCA interval reached"
            );
        } else {
            debug!(
                remaining_secs = self
                    .interval()
                    .checked_sub(&elapsed)
                    .map_or(0, |d| d.num_seconds()),
                "DCA waiting for next interval"
            );
        }

        due
    }

    fn propose_trade(
        &self,
        _ctx: &DecisionContext,
        snapshot: &HoldingsSnapshot,
    ) -> Option<TradeProposal> {
        let balance = snapshot.balance_of(&self.settings.sell_token).unwrap_or(0.0);
        if balance <= 0.0 {
            warn!(sell_token = %self.settings.sell_token, "No balance for sell token");
            return None;
        }

        debug!(sell_token = %self.settings.sell_token, balance, "Sell token balance available");

        Some(TradeProposal {
            sell_token: self.settings.sell_token.clone(),
            buy_token: self.settings.buy_token.clone(),
            sell_percentage: self.settings.sell_percentage,
            slippage_percentage: self.settings.slippage_percentage,
        })
    }
}
