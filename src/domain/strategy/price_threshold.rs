//! Price-threshold trading.
//!
//! Tracks a reference "price" and fires the first configured rule whose
//! threshold the current price has crossed. The price is the ratio of
//! buy-token to sell-token balance in the snapshot, a placeholder for a
//! real oracle.
//!
//! Memory:
//! - `reference_price` is seeded on the first successful observation
//!   (no trade that tick) and reset to the current price whenever a rule
//!   fires, so the same rule cannot refire until the price moves past the
//!   threshold again from the new reference.
//! - `fired` remembers which rule fired during the last `should_trade`,
//!   so `propose_trade` uses that rule instead of re-evaluating against
//!   the freshly reset reference.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{DecisionContext, Strategy, check_sell_percentage, check_slippage, token_label};
use crate::domain::calc::percentage_change;
use crate::domain::error::ConfigError;
use crate::domain::holdings::{HoldingsSnapshot, TokenAddress};
use crate::domain::trade::TradeProposal;

/// Direction of price movement a rule reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCondition {
    PriceDrop,
    PriceIncrease,
}

/// What to do when a rule fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Swap configured sell token into configured buy token.
    #[default]
    Buy,
    /// Swap the other way round.
    Sell,
}

fn default_rule_sell_percentage() -> f64 {
    10.0
}

/// One threshold rule. Rules are evaluated in order; first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRule {
    pub condition: PriceCondition,
    /// Magnitude of the move (percent, non-negative).
    pub threshold_percentage: f64,
    #[serde(default)]
    pub action: RuleAction,
    #[serde(default = "default_rule_sell_percentage")]
    pub sell_percentage: f64,
}

impl PriceRule {
    /// Whether a percentage change satisfies this rule.
    pub fn matches(&self, change_pct: f64) -> bool {
        match self.condition {
            PriceCondition::PriceDrop => change_pct <= -self.threshold_percentage,
            PriceCondition::PriceIncrease => change_pct >= self.threshold_percentage,
        }
    }
}

/// Validated price-threshold parameters.
#[derive(Debug, Clone)]
pub struct PriceThresholdSettings {
    pub sell_token: TokenAddress,
    pub buy_token: TokenAddress,
    pub rules: Vec<PriceRule>,
    pub slippage_percentage: f64,
}

/// Threshold strategy with reference-price memory.
#[derive(Debug, Clone)]
pub struct PriceThresholdStrategy {
    settings: PriceThresholdSettings,
    reference_price: Option<f64>,
    fired: Option<usize>,
}

impl PriceThresholdStrategy {
    /// Validate settings and build the strategy.
    ///
    /// # Errors
    /// Rejects an empty rule list, negative thresholds and out-of-range
    /// percentages.
    pub fn new(settings: PriceThresholdSettings) -> Result<Self, ConfigError> {
        if settings.rules.is_empty() {
            return Err(ConfigError::MissingKey {
                strategy: "price_based",
                key: "rules",
            });
        }
        for rule in &settings.rules {
            if rule.threshold_percentage < 0.0 || !rule.threshold_percentage.is_finite() {
                return Err(ConfigError::OutOfRange {
                    field: "threshold_percentage",
                    range: "[0, inf)",
                    value: rule.threshold_percentage,
                });
            }
            check_sell_percentage("rules.sell_percentage", rule.sell_percentage)?;
        }
        check_slippage(settings.slippage_percentage)?;

        info!(rules = settings.rules.len(), "Price-threshold strategy initialized");
        warn!("Price tracking uses balance ratios; integrate a price oracle for production use");

        Ok(Self {
            settings,
            reference_price: None,
            fired: None,
        })
    }

    pub fn settings(&self) -> &PriceThresholdSettings {
        &self.settings
    }

    /// Current reference price, `None` until first observed.
    pub fn reference_price(&self) -> Option<f64> {
        self.reference_price
    }

    /// Buy-token balance over sell-token balance.
    ///
    /// `None` when either balance is zero or absent.
    pub fn estimate_price(&self, snapshot: &HoldingsSnapshot) -> Option<f64> {
        let sell = snapshot.balance_of(&self.settings.sell_token).unwrap_or(0.0);
        let buy = snapshot.balance_of(&self.settings.buy_token).unwrap_or(0.0);
        if sell <= 0.0 || buy <= 0.0 {
            return None;
        }
        Some(buy / sell)
    }

    fn matching_rule(&self, change_pct: f64) -> Option<usize> {
        self.settings.rules.iter().position(|r| r.matches(change_pct))
    }

    fn proposal_for(&self, rule: &PriceRule) -> TradeProposal {
        let (sell_token, buy_token) = match rule.action {
            RuleAction::Buy => (&self.settings.sell_token, &self.settings.buy_token),
            RuleAction::Sell => (&self.settings.buy_token, &self.settings.sell_token),
        };
        TradeProposal {
            sell_token: sell_token.clone(),
            buy_token: buy_token.clone(),
            sell_percentage: rule.sell_percentage,
            slippage_percentage: self.settings.slippage_percentage,
        }
    }
}

impl Strategy for PriceThresholdStrategy {
    fn name(&self) -> &'static str {
        "price_based"
    }

    fn describe(&self) -> String {
        format!(
            "{} price rule(s) on {}/{}",
            self.settings.rules.len(),
            token_label(&self.settings.buy_token),
            token_label(&self.settings.sell_token)
        )
    }

    fn should_trade(&mut self, _ctx: &DecisionContext, snapshot: &HoldingsSnapshot) -> bool {
        self.fired = None;

        let Some(price) = self.estimate_price(snapshot) else {
            warn!("Could not estimate current price");
            return false;
        };

        let Some(reference) = self.reference_price else {
            info!(reference_price = format!("{price:.6}"), "Set reference price");
            self.reference_price = Some(price);
            return false;
        };

        let change = percentage_change(reference, price);
        info!(
            change_pct = format!("{change:+.2}"),
            reference_price = format!("{reference:.6}"),
            current_price = format!("{price:.6}"),
            "Price change"
        );

        let Some(index) = self.matching_rule(change) else {
            return false;
        };

        let rule = &self.settings.rules[index];
        info!(
            condition = ?rule.condition,
            threshold = rule.threshold_percentage,
            change_pct = format!("{change:.2}"),
            "Price rule triggered"
        );

        self.reference_price = Some(price);
        self.fired = Some(index);
        true
    }

    fn propose_trade(
        &self,
        _ctx: &DecisionContext,
        snapshot: &HoldingsSnapshot,
    ) -> Option<TradeProposal> {
        let index = match self.fired {
            Some(index) => index,
            None => {
                let price = self.estimate_price(snapshot)?;
                let change = percentage_change(self.reference_price?, price);
                self.matching_rule(change)?
            }
        };

        self.settings.rules.get(index).map(|rule| self.proposal_for(rule))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::strategy::test_support::snapshot;

    const SELL: &str = "0xsell";
    const BUY: &str = "0xbuy";

    fn rule(condition: PriceCondition, threshold: f64, action: RuleAction) -> PriceRule {
        PriceRule {
            condition,
            threshold_percentage: threshold,
            action,
            sell_percentage: 25.0,
        }
    }

    fn strategy(rules: Vec<PriceRule>) -> PriceThresholdStrategy {
        PriceThresholdStrategy::new(PriceThresholdSettings {
            sell_token: SELL.to_string(),
            buy_token: BUY.to_string(),
            rules,
            slippage_percentage: 1.0,
        })
        .unwrap()
    }

    /// Snapshot whose buy/sell ratio equals `price` (sell balance 1000).
    fn at_price(price: u64) -> HoldingsSnapshot {
        snapshot("0", &[(SELL, 1000), (BUY, price * 1000)])
    }

    fn ctx() -> DecisionContext {
        DecisionContext::new(Utc::now(), None)
    }

    #[test]
    fn test_first_observation_seeds_reference() {
        let mut s = strategy(vec![rule(PriceCondition::PriceDrop, 10.0, RuleAction::Buy)]);
        assert!(!s.should_trade(&ctx(), &at_price(100)));
        assert_eq!(s.reference_price(), Some(100.0));
    }

    #[test]
    fn test_drop_fires_and_resets_reference() {
        let mut s = strategy(vec![rule(PriceCondition::PriceDrop, 10.0, RuleAction::Buy)]);
        s.should_trade(&ctx(), &at_price(100));

        assert!(!s.should_trade(&ctx(), &at_price(91)));
        assert_eq!(s.reference_price(), Some(100.0));

        assert!(s.should_trade(&ctx(), &at_price(89)));
        assert_eq!(s.reference_price(), Some(89.0));

        let proposal = s.propose_trade(&ctx(), &at_price(89)).unwrap();
        assert_eq!(proposal.sell_token, SELL);
        assert_eq!(proposal.buy_token, BUY);
        assert_eq!(proposal.sell_percentage, 25.0);
    }

    #[test]
    fn test_fired_rule_does_not_refire_at_same_price() {
        let mut s = strategy(vec![rule(PriceCondition::PriceDrop, 10.0, RuleAction::Buy)]);
        s.should_trade(&ctx(), &at_price(100));
        assert!(s.should_trade(&ctx(), &at_price(89)));
        assert!(!s.should_trade(&ctx(), &at_price(89)));
    }

    #[test]
    fn test_sell_action_reverses_direction() {
        let mut s = strategy(vec![rule(
            PriceCondition::PriceIncrease,
            5.0,
            RuleAction::Sell,
        )]);
        s.should_trade(&ctx(), &at_price(100));
        assert!(s.should_trade(&ctx(), &at_price(110)));

        let proposal = s.propose_trade(&ctx(), &at_price(110)).unwrap();
        assert_eq!(proposal.sell_token, BUY);
        assert_eq!(proposal.buy_token, SELL);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut s = strategy(vec![
            PriceRule {
                sell_percentage: 5.0,
                ..rule(PriceCondition::PriceDrop, 5.0, RuleAction::Buy)
            },
            PriceRule {
                sell_percentage: 50.0,
                ..rule(PriceCondition::PriceDrop, 20.0, RuleAction::Buy)
            },
        ]);
        s.should_trade(&ctx(), &at_price(100));
        assert!(s.should_trade(&ctx(), &at_price(70)));
        let proposal = s.propose_trade(&ctx(), &at_price(70)).unwrap();
        assert_eq!(proposal.sell_percentage, 5.0);
    }

    #[test]
    fn test_zero_balance_gives_no_price() {
        let mut s = strategy(vec![rule(PriceCondition::PriceDrop, 10.0, RuleAction::Buy)]);
        let snap = snapshot("0", &[(SELL, 1000), (BUY, 0)]);
        assert!(s.estimate_price(&snap).is_none());
        assert!(!s.should_trade(&ctx(), &snap));
        assert!(s.reference_price().is_none());
    }

    #[test]
    fn test_propose_without_should_trade_is_read_only() {
        let mut s = strategy(vec![rule(PriceCondition::PriceDrop, 10.0, RuleAction::Buy)]);
        assert!(s.propose_trade(&ctx(), &at_price(100)).is_none());
        s.should_trade(&ctx(), &at_price(100));

        assert!(s.propose_trade(&ctx(), &at_price(80)).is_some());
        assert_eq!(s.reference_price(), Some(100.0));
    }

    #[test]
    fn test_rejects_empty_rules() {
        let err = PriceThresholdStrategy::new(PriceThresholdSettings {
            sell_token: SELL.to_string(),
            buy_token: BUY.to_string(),
            rules: vec![],
            slippage_percentage: 1.0,
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "rules", .. }));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: PriceRule =
            toml::from_str("condition = \"price_increase\"\nthreshold_percentage = 15.0").unwrap();
        assert_eq!(rule.condition, PriceCondition::PriceIncrease);
        assert_eq!(rule.action, RuleAction::Buy);
        assert_eq!(rule.sell_percentage, 10.0);
    }
}
