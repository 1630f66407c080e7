//! Holdings snapshot types.
//!
//! A point-in-time view of a swarm's aggregate balances as returned by
//! the holdings endpoint. Balances are kept as raw integer strings with
//! their decimal precision; conversion to human units happens on demand.
//!
//! Strategies consume snapshots read-only. Nothing in here performs I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lightweight token identifier (checksummed or lowercase hex address).
pub type TokenAddress = String;

/// Sentinel address the settlement API uses for the chain's native asset.
pub const NATIVE_TOKEN_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

/// Decimal precision of the native asset (wei).
pub const NATIVE_DECIMALS: u8 = 18;

/// Compare two token addresses ignoring hex case.
pub fn same_token(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Convert a raw integer amount into human units.
///
/// Unparseable amounts are treated as an unavailable balance (0.0).
pub fn to_human_units(raw: &str, decimals: u8) -> f64 {
    let Ok(value) = raw.trim().parse::<u128>() else {
        return 0.0;
    };
    value as f64 / 10f64.powi(i32::from(decimals))
}

/// Format a raw amount for display with a fixed number of decimals.
pub fn format_token_amount(raw: &str, decimals: u8, precision: usize) -> String {
    format!("{:.*}", precision, to_human_units(raw, decimals))
}

/// Balance of a single ERC-20 token aggregated across the swarm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHolding {
    /// Token contract address.
    pub address: TokenAddress,
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Decimal precision of the raw balance.
    pub decimals: u8,
    /// Raw balance (integer string).
    pub balance: String,
    /// Raw balance summed over all members, when the API provides it.
    pub total_balance: Option<String>,
    /// Number of members holding a non-zero balance.
    pub holder_count: Option<u32>,
}

impl TokenHolding {
    /// Balance in human units, preferring the aggregated total.
    pub fn amount(&self) -> f64 {
        let raw = self.total_balance.as_deref().unwrap_or(&self.balance);
        to_human_units(raw, self.decimals)
    }
}

/// Aggregate holdings of a swarm at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    /// Native asset balance in wei.
    pub native_balance: String,
    /// Token balances in API order.
    pub tokens: Vec<TokenHolding>,
    /// Number of swarm members covered by the snapshot.
    pub member_count: u32,
    /// When the snapshot was fetched.
    pub captured_at: DateTime<Utc>,
}

impl HoldingsSnapshot {
    /// Native asset balance in human units.
    pub fn native_amount(&self) -> f64 {
        to_human_units(&self.native_balance, NATIVE_DECIMALS)
    }

    /// Find a token holding by address.
    pub fn holding(&self, address: &str) -> Option<&TokenHolding> {
        self.tokens.iter().find(|t| same_token(&t.address, address))
    }

    /// Human-unit balance of any token, the native sentinel included.
    ///
    /// Returns `None` when the token is absent from the snapshot.
    pub fn balance_of(&self, address: &str) -> Option<f64> {
        if same_token(address, NATIVE_TOKEN_ADDRESS) {
            return Some(self.native_amount());
        }
        self.holding(address).map(TokenHolding::amount)
    }

    /// Per-token value proxy (human-unit balance), native asset first.
    ///
    /// Balances are not price-adjusted.
    pub fn values(&self) -> Vec<(TokenAddress, f64)> {
        let mut values = Vec::with_capacity(self.tokens.len() + 1);
        values.push((NATIVE_TOKEN_ADDRESS.to_string(), self.native_amount()));
        values.extend(self.tokens.iter().map(|t| (t.address.clone(), t.amount())));
        values
    }
}
