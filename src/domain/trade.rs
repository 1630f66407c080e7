//! Core trading domain types.
//!
//! Proposals, swap previews, settlement transactions and the in-memory
//! trade ledger. These types are the vocabulary shared by strategies,
//! the risk gate, the executor and the transaction monitor.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::holdings::TokenAddress;

/// Lightweight transaction identifier assigned by the settlement API.
pub type TransactionId = String;

// ────────────────────────────────────────────
// Proposals
// ────────────────────────────────────────────

/// A swap a strategy wants the whole swarm to perform.
///
/// Immutable once produced. `sell_percentage` is the share of each
/// member's sell-token balance to swap, in (0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    /// Token sold by every member.
    pub sell_token: TokenAddress,
    /// Token bought by every member.
    pub buy_token: TokenAddress,
    /// Percentage of the sell-token balance to swap.
    pub sell_percentage: f64,
    /// Slippage tolerance in percent.
    pub slippage_percentage: f64,
}

impl std::fmt::Display for TradeProposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2}% of {} -> {} (slippage {}%)",
            self.sell_percentage, self.sell_token, self.buy_token, self.slippage_percentage
        )
    }
}

// ────────────────────────────────────────────
// Previews
// ────────────────────────────────────────────

/// Projected swap outcome for one swarm member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPreview {
    /// Membership record ID.
    pub membership_id: String,
    /// Member user ID.
    pub user_id: String,
    /// Member's own wallet.
    pub user_wallet_address: String,
    /// Agent wallet that signs on the member's behalf.
    pub agent_wallet_address: String,
    /// Raw sell amount.
    pub sell_amount: String,
    /// Raw expected buy amount.
    pub buy_amount: String,
    /// Raw fee amount.
    pub fee_amount: String,
    /// Estimated price impact as reported by the API.
    pub estimated_price_impact: String,
    /// Why this member cannot execute, if it cannot.
    pub error: Option<String>,
}

/// Platform fee terms attached to a preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformFee {
    /// Fee rate as reported (number or string).
    pub percentage: Option<serde_json::Value>,
    /// Where the fee is sent.
    pub recipient_address: Option<String>,
}

/// Aggregated and per-member projection of a proposal.
///
/// Transient: used once to gate execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResult {
    /// Echoed sell token.
    pub sell_token: TokenAddress,
    /// Echoed buy token.
    pub buy_token: TokenAddress,
    /// Echoed sell percentage.
    pub sell_percentage: f64,
    /// Echoed slippage tolerance.
    pub slippage_percentage: f64,
    /// Per-member projections.
    pub members: Vec<MemberPreview>,
    /// Raw total sell amount.
    pub total_sell_amount: String,
    /// Raw total buy amount.
    pub total_buy_amount: String,
    /// Raw total fee amount.
    pub total_fee_amount: String,
    /// Members able to execute.
    pub success_count: u32,
    /// Members unable to execute.
    pub error_count: u32,
    /// Platform fee terms, if any.
    pub fee: Option<PlatformFee>,
}

impl PreviewResult {
    /// At least one member can execute the swap.
    pub fn is_viable(&self) -> bool {
        self.success_count > 0
    }

    /// Condensed form kept in the trade ledger.
    pub fn summary(&self) -> PreviewSummary {
        PreviewSummary {
            total_sell: self.total_sell_amount.clone(),
            total_buy: self.total_buy_amount.clone(),
            success_count: self.success_count,
        }
    }
}

/// Preview figures retained alongside a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSummary {
    /// Raw total sell amount.
    pub total_sell: String,
    /// Raw total buy amount.
    pub total_buy: String,
    /// Members able to execute at preview time.
    pub success_count: u32,
}

// ────────────────────────────────────────────
// Transactions
// ────────────────────────────────────────────

/// Settlement status of a multi-member transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Accepted, no member processed yet.
    Pending,
    /// Members are being processed.
    Processing,
    /// Terminal: settled.
    Completed,
    /// Terminal: settlement failed.
    Failed,
    /// Any status this client does not recognise; treated as non-terminal.
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// Whether the external settlement system will change this status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Settlement progress of one member of a transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionTarget {
    /// Target record ID.
    pub id: Option<String>,
    /// Membership the target belongs to.
    pub membership_id: Option<String>,
    /// Per-member status as reported.
    pub status: Option<String>,
    /// On-chain hash once broadcast.
    pub tx_hash: Option<String>,
    /// Failure reason.
    pub error: Option<String>,
}

/// A submitted swap as tracked by the settlement system.
///
/// Mutated only by the external system; this crate only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Owning swarm.
    pub swarm_id: String,
    /// Current status.
    pub status: TransactionStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Number of members targeted.
    pub target_count: Option<u32>,
    /// Member counts keyed by per-member status (`confirmed`, `failed`, ...).
    pub status_counts: Option<HashMap<String, u32>>,
    /// Per-member targets.
    pub targets: Vec<TransactionTarget>,
}

impl Transaction {
    /// Members whose swap confirmed.
    pub fn confirmed_count(&self) -> u32 {
        self.count("confirmed")
    }

    /// Members whose swap failed.
    pub fn failed_count(&self) -> u32 {
        self.count("failed")
    }

    fn count(&self, key: &str) -> u32 {
        self.status_counts
            .iter()
            .flatten()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map_or(0, |(_, v)| *v)
    }
}

// ────────────────────────────────────────────
// Ledger and strategy state
// ────────────────────────────────────────────

/// One submitted trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLedgerEntry {
    /// Submission time.
    pub timestamp: DateTime<Utc>,
    /// Transaction returned by the execute call.
    pub transaction_id: TransactionId,
    /// The proposal that was submitted.
    pub proposal: TradeProposal,
    /// Preview figures that gated the submission.
    pub preview: PreviewSummary,
}

/// Append-only in-memory record of submitted trades.
#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    entries: Vec<TradeLedgerEntry>,
}

impl TradeLedger {
    /// Append an entry.
    pub fn record(&mut self, entry: TradeLedgerEntry) {
        self.entries.push(entry);
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[TradeLedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&TradeLedgerEntry> {
        self.entries.last()
    }
}

/// Mutable run state shared by the strategy and the executor.
///
/// Owned by the orchestrator for the lifetime of the run. Only a
/// successful submission mutates it, through [`StrategyState::record_submission`].
#[derive(Debug, Clone, Default)]
pub struct StrategyState {
    last_trade_at: Option<DateTime<Utc>>,
    ledger: TradeLedger,
}

impl StrategyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time of the last submitted trade, `None` before the first one.
    pub fn last_trade_at(&self) -> Option<DateTime<Utc>> {
        self.last_trade_at
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Record a submission: append to the ledger and move the last trade time.
    ///
    /// Both updates happen together so the next tick never sees one without the other.
    pub fn record_submission(&mut self, entry: TradeLedgerEntry) {
        self.last_trade_at = Some(entry.timestamp);
        self.ledger.record(entry);
    }
}
