//! Domain layer - Core trading decisions and models.
//!
//! Pure logic for the swarm trading bot: holdings snapshots, trade
//! proposals and previews, the strategy variants, and the trade ledger.
//! No I/O here (hexagonal architecture inner ring); time comes in
//! through [`strategy::DecisionContext`].

pub mod calc;
pub mod error;
pub mod holdings;
pub mod strategy;
pub mod tokens;
pub mod trade;

// Re-export core types for convenience
pub use error::{ConfigError, TokenLookupError};
pub use holdings::{HoldingsSnapshot, NATIVE_TOKEN_ADDRESS, TokenAddress, TokenHolding};
pub use strategy::{DecisionContext, Strategy, StrategyEngine};
pub use trade::{
    PreviewResult, PreviewSummary, StrategyState, TradeLedger, TradeLedgerEntry, TradeProposal,
    Transaction, TransactionId, TransactionStatus,
};
