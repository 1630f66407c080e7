//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the bot's core workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `Orchestrator`: Periodic holdings → strategy → risk → execute loop
//! - `RiskGate`: Minimum trade interval and sell-percentage cap
//! - `TradeExecutor`: Preview, viability check, submission
//! - `TransactionMonitor`: Settlement polling with timeout
//! - `shutdown`: Signal handling and interruptible sleeps

pub mod context;
pub mod orchestrator;
pub mod risk_gate;
pub mod shutdown;
pub mod trade_executor;
pub mod transaction_monitor;

pub use context::TradingContext;
pub use orchestrator::{FinalReport, Orchestrator, TickOutcome};
pub use risk_gate::{RiskGate, RiskRejection};
pub use trade_executor::{ExecutionOutcome, TradeExecutor};
pub use transaction_monitor::{SettlementOutcome, TransactionMonitor};
