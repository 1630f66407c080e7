//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the settlement platform. Adapters implement these traits; tests
//! substitute `mockall` doubles.
//!
//! Port categories:
//! - `HoldingsSource`: Aggregate swarm balances
//! - `SwapSettlement`: Preview, execute and track multi-party swaps
//! - `SwarmDirectory`: Identity and swarm metadata for startup checks

pub mod directory;
pub mod holdings;
pub mod settlement;

pub use directory::{Identity, SwarmDirectory, SwarmInfo};
pub use holdings::HoldingsSource;
pub use settlement::SwapSettlement;
