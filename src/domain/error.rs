//! Typed domain errors.
//!
//! Configuration problems are fatal at startup; everything else in the
//! decision loop is expressed as an outcome value, not an error.

use thiserror::Error;

/// Token symbol could not be resolved to an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown token symbol: {0}")]
pub struct TokenLookupError(pub String);

/// Invalid strategy or risk configuration, rejected before any trading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("strategy '{strategy}' requires '{key}' in configuration")]
    MissingKey {
        strategy: &'static str,
        key: &'static str,
    },

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("target allocations must sum to 100%, got {0}%")]
    AllocationSum(f64),

    #[error("{field} must be in {range}, got {value}")]
    OutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error(transparent)]
    Token(#[from] TokenLookupError),
}
