//! Trading Context - Shared Run Parameters
//!
//! Handed to every use case at construction instead of global state:
//! which swarm we act on, whether trades are only simulated, and where
//! metrics go.

use std::sync::Arc;

use crate::adapters::metrics::MetricsRegistry;

/// Immutable per-run context.
#[derive(Clone)]
pub struct TradingContext {
  /// Swarm all calls target.
  pub swarm_id: String,
  /// Preview-only mode: never execute swaps.
  pub simulation: bool,
  /// Metrics sink.
  pub metrics: Arc<MetricsRegistry>,
}

impl TradingContext {
  pub fn new(swarm_id: impl Into<String>, simulation: bool, metrics: Arc<MetricsRegistry>) -> Self {
    Self {
      swarm_id: swarm_id.into(),
      simulation,
      metrics,
    }
  }
}

impl std::fmt::Debug for TradingContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TradingContext")
      .field("swarm_id", &self.swarm_id)
      .field("simulation", &self.simulation)
      .finish_non_exhaustive()
  }
}
