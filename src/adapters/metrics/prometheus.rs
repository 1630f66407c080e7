//! Prometheus Metrics Registry - Decision Loop Observability
//!
//! Counts what the orchestrator does each tick: iterations, errors,
//! proposals blocked by the risk gate, unviable previews, simulated and
//! submitted trades, and settlement outcomes.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Centralized Prometheus metrics for the trading bot.
///
/// All metrics follow the naming convention `swarm_bot_*`. Each instance
/// owns its registry, so tests can build as many as they like.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Ticks started.
    pub iterations: IntCounter,
    /// Ticks that ended in a transport or API error.
    pub tick_errors: IntCounter,
    /// Proposals discarded by the risk gate, by reason.
    pub proposals_blocked: IntCounterVec,
    /// Previews with zero successful members.
    pub zero_viable_previews: IntCounter,
    /// Trades that stopped after preview because of simulation mode.
    pub simulated_trades: IntCounter,
    /// Trades submitted for execution.
    pub submitted_trades: IntCounter,
    /// Settlement results, by outcome.
    pub settlement_outcomes: IntCounterVec,
    /// Success count of the most recent preview.
    pub last_preview_success_count: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    ///
    /// # Errors
    /// Fails only on duplicate registration, which cannot happen for a
    /// fresh registry.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let iterations = IntCounter::new("swarm_bot_iterations_total", "Decision ticks started")?;

        let tick_errors = IntCounter::new(
            "swarm_bot_tick_errors_total",
            "Ticks aborted by transport or API errors",
        )?;

        let proposals_blocked = IntCounterVec::new(
            Opts::new(
                "swarm_bot_proposals_blocked_total",
                "Proposals rejected by the risk gate",
            ),
            &["reason"],
        )?;

        let zero_viable_previews = IntCounter::new(
            "swarm_bot_zero_viable_previews_total",
            "Previews where no member could trade",
        )?;

        let simulated_trades = IntCounter::new(
            "swarm_bot_simulated_trades_total",
            "Trades previewed but not submitted (simulation mode)",
        )?;

        let submitted_trades = IntCounter::new(
            "swarm_bot_submitted_trades_total",
            "Trades submitted for execution",
        )?;

        let settlement_outcomes = IntCounterVec::new(
            Opts::new(
                "swarm_bot_settlement_outcomes_total",
                "Terminal outcome of monitored transactions",
            ),
            &["outcome"],
        )?;

        let last_preview_success_count = IntGauge::new(
            "swarm_bot_last_preview_success_count",
            "Members able to trade in the latest preview",
        )?;

        // Register all metrics
        registry.register(Box::new(iterations.clone()))?;
        registry.register(Box::new(tick_errors.clone()))?;
        registry.register(Box::new(proposals_blocked.clone()))?;
        registry.register(Box::new(zero_viable_previews.clone()))?;
        registry.register(Box::new(simulated_trades.clone()))?;
        registry.register(Box::new(submitted_trades.clone()))?;
        registry.register(Box::new(settlement_outcomes.clone()))?;
        registry.register(Box::new(last_preview_success_count.clone()))?;

        Ok(Self {
            registry,
            iterations,
            tick_errors,
            proposals_blocked,
            zero_viable_previews,
            simulated_trades,
            submitted_trades,
            settlement_outcomes,
            last_preview_success_count,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
