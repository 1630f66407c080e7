//! Swarm Trading Bot - Entry Point
//!
//! Initializes configuration, logging and the Swarm Vault client, then
//! runs the decision loop until SIGINT/SIGTERM.
//!
//! Wiring sequence:
//! 1. Load `.env`, then the config file (first CLI argument, default `config.toml`)
//! 2. Init tracing (JSON structured logging)
//! 3. Build the configured strategy
//! 4. Create the Swarm Vault client (HTTP + auth + pacing + retry)
//! 5. Verify the API key and that we manage the swarm
//! 6. Spawn the signal listener and the health/metrics server
//! 7. Run the orchestrator loop
//! 8. On shutdown: final report, readiness → 503, stop the server

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{error, info, warn};

use swarm_trading_bot::adapters::api::{SwarmVaultClient, SwarmVaultClientConfig};
use swarm_trading_bot::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use swarm_trading_bot::config::{self, AppConfig};
use swarm_trading_bot::domain::Strategy;
use swarm_trading_bot::ports::SwarmDirectory;
use swarm_trading_bot::usecases::{
    Orchestrator, RiskGate, TradingContext, TransactionMonitor, shutdown,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load .env and configuration ──────────────────────
    dotenvy::dotenv().ok();
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = config::load_config(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path}"))?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bot.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        swarm_id = %config.api.swarm_id,
        simulation = config.is_simulation(),
        "Starting swarm trading bot"
    );
    info!(
        config = %config_path,
        strategy = %config.strategy.active,
        check_interval = config.bot.check_interval_seconds,
        max_retries = config.api.max_retries,
        "Configuration loaded successfully"
    );

    // ── 3. Build the strategy ───────────────────────────────
    let strategy = config
        .strategy
        .build()
        .with_context(|| format!("Invalid [strategy] configuration ({})", config.strategy.active))?;
    info!(
        strategy = strategy.name(),
        description = %strategy.describe(),
        "Strategy initialized"
    );

    // ── 4. Create the Swarm Vault client ────────────────────
    let client = Arc::new(build_client(&config)?);

    // ── 5. Verify identity and manager rights ───────────────
    verify_manager(client.as_ref(), &config.api.swarm_id).await?;

    if config.is_simulation() {
        warn!("============================================================");
        warn!("DRY RUN MODE - trades are previewed but never executed");
        warn!("Set DRY_RUN=false and TRADING_ENABLED=true to trade live");
        warn!("============================================================");
    }

    // ── 6. Shutdown signal, metrics, health server ──────────
    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    let signal_handle = tokio::spawn(shutdown::listen_for_signals(shutdown_tx));

    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);
    let health = HealthState::new();

    let health_handle = if config.metrics.enabled {
        let server = HealthServer::new(health.clone(), Arc::clone(&metrics), config.metrics.port);
        let rx = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(rx).await {
                error!(error = %e, "Health server failed");
            }
        }))
    } else {
        None
    };

    // ── 7. Run the decision loop ────────────────────────────
    let ctx = TradingContext::new(
        config.api.swarm_id.clone(),
        config.is_simulation(),
        Arc::clone(&metrics),
    );
    let mut orchestrator = Orchestrator::new(
        Arc::clone(&client),
        Arc::clone(&client),
        strategy,
        RiskGate::new(&config.risk),
        TransactionMonitor::from_config(Arc::clone(&client), &config.monitor),
        ctx,
        Duration::from_secs(config.bot.check_interval_seconds),
        shutdown_rx,
    );

    orchestrator.run().await;

    // ── 8. Graceful shutdown ────────────────────────────────
    health.mark_stopping();
    if let Some(handle) = health_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    signal_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

fn build_client(config: &AppConfig) -> Result<SwarmVaultClient> {
    let Some(auth) = config.api.auth.clone() else {
        bail!("API key missing after validation");
    };

    let client_config = SwarmVaultClientConfig {
        base_url: config.api.base_url.clone(),
        timeout: Duration::from_secs(config.api.timeout_seconds),
        max_retries: config.api.max_retries,
        retry_base_delay: Duration::from_millis(config.api.retry_base_delay_ms),
        requests_per_second: config.api.requests_per_second,
        ..SwarmVaultClientConfig::default()
    };

    info!(base_url = %client_config.base_url, api_key = %auth.masked(), "Creating Swarm Vault client");
    SwarmVaultClient::new(auth, client_config).context("Failed to create Swarm Vault client")
}

/// Confirm the key works and the caller manages `swarm_id`.
async fn verify_manager<D: SwarmDirectory>(directory: &D, swarm_id: &str) -> Result<()> {
    let identity = directory
        .whoami()
        .await
        .context("Failed to verify API key")?;
    info!(
        wallet = identity.wallet_address.as_deref().unwrap_or("unknown"),
        "Authenticated"
    );

    let swarm = directory
        .get_swarm(swarm_id)
        .await
        .with_context(|| format!("Failed to fetch swarm {swarm_id}"))?;
    info!(
        swarm = %swarm.name,
        members = swarm.member_count,
        managers = swarm.managers.len(),
        "Swarm loaded"
    );

    if !swarm.is_manager {
        match directory.list_swarms().await {
            Ok(swarms) => {
                let managed: Vec<String> = swarms
                    .into_iter()
                    .filter(|s| s.is_manager)
                    .map(|s| format!("{} ({})", s.name, s.id))
                    .collect();
                error!(managed = ?managed, "Swarms this key can manage");
            }
            Err(e) => warn!(error = %e, "Could not list swarms"),
        }
        bail!("You are not a manager of swarm {swarm_id}");
    }

    match directory.list_swarm_transactions(swarm_id).await {
        Ok(history) => info!(
            transactions = history.len(),
            last_status = ?history.first().map(|tx| tx.status),
            "Recent swarm transactions"
        ),
        Err(e) => warn!(error = %e, "Could not load transaction history"),
    }

    Ok(())
}
