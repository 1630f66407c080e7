//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides via `.env` files.
//! Token addresses may be given as symbols from the Base mainnet
//! table or as raw `0x` addresses; both resolve at strategy build time.

pub mod loader;

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::adapters::api::ApiAuth;
use crate::adapters::api::client::DEFAULT_BASE_URL;
use crate::domain::error::ConfigError;
use crate::domain::strategy::{
  DcaSettings, DcaStrategy, PriceRule, PriceThresholdSettings, PriceThresholdStrategy,
  RebalanceSettings, RebalanceStrategy, StrategyEngine,
};
use crate::domain::tokens::resolve_token;

pub use loader::load_config;

/// Top-level bot configuration.
///
/// Loaded from `config.toml` at startup, then overridden from the
/// environment. All fields are validated before the bot begins operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Bot identity and run mode.
  #[serde(default)]
  pub bot: BotConfig,
  /// Swarm Vault API endpoint and client tuning.
  #[serde(default)]
  pub api: ApiConfig,
  /// Transaction monitoring.
  #[serde(default)]
  pub monitor: MonitorConfig,
  /// Metrics and monitoring.
  #[serde(default)]
  pub metrics: MetricsConfig,
  /// Risk management parameters.
  #[serde(default)]
  pub risk: RiskConfig,
  /// Active strategy and its parameters.
  #[serde(default)]
  pub strategy: StrategyConfig,
}

impl AppConfig {
  /// Simulation unless both `trading_enabled` and `!dry_run` allow live trading.
  pub fn is_simulation(&self) -> bool {
    self.bot.dry_run || !self.bot.trading_enabled
  }
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable bot name.
  #[serde(default = "default_bot_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Preview trades but never execute.
  #[serde(default = "default_true")]
  pub dry_run: bool,
  /// Master switch for live trading.
  #[serde(default)]
  pub trading_enabled: bool,
  /// Seconds between decision ticks.
  #[serde(default = "default_check_interval")]
  pub check_interval_seconds: u64,
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      name: default_bot_name(),
      log_level: default_log_level(),
      dry_run: true,
      trading_enabled: false,
      check_interval_seconds: default_check_interval(),
    }
  }
}

/// API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Swarm Vault REST API base URL.
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Swarm this bot manages.
  #[serde(default)]
  pub swarm_id: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Retries on 429, 5xx and transport errors.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// First retry delay; doubles per attempt.
  #[serde(default = "default_retry_base_delay")]
  pub retry_base_delay_ms: u64,
  /// Client-side request pacing.
  #[serde(default = "default_requests_per_second")]
  pub requests_per_second: u32,
  /// Bearer credential. Environment only, never read from the file.
  #[serde(skip)]
  pub auth: Option<ApiAuth>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      swarm_id: String::new(),
      timeout_seconds: default_timeout(),
      max_retries: default_max_retries(),
      retry_base_delay_ms: default_retry_base_delay(),
      requests_per_second: default_requests_per_second(),
      auth: None,
    }
  }
}

/// Transaction monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
  /// Give up waiting for a terminal status after this many seconds.
  #[serde(default = "default_monitor_timeout")]
  pub timeout_seconds: u64,
  /// Seconds between status polls.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_seconds: u64,
}

impl Default for MonitorConfig {
  fn default() -> Self {
    Self {
      timeout_seconds: default_monitor_timeout(),
      poll_interval_seconds: default_poll_interval(),
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable the health and metrics server.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Port for /live, /ready and /metrics.
  #[serde(default = "default_metrics_port")]
  pub port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      port: default_metrics_port(),
    }
  }
}

/// Risk management configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
  /// Minimum seconds between two submitted trades.
  #[serde(default = "default_min_trade_interval")]
  pub min_trade_interval: u64,
  /// Largest sell percentage a single proposal may carry.
  #[serde(default = "default_max_trade_percentage")]
  pub max_trade_percentage: f64,
}

impl Default for RiskConfig {
  fn default() -> Self {
    Self {
      min_trade_interval: default_min_trade_interval(),
      max_trade_percentage: default_max_trade_percentage(),
    }
  }
}

// ── Strategy ───────────────────────────────────────────────

/// Strategy selection. Only the block named by `active` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
  /// One of `dca`, `rebalance`, `price_based`.
  #[serde(default = "default_strategy")]
  pub active: String,
  pub dca: Option<DcaConfig>,
  pub rebalance: Option<RebalanceConfig>,
  pub price_based: Option<PriceBasedConfig>,
}

impl Default for StrategyConfig {
  fn default() -> Self {
    Self {
      active: default_strategy(),
      dca: None,
      rebalance: None,
      price_based: None,
    }
  }
}

/// `[strategy.dca]`
#[derive(Debug, Clone, Deserialize)]
pub struct DcaConfig {
  pub sell_token: Option<String>,
  pub buy_token: Option<String>,
  pub sell_percentage: Option<f64>,
  pub interval_seconds: Option<u64>,
  #[serde(default = "default_slippage")]
  pub slippage_percentage: f64,
}

/// `[strategy.rebalance]`
#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceConfig {
  /// Token (symbol or address) → target percent.
  pub target_allocation: Option<BTreeMap<String, f64>>,
  #[serde(default = "default_drift_threshold")]
  pub drift_threshold: f64,
  #[serde(default = "default_slippage")]
  pub slippage_percentage: f64,
}

/// `[strategy.price_based]`
#[derive(Debug, Clone, Deserialize)]
pub struct PriceBasedConfig {
  pub sell_token: Option<String>,
  pub buy_token: Option<String>,
  pub rules: Option<Vec<PriceRule>>,
  #[serde(default = "default_slippage")]
  pub slippage_percentage: f64,
}

fn required<T>(value: Option<T>, strategy: &'static str, key: &'static str) -> Result<T, ConfigError> {
  value.ok_or(ConfigError::MissingKey { strategy, key })
}

impl StrategyConfig {
  /// Build the active strategy, resolving token symbols.
  ///
  /// # Errors
  /// Unknown strategy names, missing blocks or keys, unknown token
  /// symbols and out-of-range values.
  pub fn build(&self) -> Result<StrategyEngine, ConfigError> {
    match self.active.as_str() {
      "dca" => {
        let cfg = required(self.dca.as_ref(), "dca", "[strategy.dca]")?;
        let interval_secs = required(cfg.interval_seconds, "dca", "interval_seconds")?;
        if interval_secs == 0 {
          return Err(ConfigError::OutOfRange {
            field: "interval_seconds",
            range: "[1, inf)",
            value: 0.0,
          });
        }
        let settings = DcaSettings {
          sell_token: resolve_token(required(cfg.sell_token.as_deref(), "dca", "sell_token")?)?,
          buy_token: resolve_token(required(cfg.buy_token.as_deref(), "dca", "buy_token")?)?,
          sell_percentage: required(cfg.sell_percentage, "dca", "sell_percentage")?,
          interval_secs,
          slippage_percentage: cfg.slippage_percentage,
        };
        Ok(DcaStrategy::new(settings)?.into())
      }
      "rebalance" => {
        let cfg = required(self.rebalance.as_ref(), "rebalance", "[strategy.rebalance]")?;
        let allocation = required(
          cfg.target_allocation.as_ref(),
          "rebalance",
          "target_allocation",
        )?;
        let target_allocation = allocation
          .iter()
          .map(|(token, pct)| Ok((resolve_token(token)?, *pct)))
          .collect::<Result<Vec<_>, ConfigError>>()?;
        let settings = RebalanceSettings {
          target_allocation,
          drift_threshold: cfg.drift_threshold,
          slippage_percentage: cfg.slippage_percentage,
        };
        Ok(RebalanceStrategy::new(settings)?.into())
      }
      "price_based" => {
        let cfg = required(self.price_based.as_ref(), "price_based", "[strategy.price_based]")?;
        let settings = PriceThresholdSettings {
          sell_token: resolve_token(required(cfg.sell_token.as_deref(), "price_based", "sell_token")?)?,
          buy_token: resolve_token(required(cfg.buy_token.as_deref(), "price_based", "buy_token")?)?,
          rules: required(cfg.rules.clone(), "price_based", "rules")?,
          slippage_percentage: cfg.slippage_percentage,
        };
        Ok(PriceThresholdStrategy::new(settings)?.into())
      }
      other => Err(ConfigError::UnknownStrategy(other.to_string())),
    }
  }
}

// Default value functions for serde

fn default_bot_name() -> String {
  "swarm-trading-bot".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_check_interval() -> u64 {
  300
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
  30
}

fn default_max_retries() -> u32 {
  3
}

fn default_retry_base_delay() -> u64 {
  200
}

fn default_requests_per_second() -> u32 {
  5
}

fn default_monitor_timeout() -> u64 {
  300
}

fn default_poll_interval() -> u64 {
  5
}

fn default_metrics_port() -> u16 {
  9090
}

fn default_min_trade_interval() -> u64 {
  300
}

fn default_max_trade_percentage() -> f64 {
  100.0
}

fn default_strategy() -> String {
  "dca".to_string()
}

fn default_slippage() -> f64 {
  1.0
}

fn default_drift_threshold() -> f64 {
  5.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::strategy::Strategy;

  fn parse(toml_str: &str) -> StrategyConfig {
    toml::from_str::<AppConfig>(toml_str).unwrap().strategy
  }

  #[test]
  fn test_defaults_are_safe() {
    let config: AppConfig = toml::from_str("").unwrap();
    assert!(config.bot.dry_run);
    assert!(!config.bot.trading_enabled);
    assert!(config.is_simulation());
    assert_eq!(config.api.base_url, "https://api.swarmvault.xyz");
    assert_eq!(config.monitor.timeout_seconds, 300);
    assert_eq!(config.monitor.poll_interval_seconds, 5);
    assert_eq!(config.risk.min_trade_interval, 300);
    assert_eq!(config.strategy.active, "dca");
  }

  #[test]
  fn test_live_requires_both_switches() {
    let mut config = AppConfig::default();
    config.bot.trading_enabled = true;
    assert!(config.is_simulation());
    config.bot.dry_run = false;
    assert!(!config.is_simulation());
    config.bot.trading_enabled = false;
    assert!(config.is_simulation());
  }

  #[test]
  fn test_build_dca_with_symbols() {
    let strategy = parse(
      r#"
      [strategy.dca]
      sell_token = "USDC"
      buy_token = "WETH"
      sell_percentage = 10.0
      interval_seconds = 3600
      "#,
    )
    .build()
    .unwrap();

    assert_eq!(strategy.name(), "dca");
    let StrategyEngine::Dca(dca) = strategy else {
      panic!("expected dca");
    };
    assert_eq!(dca.settings().buy_token, "0x4200000000000000000000000000000000000006");
    assert_eq!(dca.settings().slippage_percentage, 1.0);
  }

  #[test]
  fn test_missing_key_is_named() {
    let err = parse(
      r#"
      [strategy.dca]
      sell_token = "USDC"
      buy_token = "WETH"
      interval_seconds = 3600
      "#,
    )
    .build()
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "strategy 'dca' requires 'sell_percentage' in configuration"
    );
  }

  #[test]
  fn test_missing_block() {
    let err = parse("[strategy]\nactive = \"rebalance\"").build().unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey { strategy: "rebalance", .. }));
  }

  #[test]
  fn test_unknown_strategy() {
    let err = parse("[strategy]\nactive = \"momentum\"").build().unwrap_err();
    assert_eq!(err, ConfigError::UnknownStrategy("momentum".to_string()));
  }

  #[test]
  fn test_unknown_token_symbol() {
    let err = parse(
      r#"
      [strategy.dca]
      sell_token = "DOGE"
      buy_token = "WETH"
      sell_percentage = 10.0
      interval_seconds = 60
      "#,
    )
    .build()
    .unwrap_err();
    assert!(matches!(err, ConfigError::Token(_)));
  }

  #[test]
  fn test_zero_interval_rejected() {
    let err = parse(
      r#"
      [strategy.dca]
      sell_token = "USDC"
      buy_token = "WETH"
      sell_percentage = 10.0
      interval_seconds = 0
      "#,
    )
    .build()
    .unwrap_err();
    assert!(matches!(err, ConfigError::OutOfRange { field: "interval_seconds", .. }));
  }

  #[test]
  fn test_build_rebalance_rejects_bad_sum() {
    let err = parse(
      r#"
      [strategy]
      active = "rebalance"

      [strategy.rebalance.target_allocation]
      ETH = 50.0
      USDC = 40.0
      "#,
    )
    .build()
    .unwrap_err();
    assert_eq!(err, ConfigError::AllocationSum(90.0));
  }

  #[test]
  fn test_build_price_based() {
    let strategy = parse(
      r#"
      [strategy]
      active = "price_based"

      [strategy.price_based]
      sell_token = "USDC"
      buy_token = "ETH"

      [[strategy.price_based.rules]]
      condition = "price_drop"
      threshold_percentage = 10.0
      action = "buy"
      sell_percentage = 20.0

      [[strategy.price_based.rules]]
      condition = "price_increase"
      threshold_percentage = 15.0
      action = "sell"
      "#,
    )
    .build()
    .unwrap();

    let StrategyEngine::PriceThreshold(s) = strategy else {
      panic!("expected price_based");
    };
    assert_eq!(s.settings().rules.len(), 2);
    assert_eq!(s.settings().rules[1].sell_percentage, 10.0);
  }

  #[test]
  fn test_example_config_builds_every_strategy() {
    let mut config: AppConfig = toml::from_str(include_str!("../../config.example.toml")).unwrap();
    assert!(config.is_simulation());

    for active in ["dca", "rebalance", "price_based"] {
      config.strategy.active = active.to_string();
      let strategy = config.strategy.build().unwrap();
      assert_eq!(strategy.name(), active);
    }
  }
}
