//! Configuration Loader - File Loading, Env Overrides and Validation
//!
//! Handles loading `config.toml`, applying environment overrides,
//! validating all parameters, and providing clear error messages for
//! misconfiguration.
//!
//! Environment variables (a `.env` file is loaded first if present):
//! - `SWARM_VAULT_API_KEY`: bearer credential, required
//! - `SWARM_VAULT_BASE_URL`: overrides `api.base_url`
//! - `SWARM_ID`: overrides `api.swarm_id`
//! - `TRADING_ENABLED`, `DRY_RUN`: override the `[bot]` switches
//! - `CHECK_INTERVAL_SECONDS`: overrides `bot.check_interval_seconds`
//! - `LOG_LEVEL`: overrides `bot.log_level`

use std::path::Path;

use anyhow::{Context, Result, bail, ensure};

use super::AppConfig;
use crate::adapters::api::ApiAuth;
use crate::adapters::api::auth::API_KEY_ENV;

/// Largest accepted `api.max_retries`.
pub const MAX_API_RETRIES: u32 = 10;

/// Load configuration from a TOML file, apply the process environment,
/// and validate.
///
/// A missing file is not an error: every setting can come from the
/// environment alone. Runs before logging is initialised, so nothing is
/// logged here.
///
/// # Errors
/// Returns detailed error if:
/// - The file exists but can't be read or parsed
/// - An environment override can't be parsed
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let mut config: AppConfig = if path.exists() {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
      .with_context(|| format!("Failed to parse {}", path.display()))?
  } else {
    AppConfig::default()
  };

  apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
  validate_config(&config)?;

  Ok(config)
}

/// Overlay environment values on a parsed config.
///
/// `lookup` stands in for `std::env::var`.
///
/// # Errors
/// Fails when a boolean or numeric variable can't be parsed, or the API
/// key is malformed.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
  F: Fn(&str) -> Option<String>,
{
  let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

  if let Some(key) = get(API_KEY_ENV) {
    config.api.auth = Some(ApiAuth::new(key)?);
  }
  if let Some(url) = get("SWARM_VAULT_BASE_URL") {
    config.api.base_url = url;
  }
  if let Some(swarm_id) = get("SWARM_ID") {
    config.api.swarm_id = swarm_id;
  }
  if let Some(value) = get("TRADING_ENABLED") {
    config.bot.trading_enabled = parse_bool("TRADING_ENABLED", &value)?;
  }
  if let Some(value) = get("DRY_RUN") {
    config.bot.dry_run = parse_bool("DRY_RUN", &value)?;
  }
  if let Some(value) = get("CHECK_INTERVAL_SECONDS") {
    config.bot.check_interval_seconds = value
      .parse()
      .with_context(|| format!("CHECK_INTERVAL_SECONDS must be an integer, got '{value}'"))?;
  }
  if let Some(level) = get("LOG_LEVEL") {
    config.bot.log_level = level.to_lowercase();
  }

  Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
  match value.to_ascii_lowercase().as_str() {
    "true" | "1" | "yes" | "on" => Ok(true),
    "false" | "0" | "no" | "off" => Ok(false),
    _ => bail!("{key} must be true or false, got '{value}'"),
  }
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Credentials and swarm identity
/// - Positive intervals and timeouts
/// - Sensible risk limits
///
/// Strategy parameters are checked when the strategy is built.
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Identity validation
  ensure!(
    config.api.auth.is_some(),
    "{API_KEY_ENV} must be set (in the environment or .env)"
  );
  ensure!(
    !config.api.swarm_id.trim().is_empty(),
    "SWARM_ID must be set (environment or api.swarm_id)"
  );
  ensure!(
    !config.api.base_url.is_empty(),
    "Swarm Vault API URL must not be empty"
  );

  // Loop timing validation
  ensure!(
    config.bot.check_interval_seconds > 0,
    "check_interval_seconds must be positive"
  );
  ensure!(
    config.api.timeout_seconds > 0,
    "api.timeout_seconds must be positive"
  );
  ensure!(
    config.api.max_retries <= MAX_API_RETRIES,
    "api.max_retries must be at most {MAX_API_RETRIES}, got {}",
    config.api.max_retries
  );
  ensure!(
    config.monitor.poll_interval_seconds > 0,
    "monitor.poll_interval_seconds must be positive"
  );
  ensure!(
    config.monitor.timeout_seconds > 0,
    "monitor.timeout_seconds must be positive"
  );

  // Risk validation
  ensure!(
    config.risk.max_trade_percentage > 0.0 && config.risk.max_trade_percentage <= 100.0,
    "max_trade_percentage must be in (0, 100], got {}",
    config.risk.max_trade_percentage
  );

  Ok(())
}
