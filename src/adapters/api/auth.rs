//! Swarm Vault Authentication - Bearer API Keys
//!
//! Every request carries `Authorization: Bearer svk_...`. The key comes
//! from the `SWARM_VAULT_API_KEY` environment variable (or `.env`), never
//! from config files, and is masked in logs.

use anyhow::{Result, ensure};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "SWARM_VAULT_API_KEY";

/// Prefix every Swarm Vault API key starts with.
pub const API_KEY_PREFIX: &str = "svk_";

/// API key handler.
#[derive(Clone)]
pub struct ApiAuth {
    /// Raw key, including the `svk_` prefix.
    api_key: String,
}

impl ApiAuth {
    /// Wrap a key after checking its shape.
    ///
    /// # Errors
    /// Fails when the key is empty or lacks the `svk_` prefix.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        ensure!(!api_key.is_empty(), "{API_KEY_ENV} is empty");
        ensure!(
            api_key.starts_with(API_KEY_PREFIX),
            "{API_KEY_ENV} must start with '{API_KEY_PREFIX}'"
        );
        Ok(Self { api_key })
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Key with everything after the prefix masked, for logs.
    pub fn masked(&self) -> String {
        let visible: String = self.api_key.chars().take(API_KEY_PREFIX.len() + 4).collect();
        format!("{visible}...")
    }
}

impl std::fmt::Debug for ApiAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiAuth").field("api_key", &self.masked()).finish()
    }
}
