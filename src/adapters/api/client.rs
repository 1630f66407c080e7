//! Swarm Vault HTTP Client - Paced REST API Client
//!
//! Wraps reqwest with bearer auth, client-side pacing, retries with
//! exponential backoff and envelope decoding for all Swarm Vault REST
//! API interactions.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::auth::ApiAuth;
use super::types::ApiResponse;

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.swarmvault.xyz";

/// Upper bound on a single backoff delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Backoff before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at [`MAX_RETRY_DELAY`].
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
  let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
  base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

/// Configuration for the Swarm Vault HTTP client.
#[derive(Debug, Clone)]
pub struct SwarmVaultClientConfig {
  /// Base URL for the API (no trailing slash).
  pub base_url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// Maximum concurrent requests.
  pub max_concurrent: usize,
  /// Maximum retries on transient errors.
  pub max_retries: u32,
  /// Base delay between retries (exponential backoff).
  pub retry_base_delay: Duration,
  /// Client-side request budget.
  pub requests_per_second: u32,
}

impl Default for SwarmVaultClientConfig {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.to_string(),
      timeout: Duration::from_secs(30),
      max_concurrent: 4,
      max_retries: 3,
      retry_base_delay: Duration::from_millis(200),
      requests_per_second: 5,
    }
  }
}

/// Paced HTTP client for the Swarm Vault API.
///
/// Implements every platform port (see `super::swarm`).
pub struct SwarmVaultClient {
  /// Underlying HTTP client.
  http: Client,
  /// Bearer credential.
  auth: ApiAuth,
  /// Client configuration.
  config: SwarmVaultClientConfig,
  /// Concurrency limiter.
  semaphore: Arc<Semaphore>,
  /// Request pacing.
  limiter: DefaultDirectRateLimiter,
}

impl SwarmVaultClient {
  /// Create a new client.
  ///
  /// # Errors
  /// Fails if the TLS backend cannot be initialised.
  pub fn new(auth: ApiAuth, mut config: SwarmVaultClientConfig) -> Result<Self> {
    config.base_url = config.base_url.trim_end_matches('/').to_string();

    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(4)
      .build()
      .context("Failed to build HTTP client")?;

    let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_second(rps));
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));

    Ok(Self {
      http,
      auth,
      config,
      semaphore,
      limiter,
    })
  }

  /// Base URL requests are sent to.
  pub fn base_url(&self) -> &str {
    &self.config.base_url
  }

  /// GET `path` and decode the envelope payload.
  pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.get(&url);
    let response = self
      .execute_with_retry(request, "GET", path, self.config.max_retries)
      .await?;
    Self::decode(response, path).await
  }

  /// POST a JSON body to `path` and decode the envelope payload.
  ///
  /// Retried on transient errors; use only for requests without side
  /// effects.
  pub async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T> {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.post(&url).json(body);
    let response = self
      .execute_with_retry(request, "POST", path, self.config.max_retries)
      .await?;
    Self::decode(response, path).await
  }

  /// POST a JSON body exactly once, never retried.
  ///
  /// For submissions: a 5xx or timeout may arrive after the platform
  /// already accepted the request.
  pub async fn post_json_once<B: Serialize + Sync, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T> {
    let url = format!("{}{}", self.config.base_url, path);
    let request = self.http.post(&url).json(body);
    let response = self.execute_with_retry(request, "POST", path, 0).await?;
    Self::decode(response, path).await
  }

  async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T> {
    let envelope: ApiResponse<T> = response
      .json()
      .await
      .with_context(|| format!("Failed to decode response from {path}"))?;
    envelope.into_data().with_context(|| format!("Request to {path} failed"))
  }

  /// Execute request with authentication, pacing, and up to `max_retries` retries.
  async fn execute_with_retry(
    &self,
    request: RequestBuilder,
    method: &str,
    path: &str,
    max_retries: u32,
  ) -> Result<Response> {
    let _permit = self
      .semaphore
      .acquire()
      .await
      .context("Semaphore closed")?;

    let mut last_error = None;

    for attempt in 0..=max_retries {
      if attempt > 0 {
        let delay = backoff_delay(self.config.retry_base_delay, attempt);
        debug!(attempt, delay_ms = delay.as_millis(), "Retrying request");
        sleep(delay).await;
      }

      self.limiter.until_ready().await;

      let req = request
        .try_clone()
        .context("Failed to clone request")?
        .header(header::AUTHORIZATION, self.auth.bearer());

      debug!(method, path, attempt, "Sending request");

      match req.send().await {
        Ok(response) => match response.status() {
          status if status.is_success() => return Ok(response),
          StatusCode::TOO_MANY_REQUESTS => {
            warn!(path, "Rate limited by Swarm Vault API");
            last_error = Some(anyhow!("Rate limited"));
          }
          status if status.is_server_error() => {
            warn!(status = %status, path, "Server error");
            last_error = Some(anyhow!("Server error: {status}"));
          }
          status => {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, path, body = %body, "HTTP error");
            return Err(anyhow!("API error {status} on {method} {path}: {body}"));
          }
        },
        Err(e) => {
          warn!(error = %e, attempt, path, "Request failed");
          last_error = Some(e.into());
        }
      }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("Max retries exceeded")))
      .with_context(|| format!("{method} {path} failed after {} attempt(s)", max_retries + 1))
  }
}

impl std::fmt::Debug for SwarmVaultClient {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SwarmVaultClient")
      .field("base_url", &self.config.base_url)
      .field("auth", &self.auth)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  use super::*;
  use crate::domain::trade::TradeProposal;
  use crate::ports::holdings::HoldingsSource;
  use crate::ports::settlement::SwapSettlement;

  /// Local HTTP server answering each connection with the next canned
  /// `(status line, body)`; the last one repeats. Returns the base URL and
  /// a request counter.
  async fn canned_server(responses: Vec<(&'static str, &'static str)>) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
      loop {
        let Ok((mut socket, _)) = listener.accept().await else {
          break;
        };
        let mut buf = [0u8; 8192];
        let _ = socket.read(&mut buf).await;
        let i = counter.fetch_add(1, Ordering::SeqCst);
        let (status, body) = responses[i.min(responses.len() - 1)];
        let reply = format!(
          "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
          body.len()
        );
        let _ = socket.write_all(reply.as_bytes()).await;
        let _ = socket.shutdown().await;
      }
    });

    (format!("http://{addr}"), hits)
  }

  fn client(base_url: String, max_retries: u32) -> SwarmVaultClient {
    SwarmVaultClient::new(
      ApiAuth::new("svk_test").unwrap(),
      SwarmVaultClientConfig {
        base_url,
        max_retries,
        retry_base_delay: Duration::from_millis(1),
        requests_per_second: 1000,
        ..SwarmVaultClientConfig::default()
      },
    )
    .unwrap()
  }

  fn proposal() -> TradeProposal {
    TradeProposal {
      sell_token: "0xa".to_string(),
      buy_token: "0xb".to_string(),
      sell_percentage: 10.0,
      slippage_percentage: 1.0,
    }
  }

  const BAD_GATEWAY: (&str, &str) = ("502 Bad Gateway", "");

  #[tokio::test]
  async fn test_execute_swap_is_never_resent() {
    let (url, hits) = canned_server(vec![
      BAD_GATEWAY,
      ("200 OK", r#"{"success":true,"data":{"transactionId":"tx-2"}}"#),
    ])
    .await;
    let client = client(url, 3);

    let result = client.execute_swap("swarm-1", &proposal()).await;

    assert!(result.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_reads_are_retried_on_server_error() {
    let (url, hits) = canned_server(vec![
      BAD_GATEWAY,
      ("200 OK", r#"{"success":true,"data":{"ethBalance":"5","tokens":[],"memberCount":3}}"#),
    ])
    .await;
    let client = client(url, 3);

    let snapshot = client.get_holdings("swarm-1").await.unwrap();

    assert_eq!(snapshot.member_count, 3);
    assert_eq!(hits.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_retries_exhausted_returns_error() {
    let (url, hits) = canned_server(vec![("503 Service Unavailable", "")]).await;
    let client = client(url, 2);

    assert!(client.get_holdings("swarm-1").await.is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn test_backoff_doubles_then_caps() {
    let base = Duration::from_millis(200);
    assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
    assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
    assert_eq!(backoff_delay(base, 40), MAX_RETRY_DELAY);
    assert_eq!(backoff_delay(Duration::from_secs(u64::MAX), 64), MAX_RETRY_DELAY);
  }

  #[test]
  fn test_trailing_slash_trimmed() {
    let auth = ApiAuth::new("svk_test").unwrap();
    let client = SwarmVaultClient::new(
      auth,
      SwarmVaultClientConfig {
        base_url: "https://api.example.test/".to_string(),
        ..SwarmVaultClientConfig::default()
      },
    )
    .unwrap();
    assert_eq!(client.base_url(), "https://api.example.test");
  }

  #[test]
  fn test_zero_rps_is_clamped() {
    let auth = ApiAuth::new("svk_test").unwrap();
    let config = SwarmVaultClientConfig {
      requests_per_second: 0,
      ..SwarmVaultClientConfig::default()
    };
    assert!(SwarmVaultClient::new(auth, config).is_ok());
  }
}
