//! Swarm Vault API Request/Response Types
//!
//! Wire shapes of the REST API (camelCase JSON) and their conversion
//! into domain types. Every response is wrapped in the same envelope:
//! `{ success, data, error, errorCode }`.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::holdings::{HoldingsSnapshot, TokenHolding};
use crate::domain::trade::{
  MemberPreview, PlatformFee, PreviewResult, TradeProposal, Transaction, TransactionId,
  TransactionStatus, TransactionTarget,
};
use crate::ports::directory::{Identity, SwarmInfo};

/// Response envelope shared by all endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
  /// Whether the call succeeded.
  #[serde(default)]
  pub success: bool,
  /// Payload on success.
  pub data: Option<T>,
  /// Human-readable error.
  pub error: Option<String>,
  /// Machine-readable error code.
  pub error_code: Option<String>,
}

impl<T> ApiResponse<T> {
  /// Unwrap the payload or turn the envelope error into an `anyhow` error.
  ///
  /// # Errors
  /// Fails when `success` is false or `data` is missing.
  pub fn into_data(self) -> Result<T> {
    if !self.success {
      let message = self.error.unwrap_or_else(|| "unknown error".to_string());
      return Err(match self.error_code {
        Some(code) => anyhow!("API error [{code}]: {message}"),
        None => anyhow!("API error: {message}"),
      });
    }
    self.data.ok_or_else(|| anyhow!("API response missing data"))
  }
}

// ── Identity / swarms ──────────────────────────────────────

/// `GET /api/auth/me` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
  pub id: Option<String>,
  pub wallet_address: Option<String>,
}

impl From<MeResponse> for Identity {
  fn from(me: MeResponse) -> Self {
    Self {
      id: me.id,
      wallet_address: me.wallet_address,
    }
  }
}

/// Swarm as returned by `/api/swarms` and `/api/swarms/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwarmResponse {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub member_count: u32,
  #[serde(default)]
  pub is_manager: bool,
  /// Either plain addresses or manager objects with a `walletAddress`.
  #[serde(default)]
  pub managers: Vec<serde_json::Value>,
}

fn manager_label(value: &serde_json::Value) -> Option<String> {
  match value {
    serde_json::Value::String(s) => Some(s.clone()),
    serde_json::Value::Object(map) => map
      .get("walletAddress")
      .or_else(|| map.get("id"))
      .and_then(serde_json::Value::as_str)
      .map(String::from),
    _ => None,
  }
}

impl From<SwarmResponse> for SwarmInfo {
  fn from(s: SwarmResponse) -> Self {
    Self {
      managers: s.managers.iter().filter_map(manager_label).collect(),
      id: s.id,
      name: s.name,
      description: s.description.unwrap_or_default(),
      member_count: s.member_count,
      is_manager: s.is_manager,
    }
  }
}

// ── Holdings ───────────────────────────────────────────────

/// Token entry in the holdings payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
  pub address: String,
  pub symbol: String,
  pub name: String,
  pub decimals: u8,
  #[serde(default = "zero")]
  pub balance: String,
  pub total_balance: Option<String>,
  pub holder_count: Option<u32>,
  pub logo_url: Option<String>,
}

/// `GET /api/swarms/{id}/holdings` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsResponse {
  #[serde(default = "zero")]
  pub eth_balance: String,
  #[serde(default)]
  pub tokens: Vec<TokenResponse>,
  #[serde(default)]
  pub member_count: u32,
}

fn zero() -> String {
  "0".to_string()
}

impl HoldingsResponse {
  /// Convert into a domain snapshot stamped with the capture time.
  pub fn into_snapshot(self, captured_at: DateTime<Utc>) -> HoldingsSnapshot {
    HoldingsSnapshot {
      native_balance: self.eth_balance,
      tokens: self
        .tokens
        .into_iter()
        .map(|t| TokenHolding {
          address: t.address,
          symbol: t.symbol,
          name: t.name,
          decimals: t.decimals,
          balance: t.balance,
          total_balance: t.total_balance,
          holder_count: t.holder_count,
        })
        .collect(),
      member_count: self.member_count,
      captured_at,
    }
  }
}

// ── Swaps ──────────────────────────────────────────────────

/// Body of `swap/preview` and `swap/execute`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
  pub sell_token: String,
  pub buy_token: String,
  pub sell_percentage: f64,
  pub slippage_percentage: f64,
}

impl From<&TradeProposal> for SwapRequest {
  fn from(p: &TradeProposal) -> Self {
    Self {
      sell_token: p.sell_token.clone(),
      buy_token: p.buy_token.clone(),
      sell_percentage: p.sell_percentage,
      slippage_percentage: p.slippage_percentage,
    }
  }
}

/// Per-member preview line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewMemberResponse {
  #[serde(default)]
  pub membership_id: String,
  #[serde(default)]
  pub user_id: String,
  #[serde(default)]
  pub user_wallet_address: String,
  #[serde(default)]
  pub agent_wallet_address: String,
  #[serde(default = "zero")]
  pub sell_amount: String,
  #[serde(default = "zero")]
  pub buy_amount: String,
  #[serde(default = "zero")]
  pub fee_amount: String,
  #[serde(default)]
  pub estimated_price_impact: String,
  pub error: Option<String>,
}

/// Platform fee block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeResponse {
  pub percentage: Option<serde_json::Value>,
  pub recipient_address: Option<String>,
}

/// `POST /api/swarms/{id}/swap/preview` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
  pub sell_token: String,
  pub buy_token: String,
  pub sell_percentage: f64,
  pub slippage_percentage: f64,
  #[serde(default)]
  pub members: Vec<PreviewMemberResponse>,
  #[serde(default = "zero")]
  pub total_sell_amount: String,
  #[serde(default = "zero")]
  pub total_buy_amount: String,
  #[serde(default = "zero")]
  pub total_fee_amount: String,
  pub success_count: u32,
  #[serde(default)]
  pub error_count: u32,
  pub fee: Option<FeeResponse>,
}

impl From<PreviewResponse> for PreviewResult {
  fn from(p: PreviewResponse) -> Self {
    Self {
      sell_token: p.sell_token,
      buy_token: p.buy_token,
      sell_percentage: p.sell_percentage,
      slippage_percentage: p.slippage_percentage,
      members: p
        .members
        .into_iter()
        .map(|m| MemberPreview {
          membership_id: m.membership_id,
          user_id: m.user_id,
          user_wallet_address: m.user_wallet_address,
          agent_wallet_address: m.agent_wallet_address,
          sell_amount: m.sell_amount,
          buy_amount: m.buy_amount,
          fee_amount: m.fee_amount,
          estimated_price_impact: m.estimated_price_impact,
          error: m.error,
        })
        .collect(),
      total_sell_amount: p.total_sell_amount,
      total_buy_amount: p.total_buy_amount,
      total_fee_amount: p.total_fee_amount,
      success_count: p.success_count,
      error_count: p.error_count,
      fee: p.fee.map(|f| PlatformFee {
        percentage: f.percentage,
        recipient_address: f.recipient_address,
      }),
    }
  }
}

/// `POST /api/swarms/{id}/swap/execute` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
  pub transaction_id: TransactionId,
}

// ── Transactions ───────────────────────────────────────────

/// Per-member execution target.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResponse {
  pub id: Option<String>,
  pub membership_id: Option<String>,
  pub status: Option<String>,
  pub tx_hash: Option<String>,
  pub error: Option<String>,
}

/// `GET /api/transactions/{id}` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
  pub id: TransactionId,
  pub swarm_id: String,
  pub status: TransactionStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub target_count: Option<u32>,
  pub status_counts: Option<HashMap<String, u32>>,
  #[serde(default)]
  pub targets: Option<Vec<TargetResponse>>,
}

impl From<TransactionResponse> for Transaction {
  fn from(t: TransactionResponse) -> Self {
    Self {
      id: t.id,
      swarm_id: t.swarm_id,
      status: t.status,
      created_at: t.created_at,
      updated_at: t.updated_at,
      target_count: t.target_count,
      status_counts: t.status_counts,
      targets: t
        .targets
        .unwrap_or_default()
        .into_iter()
        .map(|r| TransactionTarget {
          id: r.id,
          membership_id: r.membership_id,
          status: r.status,
          tx_hash: r.tx_hash,
          error: r.error,
        })
        .collect(),
    }
  }
}
