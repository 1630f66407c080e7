//! Swarm Vault Port Adapters
//!
//! Implements `HoldingsSource`, `SwapSettlement` and `SwarmDirectory`
//! on top of the shared `SwarmVaultClient`, which supplies auth,
//! pacing and retries. Swap execution is sent once and never retried.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument};

use super::client::SwarmVaultClient;
use super::types::{
    ExecuteResponse, HoldingsResponse, MeResponse, PreviewResponse, SwapRequest, SwarmResponse,
    TransactionResponse,
};
use crate::domain::holdings::HoldingsSnapshot;
use crate::domain::trade::{PreviewResult, TradeProposal, Transaction, TransactionId};
use crate::ports::directory::{Identity, SwarmDirectory, SwarmInfo};
use crate::ports::holdings::HoldingsSource;
use crate::ports::settlement::SwapSettlement;

#[async_trait]
impl HoldingsSource for SwarmVaultClient {
    #[instrument(skip(self))]
    async fn get_holdings(&self, swarm_id: &str) -> Result<HoldingsSnapshot> {
        debug!("Fetching swarm holdings");
        let holdings: HoldingsResponse = self
            .get_json(&format!("/api/swarms/{swarm_id}/holdings"))
            .await?;
        Ok(holdings.into_snapshot(Utc::now()))
    }
}

#[async_trait]
impl SwapSettlement for SwarmVaultClient {
    #[instrument(skip(self, proposal), fields(proposal = %proposal))]
    async fn preview_swap(&self, swarm_id: &str, proposal: &TradeProposal) -> Result<PreviewResult> {
        debug!("Previewing swap");
        let preview: PreviewResponse = self
            .post_json(
                &format!("/api/swarms/{swarm_id}/swap/preview"),
                &SwapRequest::from(proposal),
            )
            .await?;
        Ok(preview.into())
    }

    #[instrument(skip(self, proposal), fields(proposal = %proposal))]
    async fn execute_swap(&self, swarm_id: &str, proposal: &TradeProposal) -> Result<TransactionId> {
        info!("Executing swap");
        let executed: ExecuteResponse = self
            .post_json_once(
                &format!("/api/swarms/{swarm_id}/swap/execute"),
                &SwapRequest::from(proposal),
            )
            .await?;
        info!(tx_id = %executed.transaction_id, "Swap initiated");
        Ok(executed.transaction_id)
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        debug!(tx_id = transaction_id, "Fetching transaction status");
        let tx: TransactionResponse = self
            .get_json(&format!("/api/transactions/{transaction_id}"))
            .await?;
        Ok(tx.into())
    }
}

#[async_trait]
impl SwarmDirectory for SwarmVaultClient {
    async fn whoami(&self) -> Result<Identity> {
        debug!("Verifying API key");
        let me: MeResponse = self.get_json("/api/auth/me").await?;
        Ok(me.into())
    }

    async fn get_swarm(&self, swarm_id: &str) -> Result<SwarmInfo> {
        debug!(swarm_id, "Fetching swarm info");
        let swarm: SwarmResponse = self.get_json(&format!("/api/swarms/{swarm_id}")).await?;
        Ok(swarm.into())
    }

    async fn list_swarms(&self) -> Result<Vec<SwarmInfo>> {
        debug!("Listing swarms");
        let swarms: Vec<SwarmResponse> = self.get_json("/api/swarms").await?;
        Ok(swarms.into_iter().map(Into::into).collect())
    }

    async fn list_swarm_transactions(&self, swarm_id: &str) -> Result<Vec<Transaction>> {
        debug!(swarm_id, "Listing swarm transactions");
        let txs: Vec<TransactionResponse> = self
            .get_json(&format!("/api/swarms/{swarm_id}/transactions"))
            .await?;
        Ok(txs.into_iter().map(Into::into).collect())
    }
}
