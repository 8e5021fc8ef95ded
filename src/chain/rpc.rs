//! [`ChainClient`] backed by a nonblocking Solana RPC client.

use super::{AccountSnapshot, ChainClient};
use crate::error::{OnboardingError, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{
    RpcSendTransactionConfig, RpcSimulateTransactionAccountsConfig, RpcSimulateTransactionConfig,
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::VersionedTransaction,
};
use solana_transaction_status::TransactionStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, instrument, warn};

pub struct RpcChainClient {
    rpc: Arc<RpcClient>,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcChainClient {
    pub fn new(endpoint: String, commitment: CommitmentConfig, request_timeout: Duration) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(endpoint, request_timeout, commitment);
        Self::from_client(Arc::new(rpc), commitment)
    }

    pub fn from_client(rpc: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self {
            rpc,
            commitment,
            confirm_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn with_confirmation(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.confirm_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    fn status_outcome(signature: &Signature, status: &TransactionStatus) -> Result<u64> {
        match &status.err {
            Some(err) => Err(OnboardingError::TransactionFailed {
                signature: signature.to_string(),
                reason: format!("{err:?}"),
            }),
            None => Ok(status.slot),
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await?;
        Ok(response.value.map(|account| account.data))
    }

    async fn lamports(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.rpc.get_balance(address).await?)
    }

    #[instrument(skip(self, tx, watched), fields(watched = watched.len()))]
    async fn simulate(
        &self,
        tx: &VersionedTransaction,
        watched: &[Pubkey],
    ) -> Result<Vec<Option<AccountSnapshot>>> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            accounts: Some(RpcSimulateTransactionAccountsConfig {
                encoding: None,
                addresses: watched.iter().map(|key| key.to_string()).collect(),
            }),
            ..Default::default()
        };

        let result = self.rpc.simulate_transaction_with_config(tx, config).await?.value;

        if let Some(err) = result.err {
            let logs = result.logs.unwrap_or_default();
            debug!(simulation_logs = ?logs, "Simulation rejected transaction");
            return Err(OnboardingError::SimulationWouldFail(format!("{err:?}")));
        }

        let accounts = result.accounts.ok_or_else(|| {
            OnboardingError::Simulation("simulation returned no account state".to_string())
        })?;

        Ok(accounts
            .into_iter()
            .map(|account| {
                account.and_then(|ui| {
                    let lamports = ui.lamports;
                    ui.decode::<Account>().map(|decoded| AccountSnapshot {
                        lamports,
                        data: decoded.data,
                    })
                })
            })
            .collect())
    }

    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    #[instrument(skip(self, tx))]
    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight,
            preflight_commitment: Some(self.commitment.commitment),
            ..Default::default()
        };
        let signature = self.rpc.send_transaction_with_config(tx, config).await?;
        debug!(%signature, "Transaction sent");
        Ok(signature)
    }

    #[instrument(skip(self), fields(signature = %signature))]
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<u64> {
        let deadline = Instant::now() + self.confirm_timeout;

        loop {
            let statuses = self
                .rpc
                .get_signature_statuses(std::slice::from_ref(signature))
                .await?
                .value;

            if let Some(Some(status)) = statuses.first() {
                if status.err.is_some() || status.satisfies_commitment(commitment) {
                    return Self::status_outcome(signature, status);
                }
            }

            if Instant::now() >= deadline {
                warn!("Gave up waiting for confirmation");
                return Err(OnboardingError::ConfirmationTimeout(signature.to_string()));
            }
            sleep(self.poll_interval).await;
        }
    }
}
