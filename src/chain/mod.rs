//! Chain access: key derivation, account decoding, instruction building and
//! the RPC seam the pipeline talks through.

pub mod accounts;
pub mod address;
pub mod keys;
pub mod location;
pub mod programs;
pub mod rpc;

use crate::error::Result;
use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, program_pack::Pack, pubkey::Pubkey,
    signature::Signature, transaction::VersionedTransaction,
};
use spl_associated_token_account::get_associated_token_address;

pub use rpc::RpcChainClient;

/// Post-simulation state of one watched account.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountSnapshot {
    pub lamports: u64,
    pub data: Vec<u8>,
}

impl AccountSnapshot {
    /// SPL token amount held, if the data is a token account.
    pub fn token_amount(&self) -> Option<u64> {
        spl_token::state::Account::unpack(&self.data)
            .ok()
            .map(|account| account.amount)
    }
}

/// Read, simulate and send primitives against a Solana cluster.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Raw account data, `None` when the account does not exist.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Lamport balance; zero for a missing account.
    async fn lamports(&self, address: &Pubkey) -> Result<u64>;

    /// Simulate `tx` and return the post-state of each watched account, in order.
    ///
    /// A transaction that fails its program checks returns
    /// [`crate::error::OnboardingError::SimulationWouldFail`].
    async fn simulate(
        &self,
        tx: &VersionedTransaction,
        watched: &[Pubkey],
    ) -> Result<Vec<Option<AccountSnapshot>>>;

    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn send_transaction(
        &self,
        tx: &VersionedTransaction,
        skip_preflight: bool,
    ) -> Result<Signature>;

    /// Wait until `signature` reaches `commitment`; returns the slot it landed in.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<u64>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        Ok(self.account_data(address).await?.is_some())
    }
}

/// Token balance of `owner`'s associated account for `mint`. A missing
/// associated account holds nothing.
pub async fn token_balance(
    chain: &dyn ChainClient,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<u64> {
    let ata = get_associated_token_address(owner, mint);
    let Some(data) = chain.account_data(&ata).await? else {
        return Ok(0);
    };
    let account = spl_token::state::Account::unpack(&data).map_err(|e| {
        crate::error::OnboardingError::AccountDecode {
            account: ata.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(account.amount)
}
