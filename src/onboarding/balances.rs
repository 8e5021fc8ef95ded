use super::types::Balances;
use crate::chain::keys::{DC_MINT, HNT_MINT};
use crate::chain::{token_balance, ChainClient};
use crate::currency::Balance;
use crate::error::Result;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reads an owner's HNT, DC and SOL balances. Read errors propagate; a
/// balance is never defaulted to zero on failure.
#[derive(Clone)]
pub struct BalanceAggregator {
    chain: Arc<dyn ChainClient>,
}

impl BalanceAggregator {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn get_balances(&self, owner: &Pubkey) -> Result<Balances> {
        let chain = self.chain.as_ref();
        let (hnt, dc, sol) = tokio::try_join!(
            token_balance(chain, owner, &HNT_MINT),
            token_balance(chain, owner, &DC_MINT),
            chain.lamports(owner),
        )?;

        let balances = Balances {
            hnt: Balance::new(hnt),
            dc: Balance::new(dc),
            sol: Balance::new(sol),
        };
        debug!(hnt = %balances.hnt, dc = %balances.dc, sol = %balances.sol, "Fetched balances");
        Ok(balances)
    }
}
