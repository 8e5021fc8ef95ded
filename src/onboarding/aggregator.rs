use super::types::{FeeEstimate, FeeTotals, ATA_RENT_LAMPORTS};
use crate::chain::keys::DC_MINT;
use crate::chain::ChainClient;
use crate::currency::Balance;
use crate::error::Result;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Sums per-transaction estimates and adds one-time account costs.
#[derive(Clone)]
pub struct FeeAggregator {
    chain: Arc<dyn ChainClient>,
}

impl FeeAggregator {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    pub fn sum(estimates: &[FeeEstimate]) -> FeeTotals {
        estimates
            .iter()
            .fold(FeeTotals::default(), |totals, estimate| FeeTotals {
                maker_fees: totals.maker_fees + estimate.maker_fees,
                owner_fees: totals.owner_fees + estimate.owner_fees,
            })
    }

    /// When the owner pays anything, also charge rent for their DC account if
    /// it does not exist yet.
    #[instrument(skip(self, totals), fields(owner = %owner))]
    pub async fn with_account_creation(&self, totals: FeeTotals, owner: &Pubkey) -> Result<FeeTotals> {
        if totals.is_free() {
            return Ok(totals);
        }

        let dc_account = get_associated_token_address(owner, &DC_MINT);
        if self.chain.account_exists(&dc_account).await? {
            return Ok(totals);
        }

        debug!(%dc_account, "DC account missing, adding rent to owner fees");
        let mut totals = totals;
        totals.owner_fees.lamports += Balance::new(ATA_RENT_LAMPORTS);
        Ok(totals)
    }
}
