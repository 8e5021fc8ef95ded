//! Fee estimation: simulate first, fall back to the deterministic rule when
//! the simulation says the transaction would fail.

use super::fee_oracle::ChainFeeOracle;
use super::types::{FeeEstimate, Fees, PendingTransaction, TransactionPlan, TXN_FEE_IN_LAMPORTS};
use crate::chain::keys::DC_MINT;
use crate::chain::location::location_changed;
use crate::chain::{token_balance, AccountSnapshot, ChainClient};
use crate::currency::{Balance, Dc};
use crate::error::{OnboardingError, Result};
use crate::types::NetworkDetail;
use async_trait::async_trait;
use futures::future::try_join_all;
use nonempty::NonEmpty;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What an estimator needs to know besides the transactions themselves.
#[derive(Debug, Clone, Copy)]
pub struct EstimateContext<'a> {
    /// Raw entity key of the hotspot.
    pub entity_key: &'a [u8],
    pub owner: Pubkey,
    /// Sponsor that may pay some fees: the explicit payer if one was
    /// requested, otherwise the hotspot's maker.
    pub maker: Option<Pubkey>,
    pub network_details: &'a NonEmpty<NetworkDetail>,
}

#[async_trait]
pub trait FeeEstimator: Send + Sync {
    async fn estimate(
        &self,
        plan: &TransactionPlan,
        ctx: &EstimateContext<'_>,
    ) -> Result<Vec<FeeEstimate>>;
}

/// Pre-simulation balances of one fee-paying party.
#[derive(Debug, Clone, Copy)]
struct PartyState {
    wallet: Pubkey,
    lamports: u64,
    dc: u64,
}

impl PartyState {
    fn watched(&self) -> [Pubkey; 2] {
        [self.wallet, get_associated_token_address(&self.wallet, &DC_MINT)]
    }

    /// Fees implied by the post-simulation wallet and DC account.
    fn spent(&self, wallet: Option<&AccountSnapshot>, dc_account: Option<&AccountSnapshot>, pays_signature: bool) -> Fees {
        let post_lamports = wallet.map(|s| s.lamports).unwrap_or(0);
        let post_dc = dc_account.and_then(AccountSnapshot::token_amount).unwrap_or(0);

        let mut lamports = self.lamports.saturating_sub(post_lamports);
        if pays_signature {
            lamports = lamports.max(TXN_FEE_IN_LAMPORTS);
        }
        Fees {
            lamports: Balance::new(lamports),
            dc: Balance::<Dc>::new(self.dc.saturating_sub(post_dc)),
        }
    }
}

/// Reads actual costs from a simulation of each transaction.
#[derive(Clone)]
pub struct SimulatedEstimator {
    chain: Arc<dyn ChainClient>,
}

impl SimulatedEstimator {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    async fn party_state(&self, wallet: Pubkey) -> Result<PartyState> {
        let (lamports, dc) = tokio::try_join!(
            self.chain.lamports(&wallet),
            token_balance(self.chain.as_ref(), &wallet, &DC_MINT),
        )?;
        Ok(PartyState { wallet, lamports, dc })
    }

    async fn estimate_one(
        &self,
        index: usize,
        pending: &PendingTransaction,
        owner: &PartyState,
        maker: Option<&PartyState>,
    ) -> Result<FeeEstimate> {
        let mut watched = owner.watched().to_vec();
        if let Some(maker) = maker {
            watched.extend(maker.watched());
        }

        let snapshots = self.chain.simulate(&pending.transaction, &watched).await?;
        if snapshots.len() < watched.len() {
            return Err(OnboardingError::MissingSimulationResult(index));
        }

        let fee_payer = pending.transaction.message.static_account_keys().first().copied();
        let owner_fees = owner.spent(
            snapshots[0].as_ref(),
            snapshots[1].as_ref(),
            fee_payer == Some(owner.wallet),
        );
        let maker_fees = maker
            .map(|maker| {
                maker.spent(
                    snapshots[2].as_ref(),
                    snapshots[3].as_ref(),
                    fee_payer == Some(maker.wallet),
                )
            })
            .unwrap_or_default();

        debug!(index, kind = ?pending.kind, ?owner_fees, ?maker_fees, "Simulated transaction");
        Ok(FeeEstimate {
            maker_fees,
            owner_fees,
            is_free: owner_fees.is_zero(),
        })
    }
}

#[async_trait]
impl FeeEstimator for SimulatedEstimator {
    #[instrument(skip_all, fields(transactions = plan.len()))]
    async fn estimate(
        &self,
        plan: &TransactionPlan,
        ctx: &EstimateContext<'_>,
    ) -> Result<Vec<FeeEstimate>> {
        if plan.is_empty() {
            return Err(OnboardingError::MissingSimulationResult(0));
        }

        let owner = self.party_state(ctx.owner).await?;
        let maker = match ctx.maker.filter(|maker| *maker != ctx.owner) {
            Some(maker) => Some(self.party_state(maker).await?),
            None => None,
        };

        try_join_all(
            plan.iter()
                .enumerate()
                .map(|(index, pending)| self.estimate_one(index, pending, &owner, maker.as_ref())),
        )
        .await
    }
}

/// Rebuilds the fee rule without a simulation: the owner pays one signature
/// fee per network, plus the staking fee when the location changes.
#[derive(Clone)]
pub struct DeterministicEstimator {
    fee_oracle: ChainFeeOracle,
}

impl DeterministicEstimator {
    pub fn new(fee_oracle: ChainFeeOracle) -> Self {
        Self { fee_oracle }
    }

    async fn estimate_detail(&self, detail: &NetworkDetail, entity_key: &[u8]) -> Result<FeeEstimate> {
        let network = detail.hotspot_type;
        let next = detail.location()?;
        let previous = self.fee_oracle.previous_location(network, entity_key).await;

        let dc = if location_changed(previous, next) {
            self.fee_oracle.staking_fee(network).await
        } else {
            Balance::zero()
        };
        debug!(%network, ?previous, ?next, %dc, "Deterministic fee");

        Ok(FeeEstimate {
            maker_fees: Fees::default(),
            owner_fees: Fees {
                lamports: Balance::new(TXN_FEE_IN_LAMPORTS),
                dc,
            },
            is_free: false,
        })
    }
}

#[async_trait]
impl FeeEstimator for DeterministicEstimator {
    #[instrument(skip_all, fields(networks = ctx.network_details.len()))]
    async fn estimate(
        &self,
        _plan: &TransactionPlan,
        ctx: &EstimateContext<'_>,
    ) -> Result<Vec<FeeEstimate>> {
        try_join_all(
            ctx.network_details
                .iter()
                .map(|detail| self.estimate_detail(detail, ctx.entity_key)),
        )
        .await
    }
}

/// Runs `primary` and, only on a "would fail" error, `fallback`. Every other
/// error passes through unchanged.
pub struct FallbackEstimator<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackEstimator<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P: FeeEstimator, F: FeeEstimator> FeeEstimator for FallbackEstimator<P, F> {
    async fn estimate(
        &self,
        plan: &TransactionPlan,
        ctx: &EstimateContext<'_>,
    ) -> Result<Vec<FeeEstimate>> {
        match self.primary.estimate(plan, ctx).await {
            Err(e) if e.is_would_fail() => {
                warn!("Simulation rejected, using deterministic fees: {}", e);
                self.fallback.estimate(plan, ctx).await
            }
            other => other,
        }
    }
}
