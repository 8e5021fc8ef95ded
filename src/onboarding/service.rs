//! The onboarding service: record lookup, assert-location fee computation,
//! onboard and create-hotspot flows, and submission.

use super::aggregator::FeeAggregator;
use super::balances::BalanceAggregator;
use super::estimator::{EstimateContext, FeeEstimator};
use super::fee_oracle::ChainFeeOracle;
use super::price_oracle::PriceOracle;
use super::records::OnboardingRecordStore;
use super::submitter::{SubmissionResult, TransactionSubmitter};
use super::synthesizer::{ExistingMetadata, MetadataUpdateSynthesizer};
use super::top_up::TopUpPlanner;
use super::types::{
    AssertData, AssertRequest, PendingTransaction, TransactionKind, TransactionPlan,
};
use crate::api::{CreateHotspotRequest, OnboardingApi};
use crate::chain::address::entity_key_bytes;
use crate::chain::programs::decode_transaction;
use crate::error::{OnboardingError, Result};
use crate::types::{NetworkDetail, NetworkType, OnboardingRecord};
use nonempty::NonEmpty;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct OnboardingService {
    pub(super) api: Arc<dyn OnboardingApi>,
    pub(super) records: OnboardingRecordStore,
    pub(super) fee_oracle: ChainFeeOracle,
    pub(super) balances: BalanceAggregator,
    pub(super) price_oracle: PriceOracle,
    pub(super) synthesizer: MetadataUpdateSynthesizer,
    pub(super) estimator: Arc<dyn FeeEstimator>,
    pub(super) aggregator: FeeAggregator,
    pub(super) top_up: TopUpPlanner,
    pub(super) submitter: TransactionSubmitter,
}

impl OnboardingService {
    /// Maker record for a hotspot, served from the session cache after the
    /// first successful fetch. `None` when the lookup was rate limited.
    pub async fn get_onboarding_record(&self, gateway: &str) -> Result<Option<Arc<OnboardingRecord>>> {
        self.records.get_or_fetch(gateway, self.api.as_ref()).await
    }

    async fn maker_key(&self, gateway: &str) -> Result<Option<Pubkey>> {
        match self.get_onboarding_record(gateway).await? {
            Some(record) => record.maker.pubkey().map(Some),
            None => {
                warn!(gateway, "No onboarding record, continuing without maker");
                Ok(None)
            }
        }
    }

    /// Compute fees, balances and the ordered transactions for asserting a
    /// hotspot's location on every requested network.
    #[instrument(skip(self, request), fields(gateway = %request.gateway, owner = %request.owner))]
    pub async fn get_assert_data(&self, request: &AssertRequest) -> Result<AssertData> {
        let entity_key = entity_key_bytes(&request.gateway)?;
        let details = &request.network_details;
        let wants = |network: NetworkType| details.iter().any(|d| d.hotspot_type == network);

        let maker = self.maker_key(&request.gateway).await?;

        let (iot_info, mobile_info) = tokio::join!(
            async {
                if wants(NetworkType::Iot) {
                    self.fee_oracle.existing_iot_info(&entity_key).await
                } else {
                    None
                }
            },
            async {
                if wants(NetworkType::Mobile) {
                    self.fee_oracle.existing_mobile_info(&entity_key).await
                } else {
                    None
                }
            },
        );

        let (balances, oracle_price) = tokio::try_join!(
            self.balances.get_balances(&request.owner),
            self.price_oracle.get_oracle_price(),
        )?;

        let existing = ExistingMetadata {
            iot: iot_info.as_ref(),
            mobile: mobile_info.as_ref(),
        };
        let mut plan = self
            .synthesizer
            .synthesize(
                &request.gateway,
                &request.owner,
                details,
                existing,
                request.payer.as_ref(),
            )
            .await?;

        let ctx = EstimateContext {
            entity_key: &entity_key,
            owner: request.owner,
            maker: request.payer.or(maker),
            network_details: details,
        };
        let estimates = self.estimator.estimate(&plan, &ctx).await?;

        let totals = FeeAggregator::sum(&estimates);
        let is_free = totals.is_free();
        let totals = self
            .aggregator
            .with_account_creation(totals, &request.owner)
            .await?;

        let top_up = self
            .top_up
            .plan(&request.owner, totals, &balances, oracle_price, &mut plan)
            .await?;

        info!(
            is_free,
            owner_dc = %top_up.totals.owner_fees.dc,
            owner_sol = %top_up.totals.owner_fees.lamports,
            sufficient = top_up.has_sufficient_balance,
            transactions = plan.len(),
            "Computed assert data"
        );

        Ok(AssertData {
            balances,
            owner_fees: top_up.totals.owner_fees,
            maker_fees: top_up.totals.maker_fees,
            is_free,
            has_sufficient_sol: top_up.has_sufficient_sol,
            has_sufficient_dc: top_up.has_sufficient_dc,
            has_sufficient_hnt: top_up.has_sufficient_hnt,
            has_sufficient_balance: top_up.has_sufficient_balance,
            dc_needed: top_up.dc_needed,
            hnt_needed: top_up.hnt_needed,
            oracle_price,
            solana_transactions: plan.to_base64()?,
            plan,
        })
    }

    /// Onboard transactions for each requested network. Requires a maker.
    #[instrument(skip(self, details))]
    pub async fn onboard_transactions(
        &self,
        gateway: &str,
        details: &NonEmpty<NetworkDetail>,
    ) -> Result<TransactionPlan> {
        entity_key_bytes(gateway)?;
        if self.get_onboarding_record(gateway).await?.is_none() {
            return Err(OnboardingError::MissingOnboardingRecord(gateway.to_string()));
        }
        self.synthesizer.synthesize_onboarding(gateway, details).await
    }

    /// Forward a hotspot-signed add-gateway transaction and return the
    /// transactions that issue the hotspot on Solana.
    #[instrument(skip_all)]
    pub async fn create_hotspot(&self, add_gateway_txn: &str) -> Result<TransactionPlan> {
        let response = self
            .api
            .create_hotspot(&CreateHotspotRequest {
                transaction: add_gateway_txn.to_string(),
            })
            .await?;
        if let Some(message) = response.failure() {
            return Err(OnboardingError::Rejected(message));
        }

        let mut plan = TransactionPlan::default();
        for encoded in &response.solana_transactions {
            plan.push(PendingTransaction::new(
                TransactionKind::CreateHotspot,
                decode_transaction(encoded)?,
            ));
        }
        Ok(plan)
    }

    /// Whether the hotspot has been issued on Solana.
    pub async fn is_hotspot_issued(&self, gateway: &str) -> Result<bool> {
        self.fee_oracle.is_issued(&entity_key_bytes(gateway)?).await
    }

    pub async fn submit(
        &self,
        plan: &TransactionPlan,
        signer: &dyn Signer,
    ) -> Result<Vec<SubmissionResult>> {
        self.submitter.submit(plan, signer).await
    }
}
