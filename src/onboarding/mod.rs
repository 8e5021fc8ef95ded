//! Onboarding and assert-location orchestration.
//!
//! The assert pipeline runs: existing metadata lookup, metadata update
//! synthesis, fee estimation, fee aggregation, then balance and top-up
//! planning. [`OnboardingBuilder`] wires the stages together.

pub mod aggregator;
pub mod balances;
pub mod estimator;
pub mod fee_oracle;
pub mod price_oracle;
pub mod records;
pub mod service;
pub mod submitter;
pub mod synthesizer;
pub mod top_up;
pub mod types;

pub use aggregator::FeeAggregator;
pub use balances::BalanceAggregator;
pub use estimator::{
    DeterministicEstimator, EstimateContext, FallbackEstimator, FeeEstimator, SimulatedEstimator,
};
pub use fee_oracle::ChainFeeOracle;
pub use price_oracle::PriceOracle;
pub use records::OnboardingRecordStore;
pub use service::OnboardingService;
pub use submitter::{SubmissionResult, SubmitOptions, TransactionState, TransactionSubmitter};
pub use synthesizer::MetadataUpdateSynthesizer;
pub use top_up::{TopUp, TopUpPlanner};
pub use types::*;

use crate::api::{HermesPriceFeed, HttpOnboardingClient, OnboardingApi, PriceFeed};
use crate::chain::{ChainClient, RpcChainClient};
use crate::config::OnboardingConfig;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Builder for [`OnboardingService`]. Collaborators that are not supplied are
/// created from the configuration.
#[derive(Default)]
pub struct OnboardingBuilder {
    config: OnboardingConfig,
    chain: Option<Arc<dyn ChainClient>>,
    api: Option<Arc<dyn OnboardingApi>>,
    price_feed: Option<Arc<dyn PriceFeed>>,
    estimator: Option<Arc<dyn FeeEstimator>>,
    records: Option<OnboardingRecordStore>,
}

impl OnboardingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: OnboardingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_chain(mut self, chain: Arc<dyn ChainClient>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_api(mut self, api: Arc<dyn OnboardingApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_price_feed(mut self, feed: Arc<dyn PriceFeed>) -> Self {
        self.price_feed = Some(feed);
        self
    }

    /// Replace the default simulate-then-fallback estimator.
    pub fn with_estimator(mut self, estimator: Arc<dyn FeeEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Share a record store between services.
    pub fn with_record_store(mut self, records: OnboardingRecordStore) -> Self {
        self.records = Some(records);
        self
    }

    pub fn build(self) -> Result<OnboardingService> {
        let config = self.config;
        let commitment = config.commitment_config()?;

        let chain: Arc<dyn ChainClient> = match self.chain {
            Some(chain) => chain,
            None => Arc::new(
                RpcChainClient::new(config.rpc_endpoint.clone(), commitment, config.rpc_timeout())
                    .with_confirmation(config.confirm_timeout(), config.confirm_poll_interval()),
            ),
        };
        let api: Arc<dyn OnboardingApi> = match self.api {
            Some(api) => api,
            None => Arc::new(HttpOnboardingClient::new(
                config.onboarding_api_url.clone(),
                config.onboarding_requests_per_second,
                config.onboarding_retry_attempts,
            )),
        };
        let price_feed: Arc<dyn PriceFeed> = match self.price_feed {
            Some(feed) => feed,
            None => Arc::new(HermesPriceFeed::new(config.price_feed_url.clone())),
        };

        let fee_oracle = ChainFeeOracle::new(chain.clone());
        let estimator = self.estimator.unwrap_or_else(|| {
            Arc::new(FallbackEstimator::new(
                SimulatedEstimator::new(chain.clone()),
                DeterministicEstimator::new(fee_oracle.clone()),
            ))
        });

        info!(rpc = %config.rpc_endpoint, api = %config.onboarding_api_url, "Building onboarding service");

        Ok(OnboardingService {
            records: self
                .records
                .unwrap_or_else(|| OnboardingRecordStore::new(config.record_cache_capacity)),
            synthesizer: MetadataUpdateSynthesizer::new(api.clone()),
            api,
            balances: BalanceAggregator::new(chain.clone()),
            price_oracle: PriceOracle::new(price_feed, config.hnt_price_feed_id.clone()),
            estimator,
            aggregator: FeeAggregator::new(chain.clone()),
            top_up: TopUpPlanner::new(chain.clone()),
            submitter: TransactionSubmitter::new(
                chain,
                SubmitOptions {
                    commitment,
                    skip_preflight: config.skip_preflight,
                },
            ),
            fee_oracle,
        })
    }
}
