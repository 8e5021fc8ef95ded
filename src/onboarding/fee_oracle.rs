//! On-chain fee configuration and existing hotspot metadata.

use super::types::DEFAULT_STAKING_FEE_DC;
use crate::chain::accounts::{
    ExistingHotspotInfo, IotHotspotInfo, MobileHotspotInfo, RewardableEntityConfig,
};
use crate::chain::keys::{dao_key, hotspot_info_key, key_to_asset_key, network_config_key, HNT_MINT};
use crate::chain::ChainClient;
use crate::currency::{Balance, Dc};
use crate::error::Result;
use crate::types::NetworkType;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Best-effort reads of entity-manager state. Lookups for different networks
/// are independent; a failed read is reported as absent.
#[derive(Clone)]
pub struct ChainFeeOracle {
    chain: Arc<dyn ChainClient>,
}

impl ChainFeeOracle {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    /// Location staking fee for `network`, or the default when the config
    /// account is missing or carries no fee for this network.
    #[instrument(skip(self))]
    pub async fn staking_fee(&self, network: NetworkType) -> Balance<Dc> {
        let key = network_config_key(network);
        let fee = match self.chain.account_data(&key).await {
            Ok(Some(data)) => match RewardableEntityConfig::decode(&data) {
                Ok(config) => config.settings.location_staking_fee(network),
                Err(e) => {
                    warn!(%key, "Failed to decode rewardable entity config: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, "Failed to fetch rewardable entity config: {}", e);
                None
            }
        };
        Balance::new(fee.unwrap_or(DEFAULT_STAKING_FEE_DC))
    }

    async fn info_account(&self, network: NetworkType, entity_key: &[u8]) -> Option<Vec<u8>> {
        let key = hotspot_info_key(network, entity_key);
        match self.chain.account_data(&key).await {
            Ok(data) => data,
            Err(e) => {
                debug!(%key, %network, "Hotspot info unavailable: {}", e);
                None
            }
        }
    }

    pub async fn existing_iot_info(&self, entity_key: &[u8]) -> Option<IotHotspotInfo> {
        let data = self.info_account(NetworkType::Iot, entity_key).await?;
        IotHotspotInfo::decode(&data)
            .map_err(|e| warn!("Ignoring undecodable IOT info: {}", e))
            .ok()
    }

    pub async fn existing_mobile_info(&self, entity_key: &[u8]) -> Option<MobileHotspotInfo> {
        let data = self.info_account(NetworkType::Mobile, entity_key).await?;
        MobileHotspotInfo::decode(&data)
            .map_err(|e| warn!("Ignoring undecodable MOBILE info: {}", e))
            .ok()
    }

    pub async fn existing_info(
        &self,
        network: NetworkType,
        entity_key: &[u8],
    ) -> Option<ExistingHotspotInfo> {
        match network {
            NetworkType::Iot => self.existing_iot_info(entity_key).await.map(ExistingHotspotInfo::Iot),
            NetworkType::Mobile => self
                .existing_mobile_info(entity_key)
                .await
                .map(ExistingHotspotInfo::Mobile),
        }
    }

    /// Previously asserted location on `network`, if any.
    pub async fn previous_location(&self, network: NetworkType, entity_key: &[u8]) -> Option<u64> {
        self.existing_info(network, entity_key)
            .await
            .and_then(|info| info.location())
    }

    /// Whether the hotspot has been issued as an asset.
    #[instrument(skip(self, entity_key))]
    pub async fn is_issued(&self, entity_key: &[u8]) -> Result<bool> {
        let key = key_to_asset_key(&dao_key(&HNT_MINT), entity_key);
        self.chain.account_exists(&key).await
    }
}
