//! Builds the per-network metadata update (and onboard) transactions.
//!
//! Unset numeric fields resolve as: explicit request value, then the value
//! already on chain, then a fixed default. Requests for all networks go out
//! concurrently; results are checked in request order and the first failure
//! fails the whole batch.

use super::types::{PendingTransaction, TransactionKind, TransactionPlan};
use crate::api::{
    DeploymentInfoRequest, IotMetadataRequest, MobileMetadataRequest, OnboardRequest,
    OnboardingApi, TransactionResponse,
};
use crate::chain::accounts::{IotHotspotInfo, MobileHotspotInfo, WifiDeploymentInfo};
use crate::chain::programs::decode_transaction;
use crate::error::{OnboardingError, Result};
use crate::types::{NetworkDetail, NetworkType};
use futures::future::join_all;
use nonempty::NonEmpty;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Gain in tenths of a dBi used when neither the request nor the chain has one.
pub const DEFAULT_GAIN: i32 = 10;
pub const DEFAULT_ELEVATION: i32 = 0;

/// Existing on-chain metadata used to fill unset request fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistingMetadata<'a> {
    pub iot: Option<&'a IotHotspotInfo>,
    pub mobile: Option<&'a MobileHotspotInfo>,
}

fn gain_in_tenths(detail: &NetworkDetail) -> Option<i32> {
    detail.decimal_gain.map(|gain| (gain * 10.0).round() as i32)
}

fn iot_gain(detail: &NetworkDetail, existing: Option<&IotHotspotInfo>) -> i32 {
    gain_in_tenths(detail)
        .or_else(|| existing.and_then(|info| info.gain))
        .unwrap_or(DEFAULT_GAIN)
}

fn iot_elevation(detail: &NetworkDetail, existing: Option<&IotHotspotInfo>) -> i32 {
    detail
        .elevation
        .or_else(|| existing.and_then(|info| info.elevation))
        .unwrap_or(DEFAULT_ELEVATION)
}

/// Wifi deployment info to send, if the device is a wifi device or the caller
/// set any wifi field.
fn wifi_deployment(
    detail: &NetworkDetail,
    existing: Option<&MobileHotspotInfo>,
) -> Option<WifiDeploymentInfo> {
    let current = existing.and_then(|info| info.wifi_info());
    if current.is_none() && !detail.has_wifi_overrides() {
        return None;
    }
    let current = current.copied().unwrap_or_default();
    Some(WifiDeploymentInfo {
        antenna: detail.antenna.unwrap_or(current.antenna),
        elevation: detail.elevation.unwrap_or(current.elevation),
        azimuth: detail.azimuth.unwrap_or(current.azimuth),
        mechanical_down_tilt: detail
            .mechanical_down_tilt
            .unwrap_or(current.mechanical_down_tilt),
        electrical_down_tilt: detail
            .electrical_down_tilt
            .unwrap_or(current.electrical_down_tilt),
    })
}

fn location_string(detail: &NetworkDetail) -> Result<Option<String>> {
    Ok(detail.location()?.map(|location| location.to_string()))
}

/// Check every response in order and decode the transactions of a fully
/// successful batch.
fn collect_plan(
    networks: &[NetworkType],
    responses: Vec<Result<TransactionResponse>>,
    kind: fn(NetworkType) -> TransactionKind,
) -> Result<TransactionPlan> {
    let responses = responses.into_iter().collect::<Result<Vec<_>>>()?;
    if let Some(message) = responses.iter().find_map(TransactionResponse::failure) {
        return Err(OnboardingError::Rejected(message));
    }

    let mut plan = TransactionPlan::default();
    for (network, response) in networks.iter().zip(responses) {
        for encoded in &response.solana_transactions {
            plan.push(PendingTransaction::new(kind(*network), decode_transaction(encoded)?));
        }
    }
    Ok(plan)
}

#[derive(Clone)]
pub struct MetadataUpdateSynthesizer {
    api: Arc<dyn OnboardingApi>,
}

impl MetadataUpdateSynthesizer {
    pub fn new(api: Arc<dyn OnboardingApi>) -> Self {
        Self { api }
    }

    async fn update_request(
        &self,
        gateway: &str,
        wallet: &Pubkey,
        detail: &NetworkDetail,
        existing: ExistingMetadata<'_>,
        payer: Option<&Pubkey>,
    ) -> Result<TransactionResponse> {
        let location = location_string(detail)?;
        let payer = payer.map(|p| p.to_string());

        match detail.hotspot_type {
            NetworkType::Iot => {
                let request = IotMetadataRequest {
                    entity_key: gateway.to_string(),
                    wallet: wallet.to_string(),
                    location,
                    elevation: Some(iot_elevation(detail, existing.iot)),
                    gain: Some(iot_gain(detail, existing.iot)),
                    payer,
                };
                self.api.update_iot_metadata(&request).await
            }
            NetworkType::Mobile => {
                let request = MobileMetadataRequest {
                    entity_key: gateway.to_string(),
                    wallet: wallet.to_string(),
                    location,
                    deployment_info: wifi_deployment(detail, existing.mobile)
                        .map(DeploymentInfoRequest::WifiInfoV0),
                    payer,
                };
                self.api.update_mobile_metadata(&request).await
            }
        }
    }

    /// One update-metadata transaction set per requested network, in request order.
    #[instrument(skip(self, details, existing, payer), fields(networks = details.len()))]
    pub async fn synthesize(
        &self,
        gateway: &str,
        wallet: &Pubkey,
        details: &NonEmpty<NetworkDetail>,
        existing: ExistingMetadata<'_>,
        payer: Option<&Pubkey>,
    ) -> Result<TransactionPlan> {
        let responses = join_all(
            details
                .iter()
                .map(|detail| self.update_request(gateway, wallet, detail, existing, payer)),
        )
        .await;

        let networks: Vec<_> = details.iter().map(|d| d.hotspot_type).collect();
        let plan = collect_plan(&networks, responses, TransactionKind::UpdateMetadata)?;
        debug!(transactions = plan.len(), "Synthesized metadata updates");
        Ok(plan)
    }

    async fn onboard_request(&self, gateway: &str, detail: &NetworkDetail) -> Result<TransactionResponse> {
        let location = location_string(detail)?;
        match detail.hotspot_type {
            NetworkType::Iot => {
                let request = OnboardRequest {
                    entity_key: gateway.to_string(),
                    location,
                    elevation: Some(iot_elevation(detail, None)),
                    gain: Some(iot_gain(detail, None)),
                    deployment_info: None,
                };
                self.api.onboard_iot(&request).await
            }
            NetworkType::Mobile => {
                let request = OnboardRequest {
                    entity_key: gateway.to_string(),
                    location,
                    elevation: None,
                    gain: None,
                    deployment_info: wifi_deployment(detail, None)
                        .map(DeploymentInfoRequest::WifiInfoV0),
                };
                self.api.onboard_mobile(&request).await
            }
        }
    }

    /// Onboard transactions for each requested network, in request order.
    #[instrument(skip(self, details), fields(networks = details.len()))]
    pub async fn synthesize_onboarding(
        &self,
        gateway: &str,
        details: &NonEmpty<NetworkDetail>,
    ) -> Result<TransactionPlan> {
        let responses = join_all(details.iter().map(|detail| self.onboard_request(gateway, detail))).await;
        let networks: Vec<_> = details.iter().map(|d| d.hotspot_type).collect();
        collect_plan(&networks, responses, TransactionKind::Onboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::accounts::{DeploymentInfo, MobileDeviceType};

    fn iot_info(gain: Option<i32>, elevation: Option<i32>) -> IotHotspotInfo {
        IotHotspotInfo {
            asset: Pubkey::new_unique(),
            location: None,
            elevation,
            gain,
            is_full_hotspot: true,
            num_location_asserts: 1,
            is_active: true,
            dc_onboarding_fee_paid: 0,
        }
    }

    #[test]
    fn test_gain_precedence() {
        let detail = NetworkDetail::new(NetworkType::Iot);
        assert_eq!(iot_gain(&detail, None), DEFAULT_GAIN);
        assert_eq!(iot_gain(&detail, Some(&iot_info(Some(58), None))), 58);

        let detail = detail.with_gain(1.2);
        assert_eq!(iot_gain(&detail, Some(&iot_info(Some(58), None))), 12);
    }

    #[test]
    fn test_elevation_precedence() {
        let detail = NetworkDetail::new(NetworkType::Iot);
        assert_eq!(iot_elevation(&detail, None), 0);
        assert_eq!(iot_elevation(&detail, Some(&iot_info(None, Some(30)))), 30);
        assert_eq!(iot_elevation(&detail.with_elevation(5), Some(&iot_info(None, Some(30)))), 5);
    }

    #[test]
    fn test_wifi_deployment_merges_existing() {
        let existing = MobileHotspotInfo {
            asset: Pubkey::new_unique(),
            location: None,
            is_full_hotspot: true,
            num_location_asserts: 0,
            is_active: true,
            dc_onboarding_fee_paid: 0,
            device_type: MobileDeviceType::WifiOutdoor,
            deployment_info: Some(DeploymentInfo::WifiInfoV0(WifiDeploymentInfo {
                antenna: 6,
                elevation: 12,
                azimuth: 90,
                mechanical_down_tilt: 2,
                electrical_down_tilt: 3,
            })),
        };
        let mut detail = NetworkDetail::new(NetworkType::Mobile);
        detail.azimuth = Some(270);

        let info = wifi_deployment(&detail, Some(&existing)).unwrap();
        assert_eq!(info.azimuth, 270);
        assert_eq!(info.antenna, 6);
        assert_eq!(info.electrical_down_tilt, 3);
    }

    #[test]
    fn test_no_wifi_info_without_overrides_or_existing() {
        let detail = NetworkDetail::new(NetworkType::Mobile);
        assert_eq!(wifi_deployment(&detail, None), None);

        let detail = detail.with_elevation(4);
        let info = wifi_deployment(&detail, None).unwrap();
        assert_eq!(info, WifiDeploymentInfo { elevation: 4, ..Default::default() });
    }

    #[test]
    fn test_first_rejection_in_order_fails_batch() {
        let responses = vec![
            Ok(TransactionResponse::ok(vec![])),
            Ok(TransactionResponse::failed("Mobile hotspot not onboarded")),
            Ok(TransactionResponse::failed("second")),
        ];
        let networks = [NetworkType::Iot, NetworkType::Mobile, NetworkType::Iot];
        let err = collect_plan(&networks, responses, TransactionKind::UpdateMetadata).unwrap_err();
        assert_eq!(err.to_string(), "Mobile hotspot not onboarded");
    }
}
