//! Clients for the off-chain collaborators: the onboarding server and the
//! HNT price feed.

pub mod http;
pub mod price;

use crate::chain::accounts::WifiDeploymentInfo;
use crate::error::Result;
use crate::types::OnboardingRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpOnboardingClient;
pub use price::{HermesPriceFeed, PriceFeed, PriceQuote};

/// Location is sent as the decimal string of the H3 index.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IotMetadataRequest {
    pub entity_key: String,
    pub wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<i32>,
    /// Tenths of a dBi.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentInfoRequest {
    WifiInfoV0(WifiDeploymentInfo),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileMetadataRequest {
    pub entity_key: String,
    pub wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_info: Option<DeploymentInfoRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardRequest {
    pub entity_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_info: Option<DeploymentInfoRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHotspotRequest {
    /// Base64 add-gateway transaction signed by the hotspot.
    pub transaction: String,
}

/// Response shape shared by every transaction-producing endpoint.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Base64 serialized transactions.
    #[serde(default)]
    pub solana_transactions: Vec<String>,
}

fn default_success() -> bool {
    true
}

impl TransactionResponse {
    pub fn ok(solana_transactions: Vec<String>) -> Self {
        Self {
            success: true,
            error_message: None,
            solana_transactions,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            solana_transactions: Vec::new(),
        }
    }

    /// The message to surface when this entry failed, if it did.
    pub fn failure(&self) -> Option<String> {
        match (&self.error_message, self.success) {
            (Some(message), _) => Some(message.clone()),
            (None, false) => Some("onboarding server reported failure".to_string()),
            (None, true) => None,
        }
    }
}

/// Onboarding server operations the pipeline depends on.
#[async_trait]
pub trait OnboardingApi: Send + Sync {
    /// Look up the maker record for a hotspot. `Ok(None)` means the lookup was
    /// rate limited and should be treated as absent.
    async fn onboarding_record(&self, address: &str) -> Result<Option<OnboardingRecord>>;

    async fn create_hotspot(&self, request: &CreateHotspotRequest) -> Result<TransactionResponse>;

    async fn onboard_iot(&self, request: &OnboardRequest) -> Result<TransactionResponse>;

    async fn onboard_mobile(&self, request: &OnboardRequest) -> Result<TransactionResponse>;

    async fn update_iot_metadata(&self, request: &IotMetadataRequest) -> Result<TransactionResponse>;

    async fn update_mobile_metadata(
        &self,
        request: &MobileMetadataRequest,
    ) -> Result<TransactionResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_request_json() {
        let request = MobileMetadataRequest {
            entity_key: "112abc".into(),
            wallet: "wallet".into(),
            location: Some("631246145620711423".into()),
            deployment_info: Some(DeploymentInfoRequest::WifiInfoV0(WifiDeploymentInfo {
                antenna: 6,
                ..Default::default()
            })),
            payer: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["entityKey"], "112abc");
        assert_eq!(json["deploymentInfo"]["wifiInfoV0"]["antenna"], 6);
        assert_eq!(json["deploymentInfo"]["wifiInfoV0"]["mechanicalDownTilt"], 0);
        assert!(json.get("payer").is_none());
    }

    #[test]
    fn test_response_failure_message() {
        let failed: TransactionResponse =
            serde_json::from_str(r#"{"success":false,"errorMessage":"Hotspot not found"}"#).unwrap();
        assert_eq!(failed.failure().as_deref(), Some("Hotspot not found"));

        let ok: TransactionResponse = serde_json::from_str(r#"{"solanaTransactions":["AQ=="]}"#).unwrap();
        assert!(ok.success);
        assert_eq!(ok.failure(), None);
        assert_eq!(ok.solana_transactions.len(), 1);
    }
}
