//! REST client for the onboarding server.
//!
//! Every call waits on a shared `governor` limiter and is retried with capped
//! exponential backoff while the server answers 404, which it does until a
//! freshly created hotspot has propagated.

use super::{
    CreateHotspotRequest, IotMetadataRequest, MobileMetadataRequest, OnboardRequest,
    OnboardingApi, TransactionResponse,
};
use crate::error::{OnboardingError, Result};
use crate::types::OnboardingRecord;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, instrument, warn};

/// Envelope wrapped around every onboarding server response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    error_message: Option<String>,
    data: Option<T>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionData {
    #[serde(default)]
    solana_transactions: Vec<String>,
}

pub struct HttpOnboardingClient {
    base_url: String,
    http: Client,
    limiter: DefaultDirectRateLimiter,
    retry_attempts: usize,
}

impl HttpOnboardingClient {
    pub fn new(base_url: impl Into<String>, requests_per_second: u32, retry_attempts: usize) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            retry_attempts,
        }
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retry_attempts)
    }

    async fn send_once<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::NOT_FOUND => Err(OnboardingError::NotFound(path.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(OnboardingError::RateLimited),
            status if !status.is_success() => {
                let message = response
                    .json::<Envelope<serde_json::Value>>()
                    .await
                    .ok()
                    .and_then(|envelope| envelope.error_message)
                    .unwrap_or_else(|| status.to_string());
                Err(OnboardingError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => Ok(response.json::<Envelope<T>>().await?),
        }
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        RetryIf::start(
            self.retry_strategy(),
            || self.send_once(method.clone(), path, body),
            |err: &OnboardingError| {
                let retry = err.is_not_found();
                if retry {
                    debug!(path, "Not found yet, retrying");
                }
                retry
            },
        )
        .await
    }

    async fn post_transactions<B>(&self, path: &str, body: &B) -> Result<TransactionResponse>
    where
        B: Serialize + Sync,
    {
        let envelope: Envelope<TransactionData> = self.send(Method::POST, path, Some(body)).await?;
        Ok(TransactionResponse {
            success: envelope.success,
            error_message: envelope.error_message,
            solana_transactions: envelope.data.unwrap_or_default().solana_transactions,
        })
    }
}

#[async_trait]
impl OnboardingApi for HttpOnboardingClient {
    #[instrument(skip(self))]
    async fn onboarding_record(&self, address: &str) -> Result<Option<OnboardingRecord>> {
        let path = format!("hotspots/{address}");
        match self.send::<(), OnboardingRecord>(Method::GET, &path, None).await {
            Ok(envelope) => match envelope.data {
                Some(record) => Ok(Some(record)),
                None => Err(OnboardingError::Api {
                    status: envelope.code.unwrap_or(200),
                    message: envelope
                        .error_message
                        .unwrap_or_else(|| "onboarding record missing from response".to_string()),
                }),
            },
            Err(OnboardingError::RateLimited) => {
                warn!("Onboarding record lookup rate limited, treating as absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all)]
    async fn create_hotspot(&self, request: &CreateHotspotRequest) -> Result<TransactionResponse> {
        self.post_transactions("transactions/create-hotspot", request).await
    }

    #[instrument(skip_all, fields(entity_key = %request.entity_key))]
    async fn onboard_iot(&self, request: &OnboardRequest) -> Result<TransactionResponse> {
        self.post_transactions("transactions/iot/onboard", request).await
    }

    #[instrument(skip_all, fields(entity_key = %request.entity_key))]
    async fn onboard_mobile(&self, request: &OnboardRequest) -> Result<TransactionResponse> {
        self.post_transactions("transactions/mobile/onboard", request).await
    }

    #[instrument(skip_all, fields(entity_key = %request.entity_key))]
    async fn update_iot_metadata(&self, request: &IotMetadataRequest) -> Result<TransactionResponse> {
        self.post_transactions("transactions/iot/update-metadata", request).await
    }

    #[instrument(skip_all, fields(entity_key = %request.entity_key))]
    async fn update_mobile_metadata(
        &self,
        request: &MobileMetadataRequest,
    ) -> Result<TransactionResponse> {
        self.post_transactions("transactions/mobile/update-metadata", request).await
    }
}
