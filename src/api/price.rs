//! HNT/USD price feed.

use crate::error::{OnboardingError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, instrument};

/// Raw quote: the price is `price * 10^expo` USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceQuote {
    #[serde(deserialize_with = "string_or_number")]
    pub price: i64,
    pub expo: i32,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        Raw::Num(n) => Ok(n),
    }
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Latest quote for `feed_id`, `None` when the feed has no price.
    async fn latest_price(&self, feed_id: &str) -> Result<Option<PriceQuote>>;
}

#[derive(Debug, Deserialize)]
struct HermesResponse {
    #[serde(default)]
    parsed: Vec<HermesParsed>,
}

#[derive(Debug, Deserialize)]
struct HermesParsed {
    id: String,
    price: PriceQuote,
}

/// Pyth Hermes price service.
pub struct HermesPriceFeed {
    base_url: String,
    http: Client,
}

impl HermesPriceFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl PriceFeed for HermesPriceFeed {
    #[instrument(skip(self))]
    async fn latest_price(&self, feed_id: &str) -> Result<Option<PriceQuote>> {
        let url = format!("{}/v2/updates/price/latest", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("ids[]", feed_id)])
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OnboardingError::Api {
                status: response.status().as_u16(),
                message: format!("price feed request failed for {feed_id}"),
            });
        }

        let body: HermesResponse = response.json().await?;
        let wanted = feed_id.trim_start_matches("0x");
        let quote = body
            .parsed
            .into_iter()
            .find(|p| p.id.trim_start_matches("0x").eq_ignore_ascii_case(wanted))
            .map(|p| p.price);

        debug!(?quote, "Fetched price");
        Ok(quote)
    }
}
