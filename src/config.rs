//! Runtime configuration for the onboarding service.

use crate::error::{OnboardingError, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// HNT/USD feed on Pyth.
pub const HNT_PRICE_FEED_ID: &str =
    "0x649fdd7ec08e8e2a20f425729854e90293dcbe2376abc47197a14da6ff339756";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingConfig {
    /// Solana RPC endpoint
    pub rpc_endpoint: String,
    pub rpc_timeout_seconds: u64,
    /// Commitment used for reads and confirmations ("processed", "confirmed", "finalized")
    pub commitment: String,
    /// Skip the RPC node's preflight simulation when sending
    pub skip_preflight: bool,
    /// Base URL of the onboarding server
    pub onboarding_api_url: String,
    /// Retries while the onboarding server answers "not found"
    pub onboarding_retry_attempts: usize,
    pub onboarding_requests_per_second: u32,
    /// Pyth Hermes endpoint
    pub price_feed_url: String,
    pub hnt_price_feed_id: String,
    /// Maximum cached onboarding records
    pub record_cache_capacity: u64,
    pub confirm_timeout_seconds: u64,
    pub confirm_poll_interval_ms: u64,
    pub log_level: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "https://api.mainnet-beta.solana.com".to_string(),
            rpc_timeout_seconds: 30,
            commitment: "confirmed".to_string(),
            skip_preflight: false,
            onboarding_api_url: "https://onboarding.dewi.org/api/v3".to_string(),
            onboarding_retry_attempts: 10,
            onboarding_requests_per_second: 10,
            price_feed_url: "https://hermes.pyth.network".to_string(),
            hnt_price_feed_id: HNT_PRICE_FEED_ID.to_string(),
            record_cache_capacity: 1_000,
            confirm_timeout_seconds: 60,
            confirm_poll_interval_ms: 500,
            log_level: "info".to_string(),
        }
    }
}

impl OnboardingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OnboardingError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| OnboardingError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig> {
        let commitment = CommitmentLevel::from_str(&self.commitment).map_err(|_| {
            OnboardingError::Config(format!("unknown commitment level {}", self.commitment))
        })?;
        Ok(CommitmentConfig { commitment })
    }

    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_seconds)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_seconds)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }
}
