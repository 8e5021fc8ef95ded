//! Error taxonomy for the onboarding pipeline.
//!
//! Precondition errors fail fast, upstream-data-absent errors abort the current
//! call, and simulation failures are split into the recoverable "would fail"
//! class and everything else.

use thiserror::Error;

/// Errors produced while computing fees or building onboarding transactions.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("unsupported hotspot type: {0}")]
    UnsupportedHotspotType(String),

    #[error("no networks requested")]
    NoNetworksRequested,

    #[error("onboarding record not found for hotspot {0}")]
    MissingOnboardingRecord(String),

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid location ({lat}, {lng}): {reason}")]
    InvalidLocation { lat: f64, lng: f64, reason: String },

    #[error("no oracle price available")]
    MissingOraclePrice,

    #[error("no simulation result for transaction {0}")]
    MissingSimulationResult(usize),

    /// The transaction failed its pre-flight simulation. Triggers the
    /// deterministic fee fallback.
    #[error("Transaction would fail: {0}")]
    SimulationWouldFail(String),

    #[error("simulation failed: {0}")]
    Simulation(String),

    /// The onboarding server rejected one entry of a batch.
    #[error("{0}")]
    Rejected(String),

    #[error("onboarding api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("onboarding api rate limited the request")]
    RateLimited,

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to decode account {account}: {reason}")]
    AccountDecode { account: String, reason: String },

    #[error("transaction {signature} failed: {reason}")]
    TransactionFailed { signature: String, reason: String },

    #[error("confirmation timed out for {0}")]
    ConfirmationTimeout(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] Box<solana_client::client_error::ClientError>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transaction encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("signing error: {0}")]
    Signing(String),
}

impl From<solana_client::client_error::ClientError> for OnboardingError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::Rpc(Box::new(err))
    }
}

impl OnboardingError {
    /// Whether this is the pre-flight "transaction would fail" class that the
    /// fee estimator is allowed to recover from.
    pub fn is_would_fail(&self) -> bool {
        matches!(self, OnboardingError::SimulationWouldFail(_))
    }

    /// Whether the upstream resource simply does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OnboardingError::NotFound(_))
            || matches!(self, OnboardingError::Api { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, OnboardingError>;
