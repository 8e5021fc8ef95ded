//! hotspot-onboarding - fee and transaction orchestration for onboarding
//! Helium hotspots and asserting their location on Solana.
//!
//! Given a hotspot and the networks to assert it on, the crate works out
//! what the owner and maker will pay, whether the owner can afford it, and
//! the ordered transactions to sign, including a burn-HNT-for-DC top-up when
//! one is needed.

pub mod api;
pub mod chain;
pub mod config;
pub mod currency;
pub mod error;
pub mod onboarding;
pub mod types;

// Re-export main types for convenience
pub use config::OnboardingConfig;
pub use error::{OnboardingError, Result};
pub use onboarding::{AssertData, AssertRequest, OnboardingBuilder, OnboardingService};
pub use types::{NetworkDetail, NetworkType, OnboardingRecord};
