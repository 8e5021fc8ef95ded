use crate::api::{PriceFeed, PriceQuote};
use crate::currency::{Balance, Currency, Usd};
use crate::error::{OnboardingError, Result};
use std::sync::Arc;
use tracing::{info, instrument};

/// Scale a raw quote into USD base units. Non-positive prices are no price.
pub fn scale_price(quote: PriceQuote) -> Option<Balance<Usd>> {
    if quote.price <= 0 {
        return None;
    }
    let price = quote.price as i128;
    let shift = quote.expo + Usd::DECIMALS as i32;
    let scaled = if shift >= 0 {
        price.checked_mul(10i128.checked_pow(shift as u32)?)?
    } else {
        price / 10i128.checked_pow(shift.unsigned_abs())?
    };
    u64::try_from(scaled).ok().filter(|p| *p > 0).map(Balance::new)
}

/// HNT/USD price used for every DC conversion in a fee computation.
#[derive(Clone)]
pub struct PriceOracle {
    feed: Arc<dyn PriceFeed>,
    feed_id: String,
}

impl PriceOracle {
    pub fn new(feed: Arc<dyn PriceFeed>, feed_id: impl Into<String>) -> Self {
        Self {
            feed,
            feed_id: feed_id.into(),
        }
    }

    /// Fails with [`OnboardingError::MissingOraclePrice`] rather than return a
    /// zero or unusable price.
    #[instrument(skip(self))]
    pub async fn get_oracle_price(&self) -> Result<Balance<Usd>> {
        let quote = self
            .feed
            .latest_price(&self.feed_id)
            .await?
            .ok_or(OnboardingError::MissingOraclePrice)?;
        let price = scale_price(quote).ok_or(OnboardingError::MissingOraclePrice)?;
        info!(price = %price, "Using HNT oracle price");
        Ok(price)
    }
}
