use crate::api::OnboardingApi;
use crate::error::Result;
use crate::types::OnboardingRecord;
use moka::future::Cache;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read-through cache of onboarding records keyed by hotspot address.
///
/// Entries are never invalidated. A rate-limited lookup is not cached, so the
/// next call tries again.
#[derive(Clone)]
pub struct OnboardingRecordStore {
    cache: Cache<String, Arc<OnboardingRecord>>,
}

impl OnboardingRecordStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub async fn get(&self, address: &str) -> Option<Arc<OnboardingRecord>> {
        self.cache.get(address).await
    }

    pub async fn insert(&self, address: &str, record: OnboardingRecord) -> Arc<OnboardingRecord> {
        let record = Arc::new(record);
        self.cache.insert(address.to_string(), record.clone()).await;
        record
    }

    #[instrument(skip(self, api))]
    pub async fn get_or_fetch(
        &self,
        address: &str,
        api: &dyn OnboardingApi,
    ) -> Result<Option<Arc<OnboardingRecord>>> {
        if let Some(record) = self.get(address).await {
            debug!("Onboarding record cache hit");
            return Ok(Some(record));
        }

        match api.onboarding_record(address).await? {
            Some(record) => Ok(Some(self.insert(address, record).await)),
            None => Ok(None),
        }
    }
}

impl Default for OnboardingRecordStore {
    fn default() -> Self {
        Self::new(1_000)
    }
}
