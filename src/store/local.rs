use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use moka::Expiry;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use crate::error::StoreError;
use crate::traits::CacheStore;

pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Clone, Debug)]
struct StoredValue {
    data: Arc<Vec<u8>>,
    ttl:  Duration,
}

// Every value carries its own TTL; overwriting a key restarts the clock.
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &StoredValue, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process key-value store over a [moka](https://crates.io/crates/moka) cache.
///
/// Suitable for a single instance or as a stand-in for a remote store in tests. Expiry is handled by moka; the
/// capacity bound only protects memory, correctness never depends on it.
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<String, StoredValue>,
}

impl MokaStore {
    pub fn new(max_capacity: u64) -> Self {
        Self::with_name("contact-cache", max_capacity)
    }

    pub fn with_name(name: &str, max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .name(name)
                .max_capacity(max_capacity)
                .eviction_policy(EvictionPolicy::tiny_lfu())
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Number of live entries after pending maintenance has been applied.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

impl Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("name", &self.cache.name())
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.cache.get(key).await.map(|v| v.data.as_ref().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        self.cache
            .insert(
                key.to_string(),
                StoredValue {
                    data: Arc::new(value),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}
