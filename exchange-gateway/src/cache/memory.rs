use super::{CacheKey, TokenStore};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use std::time::Duration;

/// Concurrent in-memory token cache.
///
/// Entries expire a fixed TTL after insertion; reads do not extend their
/// lifetime. Once `capacity` entries are held, Moka evicts to stay within it.
#[derive(Clone)]
pub struct InMemoryTokenCache {
    cache: MokaCache<CacheKey, String>,
}

impl InMemoryTokenCache {
    /// Initialize a new in-memory cache instance
    pub fn new(ttl_secs: u64, capacity: u64) -> Result<Self, String> {
        if ttl_secs == 0 {
            return Err("Cache TTL must be greater than zero".to_string());
        }
        if capacity == 0 {
            return Err("Cache capacity must be greater than zero".to_string());
        }
        Ok(Self::with_ttl(Duration::from_secs(ttl_secs), capacity))
    }

    fn with_ttl(ttl: Duration, capacity: u64) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenCache {
    async fn get(&self, key: &CacheKey) -> Option<String> {
        self.cache.get(key).await
    }

    async fn put(&self, key: CacheKey, token: String) {
        self.cache.insert(key, token).await;
    }

    async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}
