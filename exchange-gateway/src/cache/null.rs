use super::{CacheKey, TokenStore};
use async_trait::async_trait;

/// NullTokenCache is a token cache that does nothing.
/// It is used when caching of exchanged tokens is disabled.
#[derive(Clone, Debug)]
pub struct NullTokenCache;

impl NullTokenCache {
    /// Create a new NullTokenCache instance
    pub fn new() -> Self {
        NullTokenCache
    }
}

impl Default for NullTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for NullTokenCache {
    async fn get(&self, _key: &CacheKey) -> Option<String> {
        // Always a miss
        None
    }

    async fn put(&self, _key: CacheKey, _token: String) {}

    async fn entry_count(&self) -> u64 {
        0
    }
}
