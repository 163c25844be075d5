use crate::config::{CacheConfig, CacheStore};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod memory;
pub mod null;

/// Errors that can occur while creating a token cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Fixed-width key identifying an exchanged token.
///
/// Derived from the raw incoming token and the target scope, so the raw
/// token itself never ends up in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(incoming_token: &str, target_scope: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(incoming_token.as_bytes());
        hasher.update(b"|");
        hasher.update(target_scope.as_bytes());
        Self(hasher.finalize().into())
    }
}

/// Interface shared by all exchanged-token stores.
///
/// Implementations must be safe to share between concurrently running
/// request handlers.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Retrieve an exchanged token that has not yet expired
    async fn get(&self, key: &CacheKey) -> Option<String>;

    /// Store an exchanged token; it expires a fixed TTL after this call
    async fn put(&self, key: CacheKey, token: String);

    /// Number of live entries after pending evictions have been applied
    async fn entry_count(&self) -> u64;
}

/// Exchanged token cache, selected at startup from the configuration.
#[derive(Clone)]
pub enum TokenCache {
    /// In-memory cache implementation using Moka
    InMemory(memory::InMemoryTokenCache),
    /// No-op cache, every admitted request performs an exchange
    Null(null::NullTokenCache),
}

impl TokenCache {
    /// Look up the token previously exchanged for `(incoming_token, target_scope)`
    pub async fn lookup(&self, incoming_token: &str, target_scope: &str) -> Option<String> {
        self.get(&CacheKey::new(incoming_token, target_scope)).await
    }

    /// Remember the token exchanged for `(incoming_token, target_scope)`
    pub async fn store(&self, incoming_token: &str, target_scope: &str, exchanged_token: String) {
        self.put(CacheKey::new(incoming_token, target_scope), exchanged_token)
            .await
    }
}

#[async_trait::async_trait]
impl TokenStore for TokenCache {
    async fn get(&self, key: &CacheKey) -> Option<String> {
        match self {
            Self::InMemory(cache) => cache.get(key).await,
            Self::Null(cache) => cache.get(key).await,
        }
    }

    async fn put(&self, key: CacheKey, token: String) {
        match self {
            Self::InMemory(cache) => cache.put(key, token).await,
            Self::Null(cache) => cache.put(key, token).await,
        }
    }

    async fn entry_count(&self) -> u64 {
        match self {
            Self::InMemory(cache) => cache.entry_count().await,
            Self::Null(cache) => cache.entry_count().await,
        }
    }
}

/// Creates the token cache selected by the configuration
pub fn create_cache(config: &CacheConfig) -> Result<TokenCache, CacheError> {
    match config.store {
        CacheStore::InMemory => {
            let cache = memory::InMemoryTokenCache::new(config.ttl, config.capacity)
                .map_err(CacheError::Config)?;
            Ok(TokenCache::InMemory(cache))
        }
        CacheStore::None => Ok(TokenCache::Null(null::NullTokenCache::new())),
    }
}
