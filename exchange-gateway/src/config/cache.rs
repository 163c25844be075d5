use confique::Config;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use thiserror::Error;

/// Specifies which token cache implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStore {
    #[default]
    InMemory,
    None,
}

#[derive(Debug, Error)]
#[error("Unknown cache store '{0}', expected 'in-memory' or 'none'")]
pub struct UnknownCacheStore(String);

impl FromStr for CacheStore {
    type Err = UnknownCacheStore;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in-memory" => Ok(CacheStore::InMemory),
            "none" => Ok(CacheStore::None),
            other => Err(UnknownCacheStore(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for CacheStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration for the exchanged token cache
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Cache store type: "in-memory" (default) or "none"
    #[config(env = "GATEWAY_CACHE_STORE", default = "in-memory")]
    pub store: CacheStore,

    /// Time to live of an exchanged token in seconds, counted from insertion (default: 5 minutes)
    #[config(env = "GATEWAY_CACHE_TTL", default = 300)]
    pub ttl: u64,

    /// Maximum number of cached tokens (default: 10000)
    #[config(env = "GATEWAY_CACHE_CAPACITY", default = 10000)]
    pub capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: CacheStore::InMemory,
            ttl: 300,
            capacity: 10_000,
        }
    }
}
