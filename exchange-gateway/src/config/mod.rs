pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
pub(crate) use crate::config::exchange::ExchangeConfig;
pub(crate) use crate::config::upstream::UpstreamConfig;
use confique::Config;
use thiserror::Error;
use url::Url;

pub mod cache;
pub mod exchange;
pub mod upstream;

/// Errors raised while loading or validating the gateway configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] confique::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main configuration structure for the token exchange gateway
#[derive(Debug, Config, Clone)]
pub struct GatewayConfig {
    /// The port the gateway will listen to (default: 8080)
    #[config(env = "GATEWAY_PORT", default = 8080)]
    pub port: u16,

    /// Downstream service configuration
    #[config(nested)]
    pub upstream: UpstreamConfig,

    /// Token exchange configuration
    #[config(nested)]
    pub exchange: ExchangeConfig,

    /// Exchanged token cache configuration
    #[config(nested)]
    pub cache: CacheConfig,
}

impl GatewayConfig {
    /// Creates a new configuration from environment variables
    pub fn new() -> Result<Self, ConfigError> {
        let config = Self::builder().env().load()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values confique cannot express as types
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("exchange.token_endpoint", &self.exchange.token_endpoint)?;
        validate_http_url("upstream.url", &self.upstream.url)?;

        if self.exchange.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "exchange.client_id",
                reason: "must not be blank".to_string(),
            });
        }
        if self.exchange.target_scope.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "exchange.target_scope",
                reason: "must not be blank".to_string(),
            });
        }
        if self.cache.ttl == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.ttl",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(
        token_endpoint_mock: &wiremock::MockServer,
        upstream_mock: &wiremock::MockServer,
    ) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            upstream: UpstreamConfig {
                url: upstream_mock.uri(),
                timeout: 5,
            },
            exchange: ExchangeConfig::for_test(format!(
                "{}/realms/coffeehouse/protocol/openid-connect/token",
                token_endpoint_mock.uri()
            )),
            cache: CacheConfig {
                ttl: 60,
                store: CacheStore::InMemory,
                capacity: 128,
            },
        }
    }
}

fn validate_http_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::Invalid {
            field,
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}
