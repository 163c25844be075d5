use crate::{
    cache::TokenCache,
    config::GatewayConfig,
    exchange::ExchangeClient,
    policy::{Policy, TokenExchangePolicy},
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub policy: Arc<dyn Policy>,
    pub upstream_client: Arc<Client>,
}

impl AppState {
    fn create_exchange_client(timeout: u64) -> reqwest::Result<Client> {
        // Create a specialized client for the token endpoint
        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(2))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
    }

    fn create_upstream_client(timeout: u64) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(2))
            // Redirects are relayed to the caller, not followed
            .redirect(reqwest::redirect::Policy::none())
            .build()
    }

    /// Builds the application state around an already created token cache
    pub fn with_existing_cache(config: &GatewayConfig, cache: TokenCache) -> reqwest::Result<Self> {
        let exchange_config = Arc::new(config.exchange.clone());
        let exchange_client = ExchangeClient::new(
            AppState::create_exchange_client(exchange_config.timeout)?,
            exchange_config.clone(),
        );
        let policy = TokenExchangePolicy::new(exchange_config, cache, exchange_client);

        Ok(Self {
            config: Arc::new(config.clone()),
            policy: Arc::new(policy),
            upstream_client: Arc::new(AppState::create_upstream_client(config.upstream.timeout)?),
        })
    }
}
