//! Token exchange configuration

use confique::Config;
use std::fmt;

/// Settings for the RFC 8693 token exchange performed on admitted requests
#[derive(Config, Clone)]
pub struct ExchangeConfig {
    /// Token endpoint of the authorization server
    #[config(env = "GATEWAY_EXCHANGE_TOKEN_ENDPOINT")]
    pub token_endpoint: String,

    /// Client id used to authenticate the exchange request
    #[config(env = "GATEWAY_EXCHANGE_CLIENT_ID")]
    pub client_id: String,

    /// Client secret used to authenticate the exchange request
    #[config(env = "GATEWAY_EXCHANGE_CLIENT_SECRET")]
    pub client_secret: String,

    /// Prefix the `azp` claim of the incoming token must start with
    #[config(env = "GATEWAY_EXCHANGE_AUTHORIZED_PARTY_PREFIX")]
    pub authorized_party_prefix: String,

    /// Audience the incoming token must carry (optional)
    #[config(env = "GATEWAY_EXCHANGE_REQUIRED_AUDIENCE")]
    pub required_audience: Option<String>,

    /// Audience the incoming token must not carry (optional)
    #[config(env = "GATEWAY_EXCHANGE_FORBIDDEN_AUDIENCE")]
    pub forbidden_audience: Option<String>,

    /// Scope the incoming token must not carry (optional)
    #[config(env = "GATEWAY_EXCHANGE_FORBIDDEN_SCOPE")]
    pub forbidden_scope: Option<String>,

    /// Scope requested for the exchanged token
    #[config(env = "GATEWAY_EXCHANGE_TARGET_SCOPE")]
    pub target_scope: String,

    /// Timeout for token endpoint requests in seconds (default: 10)
    #[config(env = "GATEWAY_EXCHANGE_TIMEOUT", default = 10)]
    pub timeout: u64,
}

impl ExchangeConfig {
    /// Required audience, ignoring blank values
    pub fn required_audience(&self) -> Option<&str> {
        non_blank(&self.required_audience)
    }

    /// Forbidden audience, ignoring blank values
    pub fn forbidden_audience(&self) -> Option<&str> {
        non_blank(&self.forbidden_audience)
    }

    /// Forbidden scope, ignoring blank values
    pub fn forbidden_scope(&self) -> Option<&str> {
        non_blank(&self.forbidden_scope)
    }

    #[cfg(test)]
    pub fn for_test(token_endpoint: impl Into<String>) -> Self {
        Self {
            token_endpoint: token_endpoint.into(),
            client_id: "gateway-exchange".to_string(),
            client_secret: "s3cr&t".to_string(),
            authorized_party_prefix: "coffee-".to_string(),
            required_audience: None,
            forbidden_audience: None,
            forbidden_scope: None,
            target_scope: "order:write".to_string(),
            timeout: 5,
        }
    }
}

impl fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authorized_party_prefix", &self.authorized_party_prefix)
            .field("required_audience", &self.required_audience)
            .field("forbidden_audience", &self.forbidden_audience)
            .field("forbidden_scope", &self.forbidden_scope)
            .field("target_scope", &self.target_scope)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
