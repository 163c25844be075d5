//! Token exchange policy.
//!
//! The host pipeline drives a [`Policy`] through two hooks: `on_request`
//! before the request is forwarded and `on_response` once the downstream
//! status is known. [`TokenExchangePolicy`] decides per request whether to
//! pass it through untouched, reuse a cached exchanged token, or exchange the
//! incoming token at the authorization server.

use crate::admission::{self, SkipReason};
use crate::cache::{TokenCache, TokenStore};
use crate::claims::IncomingTokenContext;
use crate::config::ExchangeConfig;
use crate::exchange::{ExchangeClient, ExchangeError};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue, StatusCode};
use log::{debug, error, log_enabled, warn, Level};
use std::sync::Arc;
use thiserror::Error;

/// Failure key for an exchange that could not reach the token endpoint
pub const TOKEN_EXCHANGE_ERROR: &str = "TOKEN_EXCHANGE_ERROR";
/// Failure key for an exchange that returned no usable token
pub const TOKEN_EXCHANGE_EXIT_ON_ERROR: &str = "TOKEN_EXCHANGE_EXIT_ON_ERROR";

/// Failures that terminate a request
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("{0}")]
    Transport(String),
    #[error("Request is terminated.")]
    Protocol(String),
    #[error("Not a successful response")]
    UnsuccessfulResponse(StatusCode),
}

impl PolicyError {
    /// Failure key reported to the caller, if any
    pub fn key(&self) -> Option<&'static str> {
        match self {
            PolicyError::Transport(_) => Some(TOKEN_EXCHANGE_ERROR),
            PolicyError::Protocol(_) => Some(TOKEN_EXCHANGE_EXIT_ON_ERROR),
            PolicyError::UnsuccessfulResponse(_) => None,
        }
    }
}

/// Result of the request phase
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// Not eligible for exchange; the request continues unmodified
    PassThrough(SkipReason),
    /// A previously exchanged token was found in the cache
    CachedToken(String),
    /// The token endpoint issued a new token
    ExchangedToken(String),
    /// The token endpoint could not be reached
    TransportFailure(String),
    /// The token endpoint answered without a usable token
    ProtocolFailure(String),
}

/// Hooks invoked by the host pipeline around each forwarded request
#[async_trait::async_trait]
pub trait Policy: Send + Sync {
    /// Runs before the request is forwarded and may rewrite its headers
    async fn on_request(
        &self,
        context: Option<&IncomingTokenContext>,
        headers: &mut HeaderMap,
    ) -> Result<(), PolicyError>;

    /// Runs once the downstream response status is known
    fn on_response(&self, status: StatusCode) -> Result<(), PolicyError>;
}

/// Exchanges incoming tokens for tokens carrying the configured target scope
pub struct TokenExchangePolicy {
    config: Arc<ExchangeConfig>,
    cache: TokenCache,
    client: ExchangeClient,
}

impl TokenExchangePolicy {
    pub fn new(config: Arc<ExchangeConfig>, cache: TokenCache, client: ExchangeClient) -> Self {
        Self {
            config,
            cache,
            client,
        }
    }

    /// Decides how the request proceeds.
    ///
    /// The cache is written only after the token endpoint returned a valid
    /// token. Concurrent misses for the same token are not coalesced; each
    /// performs its own exchange.
    pub async fn evaluate(&self, context: Option<&IncomingTokenContext>) -> ExchangeOutcome {
        let context = match admission::admit(&self.config, context) {
            Ok(context) => context,
            Err(reason) => {
                match reason {
                    SkipReason::MissingAuthorizedParty => warn!("{}", reason),
                    _ => debug!("{}", reason),
                }
                return ExchangeOutcome::PassThrough(reason);
            }
        };

        let target_scope = &self.config.target_scope;
        if let Some(token) = self.cache.lookup(context.token(), target_scope).await {
            debug!(
                "Cached token found for incoming Bearer token and target scope '{}'",
                target_scope
            );
            return ExchangeOutcome::CachedToken(token);
        }

        debug!(
            "No cached token for target scope '{}', exchanging incoming Bearer token",
            target_scope
        );
        match self.client.exchange(context.token(), target_scope).await {
            Ok(token) => {
                self.cache
                    .store(context.token(), target_scope, token.clone())
                    .await;
                if log_enabled!(Level::Debug) {
                    debug!(
                        "Exchanged token cached, {} entries in cache",
                        self.cache.entry_count().await
                    );
                }
                ExchangeOutcome::ExchangedToken(token)
            }
            Err(ExchangeError::Transport(cause)) => {
                error!("Token exchange failed: {}", cause);
                ExchangeOutcome::TransportFailure(cause)
            }
            Err(ExchangeError::Protocol(reason)) => {
                error!("Token exchange returned no usable token: {}", reason);
                ExchangeOutcome::ProtocolFailure(reason)
            }
        }
    }
}

#[async_trait::async_trait]
impl Policy for TokenExchangePolicy {
    async fn on_request(
        &self,
        context: Option<&IncomingTokenContext>,
        headers: &mut HeaderMap,
    ) -> Result<(), PolicyError> {
        let token = match self.evaluate(context).await {
            ExchangeOutcome::PassThrough(_) => return Ok(()),
            ExchangeOutcome::CachedToken(token) | ExchangeOutcome::ExchangedToken(token) => token,
            ExchangeOutcome::TransportFailure(cause) => return Err(PolicyError::Transport(cause)),
            ExchangeOutcome::ProtocolFailure(reason) => return Err(PolicyError::Protocol(reason)),
        };

        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| PolicyError::Protocol(format!("invalid exchanged token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Rejects every response outside 1xx-3xx, whether or not the request
    /// was exchanged.
    fn on_response(&self, status: StatusCode) -> Result<(), PolicyError> {
        if (100..=399).contains(&status.as_u16()) {
            Ok(())
        } else {
            warn!("Downstream answered with status {}", status);
            Err(PolicyError::UnsuccessfulResponse(status))
        }
    }
}
