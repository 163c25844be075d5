//! Client for the OAuth 2.0 Token Exchange endpoint (RFC 8693)

pub mod models;

use crate::config::ExchangeConfig;
use http::header::CONTENT_TYPE;
use log::{debug, warn};
use models::{parse_access_token, TokenExchangeForm};
use reqwest::Client;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while exchanging a token
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The token endpoint could not be reached or the response could not be read
    #[error("Token endpoint request failed: {0}")]
    Transport(String),
    /// The token endpoint answered, but not with a usable access token
    #[error("Invalid token endpoint response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connection failed"
        } else {
            "transport error"
        };
        ExchangeError::Transport(format!("{}: {}", kind, error_chain(&err)))
    }
}

/// Joins an error with all of its sources, e.g. "error sending request: connection refused"
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Token exchange client
#[derive(Clone)]
pub struct ExchangeClient {
    client: Client,
    config: Arc<ExchangeConfig>,
}

impl ExchangeClient {
    /// Create a new exchange client
    pub fn new(client: Client, config: Arc<ExchangeConfig>) -> Self {
        Self { client, config }
    }

    /// Exchanges `subject_token` for a new access token carrying `scope`.
    ///
    /// Exactly one request is sent; nothing is retried. The response, and with
    /// it the connection, is released on every return path and when the
    /// returned future is dropped before completion.
    pub async fn exchange(&self, subject_token: &str, scope: &str) -> Result<String, ExchangeError> {
        let body = TokenExchangeForm {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            subject_token,
            scope,
        }
        .encode();

        debug!(
            "Requesting token exchange for scope '{}' at {}",
            scope, self.config.token_endpoint
        );

        let response = self
            .client
            .post(&self.config.token_endpoint)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        parse_access_token(&body).inspect_err(|e| {
            warn!("Token endpoint answered with status {}: {}", status, e);
        })
    }
}
