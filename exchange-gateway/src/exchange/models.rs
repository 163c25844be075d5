//! Wire format of the RFC 8693 token exchange request and response

use super::ExchangeError;
use http::HeaderValue;
use serde_json::Value;
use url::form_urlencoded;

/// Token exchange grant type (RFC 8693)
pub const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";

/// Token type identifier for OAuth 2.0 access tokens (RFC 8693)
pub const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";

/// Parameters of a token exchange request
#[derive(Debug, Clone, PartialEq)]
pub struct TokenExchangeForm<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub subject_token: &'a str,
    pub scope: &'a str,
}

impl TokenExchangeForm<'_> {
    /// Serializes the form as an `application/x-www-form-urlencoded` body
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", GRANT_TYPE_TOKEN_EXCHANGE)
            .append_pair("client_id", self.client_id)
            .append_pair("client_secret", self.client_secret)
            .append_pair("subject_token", self.subject_token)
            .append_pair("subject_token_type", TOKEN_TYPE_ACCESS_TOKEN)
            .append_pair("requested_token_type", TOKEN_TYPE_ACCESS_TOKEN)
            .append_pair("scope", self.scope)
            .finish()
    }
}

/// Extracts the issued access token from a token endpoint response body.
///
/// Only `access_token` decides the outcome; `error` and `error_description`
/// are read for the failure reason when they are strings.
pub fn parse_access_token(body: &[u8]) -> Result<String, ExchangeError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ExchangeError::Protocol(format!("response is not JSON: {e}")))?;
    let response = value.as_object().ok_or_else(|| {
        ExchangeError::Protocol("response is not a JSON object".to_string())
    })?;

    let token = match response.get("access_token").and_then(Value::as_str) {
        Some(token) if !token.trim().is_empty() => token.to_string(),
        _ => {
            let error = response.get("error").and_then(Value::as_str);
            let description = response.get("error_description").and_then(Value::as_str);
            let reason = match (error, description) {
                (Some(error), Some(description)) => {
                    format!("no access_token in response ({error}: {description})")
                }
                (Some(error), None) => format!("no access_token in response ({error})"),
                _ => "no access_token in response".to_string(),
            };
            return Err(ExchangeError::Protocol(reason));
        }
    };

    // The token ends up in an Authorization header
    if HeaderValue::from_str(&token).is_err() {
        return Err(ExchangeError::Protocol(
            "access_token contains characters not allowed in a header".to_string(),
        ));
    }

    Ok(token)
}
