//! Pre-validated facts about the incoming bearer token.
//!
//! Signatures are checked before a request reaches the gateway; this module
//! only reads the claims the exchange decision depends on.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur while reading claims from a bearer token
#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Token is not a JWT: expected three segments")]
    NotAJwt,
    #[error("Failed to decode token payload: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Failed to parse token claims: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A claim that may be encoded as a single string or as a list of strings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StringOrList {
    Single(String),
    List(Vec<String>),
}

/// The subset of token claims relevant for token exchange
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Authorized party the token was issued for
    #[serde(default)]
    pub azp: Option<String>,
    /// Audience(s) of the token
    #[serde(default)]
    pub aud: Option<StringOrList>,
    /// Scope(s) of the token, usually space-delimited
    #[serde(default)]
    pub scope: Option<StringOrList>,
}

impl TokenClaims {
    /// Reads the claims from the payload segment of a JWT without verifying it
    pub fn from_unverified_jwt(token: &str) -> Result<Self, ClaimsError> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(ClaimsError::NotAJwt),
        };
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Per-request, read-only view of the incoming token.
///
/// Built once by the authentication layer and discarded after the request.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingTokenContext {
    token: String,
    authorized_party: Option<String>,
    audiences: HashSet<String>,
    scopes: HashSet<String>,
}

impl IncomingTokenContext {
    pub fn new(token: impl Into<String>, claims: TokenClaims) -> Self {
        let audiences = match claims.aud {
            Some(StringOrList::Single(aud)) => HashSet::from([aud]),
            Some(StringOrList::List(auds)) => auds.into_iter().collect(),
            None => HashSet::new(),
        };
        let scopes = match claims.scope {
            Some(StringOrList::Single(scope)) => split_scopes(&scope),
            Some(StringOrList::List(scopes)) => scopes.iter().flat_map(|s| split_scopes(s)).collect(),
            None => HashSet::new(),
        };

        Self {
            token: token.into(),
            authorized_party: claims.azp,
            audiences,
            scopes,
        }
    }

    /// The raw bearer token as received
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The `azp` claim, if present
    pub fn authorized_party(&self) -> Option<&str> {
        self.authorized_party.as_deref()
    }

    pub fn has_audience(&self, audience: &str) -> bool {
        self.audiences.contains(audience)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}

fn split_scopes(scope: &str) -> HashSet<String> {
    scope
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_jwt(claims: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn test_scope_string_is_split_on_spaces() {
        let claims = TokenClaims {
            scope: Some(StringOrList::Single("profile  email coffee-order".to_string())),
            ..Default::default()
        };
        let context = IncomingTokenContext::new("token", claims);
        assert!(context.has_scope("profile"));
        assert!(context.has_scope("email"));
        assert!(context.has_scope("coffee-order"));
        assert!(!context.has_scope(""));
        assert!(!context.has_scope("profile email"));
    }

    #[test]
    fn test_scope_list_is_normalized() {
        let claims = TokenClaims {
            scope: Some(StringOrList::List(vec![
                "profile".to_string(),
                "email coffee-order".to_string(),
            ])),
            ..Default::default()
        };
        let context = IncomingTokenContext::new("token", claims);
        assert!(context.has_scope("profile"));
        assert!(context.has_scope("email"));
        assert!(context.has_scope("coffee-order"));
    }

    #[test]
    fn test_audience_string_and_list() {
        let single = IncomingTokenContext::new(
            "token",
            TokenClaims {
                aud: Some(StringOrList::Single("api-gateway".to_string())),
                ..Default::default()
            },
        );
        assert!(single.has_audience("api-gateway"));

        let list = IncomingTokenContext::new(
            "token",
            TokenClaims {
                aud: Some(StringOrList::List(vec![
                    "api-gateway".to_string(),
                    "coffee-order-api".to_string(),
                ])),
                ..Default::default()
            },
        );
        assert!(list.has_audience("api-gateway"));
        assert!(list.has_audience("coffee-order-api"));
        assert!(!list.has_audience("coffee-menu-api"));
    }

    #[test]
    fn test_from_unverified_jwt() {
        let token = encode_jwt(json!({
            "azp": "coffee-app-42",
            "aud": ["api-gateway"],
            "scope": "profile email",
            "sub": "alice"
        }));
        let claims = TokenClaims::from_unverified_jwt(&token).unwrap();
        assert_eq!(claims.azp.as_deref(), Some("coffee-app-42"));
        assert_eq!(
            claims.aud,
            Some(StringOrList::List(vec!["api-gateway".to_string()]))
        );
        assert_eq!(
            claims.scope,
            Some(StringOrList::Single("profile email".to_string()))
        );
    }

    #[test]
    fn test_from_unverified_jwt_without_claims() {
        let token = encode_jwt(json!({ "sub": "alice" }));
        let claims = TokenClaims::from_unverified_jwt(&token).unwrap();
        assert_eq!(claims, TokenClaims::default());
    }

    #[test]
    fn test_from_unverified_jwt_rejects_garbage() {
        assert!(matches!(
            TokenClaims::from_unverified_jwt("opaque-token"),
            Err(ClaimsError::NotAJwt)
        ));
        assert!(matches!(
            TokenClaims::from_unverified_jwt("a.b.c.d"),
            Err(ClaimsError::NotAJwt)
        ));
        assert!(matches!(
            TokenClaims::from_unverified_jwt("a.!!!.c"),
            Err(ClaimsError::Decode(_))
        ));
        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"));
        assert!(matches!(
            TokenClaims::from_unverified_jwt(&not_json),
            Err(ClaimsError::Parse(_))
        ));
    }
}
