use crate::claims::{IncomingTokenContext, TokenClaims};
use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use http::HeaderMap;
use log::{debug, warn};

/// Builds the [`IncomingTokenContext`] for the request from its bearer token.
///
/// The token's signature has already been verified in front of the gateway,
/// so the claims are only decoded here. Requests without a bearer token get
/// no context and are passed through by the exchange policy.
pub(super) async fn authentication_middleware(mut request: Request<Body>, next: Next) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        let claims = match TokenClaims::from_unverified_jwt(&token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Failed to read claims from Bearer token: {}", e);
                TokenClaims::default()
            }
        };
        request
            .extensions_mut()
            .insert(IncomingTokenContext::new(token, claims));
    } else {
        debug!("Request has no Bearer token");
    }

    next.run(request).await
}

/// Extracts the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(http::header::AUTHORIZATION)?;
    match header.to_str() {
        Ok(header_str) if header_str.len() > 7 && header_str[..7].eq_ignore_ascii_case("bearer ") => {
            Some(header_str[7..].trim().to_string())
        }
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to parse Authorization header to string: {}", e);
            None
        }
    }
}
