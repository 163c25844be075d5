mod authn_middleware;
mod exchange_middleware;
mod upstream_proxy;

use crate::api::authn_middleware::authentication_middleware;
use crate::api::exchange_middleware::token_exchange_middleware;
use crate::api::upstream_proxy::forward_to_upstream;
use crate::state::AppState;
use axum::{middleware, Router};

/// Every request is proxied to the downstream service through the exchange policy
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .fallback(forward_to_upstream)
        // Layers run outermost-last: authentication builds the token context
        // before the exchange middleware consumes it.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            token_exchange_middleware,
        ))
        .layer(middleware::from_fn(authentication_middleware))
}
