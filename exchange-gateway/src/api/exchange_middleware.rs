use crate::claims::IncomingTokenContext;
use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Runs the exchange policy around the forwarded request.
///
/// `on_request` may replace the Authorization header or terminate the
/// request; `on_response` vets the downstream status of every request,
/// exchanged or not.
pub(super) async fn token_exchange_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // The context is discarded once the policy has seen it
    let context = request.extensions_mut().remove::<IncomingTokenContext>();

    if let Err(e) = state
        .policy
        .on_request(context.as_ref(), request.headers_mut())
        .await
    {
        return ApiError::from(e).into_response();
    }

    let response = next.run(request).await;

    match state.policy.on_response(response.status()) {
        Ok(()) => response,
        Err(e) => ApiError::from(e).into_response(),
    }
}
