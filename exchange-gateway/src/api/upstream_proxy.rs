use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Request, Response, StatusCode},
    response::IntoResponse,
};
use http::header::{HeaderName, CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use reqwest::header::HeaderValue;
use std::error::Error as StdError;

use crate::state::AppState;

/// Headers describing a single connection; reqwest and hyper set their own
const HOP_BY_HOP_HEADERS: [HeaderName; 4] = [CONNECTION, CONTENT_LENGTH, HOST, TRANSFER_ENCODING];

/// Forward requests to the downstream service
pub(super) async fn forward_to_upstream(
    State(state): State<AppState>,
    req: Request<Body>,
) -> impl IntoResponse {
    // Get the path for forwarding
    let path = match req.uri().path_and_query() {
        Some(path) => path.to_string(),
        None => "".to_string(),
    };

    let url = state.config.upstream.get_url(path);
    log::debug!("Forwarding request to upstream: {} {}", req.method(), url);
    let mut req_builder = state.upstream_client.request(req.method().clone(), &url);

    // Forward headers
    for (key, value) in req.headers() {
        if HOP_BY_HOP_HEADERS.contains(key) {
            continue;
        }
        if let Ok(header_value) = HeaderValue::from_bytes(value.as_bytes()) {
            req_builder = req_builder.header(key.as_str(), header_value);
        }
    }

    // Forward body if present
    let body_bytes = match to_bytes(req.into_body(), usize::MAX).await {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::BAD_GATEWAY, "Failed to read request body").into_response(),
    };

    if !body_bytes.is_empty() {
        req_builder = req_builder.body(body_bytes);
    }

    match req_builder.send().await {
        Ok(response) => {
            // Get response details
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::error!("Failed to read upstream response body: {}", e);
                    return (StatusCode::BAD_GATEWAY, "Failed to read response body")
                        .into_response();
                }
            };

            // Build response
            let mut resp = Response::new(Body::from(bytes));
            *resp.status_mut() = status;

            // Forward response headers
            for (key, value) in headers.iter() {
                if !HOP_BY_HOP_HEADERS.contains(key) {
                    resp.headers_mut().append(key.clone(), value.clone());
                }
            }

            resp
        }
        Err(e) => {
            log::error!(
                "Failed to send request to upstream: {} ({:?})\nURL: {}\nSource error: {:?}",
                e,
                e.status(),
                url,
                e.source()
            );

            let error_message = if e.is_timeout() {
                "Request timed out while connecting to upstream server".to_string()
            } else if e.is_connect() {
                "Connection error occurred while connecting to upstream server".to_string()
            } else {
                format!("Failed to send request: {}", e)
            };

            (StatusCode::BAD_GATEWAY, error_message).into_response()
        }
    }
}
