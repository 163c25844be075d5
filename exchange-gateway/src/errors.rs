use crate::policy::PolicyError;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub detail: String,
    pub key: Option<String>,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            detail: detail.to_string(),
            key: None,
            status_code,
        }
    }

    /// Create new Internal Server Error (500) with a detail message
    pub fn internal<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Bad Gateway (502) with a detail message
    pub fn bad_gateway<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_GATEWAY)
    }

    /// Attach a machine-readable failure key
    pub fn with_key<S: ToString>(mut self, key: S) -> Self {
        self.key = Some(key.to_string());
        self
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        let key = err.key();
        let error = match err {
            PolicyError::Transport(_) | PolicyError::Protocol(_) => ApiError::bad_gateway(&err),
            PolicyError::UnsuccessfulResponse(_) => ApiError::internal(&err),
        };
        match key {
            Some(key) => error.with_key(key),
            None => error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = match self.key {
            Some(key) => json!({
                "detail": self.detail,
                "key": key,
            }),
            None => json!({
                "detail": self.detail,
            }),
        };
        (status_code, Json(body)).into_response()
    }
}
