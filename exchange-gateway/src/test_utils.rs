use crate::cache::create_cache;
use crate::config::GatewayConfig;
use crate::create_app;
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::matchers;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Path of the token endpoint on the token endpoint mock
pub const TOKEN_PATH: &str = "/realms/coffeehouse/protocol/openid-connect/token";

/// Builds an unsigned JWT carrying the given claims.
///
/// The gateway never verifies signatures, so a placeholder is enough.
pub fn encode_test_jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Test fixture for setting up a complete gateway with mocked collaborators.
///
/// The fixture starts one mock server standing in for the authorization
/// server's token endpoint and one standing in for the downstream service,
/// and routes the gateway to both.
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_forwarding() {
///     let fixture = TestFixture::new().await;
///     fixture
///         .mount_token_endpoint(json!({"access_token": "XYZ"}), 1)
///         .await;
///
///     Mock::given(matchers::path("/orders"))
///         .and(matchers::header("Authorization", "Bearer XYZ"))
///         .respond_with(ResponseTemplate::new(200))
///         .mount(&fixture.upstream_mock)
///         .await;
///
///     let response = fixture.get("/orders", Some(&token)).await;
///     response.assert_ok();
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Configuration
    pub config: GatewayConfig,
    /// Mock server for the token endpoint
    pub token_endpoint_mock: MockServer,
    /// Mock server for the downstream service
    pub upstream_mock: MockServer,
}

impl TestFixture {
    /// Creates a new test fixture with mock servers for the token endpoint and upstream.
    pub async fn new() -> Self {
        Self::setup_logger(LevelFilter::Debug);

        // Create mock servers
        let token_endpoint_mock = MockServer::start().await;
        let upstream_mock = MockServer::start().await;

        // Create config pointing at the mocks
        let config = GatewayConfig::for_test_with_mocks(&token_endpoint_mock, &upstream_mock);

        // Create app state
        let cache = create_cache(&config.cache).expect("Failed to create cache");
        let state =
            AppState::with_existing_cache(&config, cache).expect("Failed to create app state");
        let app = create_app(state);

        Self {
            app,
            config,
            token_endpoint_mock,
            upstream_mock,
        }
    }

    /// Initializes the test logger with the given level.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Creates a request builder, optionally carrying a bearer token.
    pub fn request_builder(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        bearer: Option<&str>,
    ) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());

        if let Some(token) = bearer {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        builder
    }

    /// Sends a GET request to the specified URI.
    pub async fn get(&self, uri: impl AsRef<str>, bearer: Option<&str>) -> TestResponse {
        let request = self
            .request_builder(Method::GET, uri, bearer)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a JSON body to the specified URI.
    pub async fn post<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        bearer: Option<&str>,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder(Method::POST, uri, bearer)
            .header("Content-Type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        // Try to parse as JSON, falling back to the raw text
        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }

    /// Mounts a successful token endpoint answer expected `expected_calls` times
    pub async fn mount_token_endpoint(&self, response_body: impl Serialize, expected_calls: u64) {
        Mock::given(matchers::method("POST"))
            .and(matchers::path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(StatusCode::OK.as_u16()).set_body_json(response_body))
            .expect(expected_calls)
            .mount(&self.token_endpoint_mock)
            .await;
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub json: Value,
}

impl TestResponse {
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        let value = self
            .headers
            .get(name)
            .unwrap_or_else(|| panic!("Missing response header {}", name));
        assert_eq!(value, expected);
        self
    }
}
