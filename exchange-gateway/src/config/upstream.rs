use confique::Config;

/// Configuration for the downstream service requests are forwarded to
#[derive(Debug, Config, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the downstream service (default: http://localhost:8081)
    #[config(env = "GATEWAY_UPSTREAM_URL", default = "http://localhost:8081")]
    pub url: String,

    /// The timeout for forwarded requests in seconds (default: 30)
    #[config(env = "GATEWAY_UPSTREAM_TIMEOUT", default = 30)]
    pub timeout: u64,
}

impl UpstreamConfig {
    /// Returns the downstream URL for the given path and query
    pub fn get_url<S: Into<String>>(&self, path: S) -> String {
        let path = path.into();
        let base = self.url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}
