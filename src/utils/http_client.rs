use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const USER_AGENT: &str = "gitlab-stats/1.0.0";

/// Per-client HTTP behavior. TLS verification stays on unless a
/// deployment explicitly opts out for a self-signed GitLab instance.
#[derive(Clone, Debug)]
pub struct HttpClientOptions {
    pub verify_tls: bool,
    pub disable_proxy: bool,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            verify_tls: true,
            disable_proxy: false,
        }
    }
}

/// Create a configured HTTP client for making requests to the GitLab API
pub fn create_http_client(options: &HttpClientOptions) -> reqwest::Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT);

    if !options.verify_tls {
        log::warn!("TLS certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if options.disable_proxy {
        builder = builder.no_proxy();
    }

    builder.build()
}
