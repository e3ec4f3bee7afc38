use crate::error::Result;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Create the HTTP client used by [`crate::transport::ReqwestTransport`]
/// with the timeouts from the configuration
pub fn create_http_client(config: &Config) -> Result<Client> {
    let client = ClientBuilder::new()
        .pool_max_idle_per_host(50)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// Configuration for the Ghost API client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the API, e.g. `http://localhost:2368/ghost/api/v0.1/`
    pub base_url: String,
    /// Total request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// User-Agent header
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:2368/ghost/api/v0.1/".to_string(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("ghost-api/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Config {
            base_url: base_url.into(),
            ..Config::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
