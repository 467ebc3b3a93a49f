//! HTTP client shared by the item API and page fetches.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::debug;

use super::FetchError;

/// HTTP client with a fixed per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with the default user agent.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_user_agent(timeout, None)
    }

    /// Create a new HTTP client with custom user agent configuration.
    /// - None: Use default hnharvest user agent
    /// - Some("impersonate"): Use a real browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
    ) -> Result<Self, FetchError> {
        let user_agent = resolve_user_agent(user_agent_config);
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request. Any status is returned; see
    /// [`HttpResponse::error_for_status`].
    pub async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        debug!(
            url,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "GET"
        );

        Ok(HttpResponse {
            status: response.status(),
            response,
        })
    }

    /// GET a URL and parse a 2xx body as JSON.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        self.get(url).await?.error_for_status()?.json_value().await
    }

    /// GET a URL and return a 2xx body as text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url).await?.error_for_status()?.text().await
    }
}
