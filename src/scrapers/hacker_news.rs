//! Client for the Hacker News item API.

use async_trait::async_trait;

use super::{FetchError, HttpClient};
use crate::models::Item;

/// Public Firebase endpoint of the Hacker News API.
pub const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

/// A monotonically ID-addressed source of items.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Current upper bound of the ID space.
    async fn max_item(&self) -> Result<u64, FetchError>;

    /// Fetch one item. `Ok(None)` means the ID holds no item.
    async fn item(&self, id: u64) -> Result<Option<Item>, FetchError>;
}

/// [`ItemSource`] backed by the HTTP API.
#[derive(Clone)]
pub struct HackerNewsClient {
    http: HttpClient,
    base_url: String,
}

impl HackerNewsClient {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }

    pub fn max_item_url(&self) -> String {
        format!("{}/maxitem.json", self.base_url)
    }
}

#[async_trait]
impl ItemSource for HackerNewsClient {
    async fn max_item(&self) -> Result<u64, FetchError> {
        let value = self.http.get_json(&self.max_item_url()).await?;
        value
            .as_u64()
            .ok_or_else(|| FetchError::Payload(format!("maxitem is not an integer: {}", value)))
    }

    async fn item(&self, id: u64) -> Result<Option<Item>, FetchError> {
        let value = self.http.get_json(&self.item_url(id)).await?;
        Ok(Item::from_value(&value))
    }
}
