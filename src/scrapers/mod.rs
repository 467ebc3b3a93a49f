//! Network side of the harvester: the bounded fetcher and the remote clients.

pub mod bounded;
pub mod hacker_news;
mod http_client;
pub mod page;

pub use bounded::{BoundedFetcher, FetchStream};
pub use hacker_news::{HackerNewsClient, ItemSource, DEFAULT_API_BASE};
pub use http_client::{resolve_user_agent, HttpClient, HttpResponse, USER_AGENT};
pub use page::{FetchedPage, HttpPageFetcher, PageFetcher};

use thiserror::Error;

/// Errors produced by a single remote fetch.
///
/// These never abort a walk or a backfill; the caller decides whether the
/// item is dropped or recorded as a failed attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("response had no usable body")]
    EmptyBody,
}

impl FetchError {
    /// Short form stored alongside a failed enrichment attempt.
    pub fn summary(&self) -> String {
        match self {
            FetchError::Http(e) if e.is_timeout() => "timeout".to_string(),
            FetchError::Http(e) if e.is_connect() => "connection error".to_string(),
            FetchError::Status(code) => format!("HTTP {}", code),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_status() {
        assert_eq!(FetchError::Status(404).summary(), "HTTP 404");
        assert_eq!(
            FetchError::EmptyBody.summary(),
            "response had no usable body"
        );
    }
}
