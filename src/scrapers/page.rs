//! Linked page fetching and rendering.

use async_trait::async_trait;

use super::{FetchError, HttpClient};
use crate::utils::{extract_page, render_content};

/// Title and rendered body of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub title: String,
    pub text: String,
}

/// Fetches a story's linked page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// [`PageFetcher`] that GETs the page and renders its `<body>` to Markdown.
#[derive(Clone)]
pub struct HttpPageFetcher {
    http: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let html = self.http.get_text(url).await?;

        // Html is !Send, so parsing stays in this synchronous block
        let page = extract_page(&html);
        let text = render_content(&page.body_html);
        if text.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(FetchedPage {
            title: page.title,
            text,
        })
    }
}
