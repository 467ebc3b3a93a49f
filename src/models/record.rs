//! Persisted story record.

use serde::{Deserialize, Serialize};
use url::Url;

/// One stored story, keyed by its external URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key; identity for the whole pipeline.
    pub url: String,
    pub title: String,
    /// Rendered page body once enriched.
    pub text: String,
    /// Hostname of `url`, derived at ingestion.
    pub website: String,
    /// Source creation timestamp (Unix seconds).
    pub time: Option<i64>,
    /// Externally assigned; never written by the harvester.
    pub label: String,
}

impl Record {
    /// Build a freshly ingested record. `website` is derived from `url`.
    pub fn new(url: String, title: String, text: String, time: Option<i64>) -> Self {
        let website = website_from_url(&url);
        Self {
            url,
            title,
            text,
            website,
            time,
            label: String::new(),
        }
    }

    /// Whether the record still needs enrichment.
    pub fn is_unenriched(&self) -> bool {
        self.title.is_empty() || self.text.is_empty()
    }
}

/// Hostname portion of a URL (`scheme://HOST/...` -> `HOST`).
///
/// Never fails: URLs the parser rejects fall back to a plain split on `//`,
/// and anything without an authority yields an empty string.
pub fn website_from_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url.trim()) {
        if let Some(host) = parsed.host_str() {
            return host.to_string();
        }
    }

    url.split_once("//")
        .map(|(_, rest)| rest)
        .and_then(|rest| rest.split(['/', '?', '#']).next())
        .map(|authority| {
            let host = authority.rsplit('@').next().unwrap_or(authority);
            host.split(':').next().unwrap_or(host).to_lowercase()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_website_from_url() {
        assert_eq!(website_from_url("https://example.com/a"), "example.com");
        assert_eq!(
            website_from_url("http://news.Example.org:8080/path?q=1"),
            "news.example.org"
        );
        assert_eq!(website_from_url("https://user@host.io"), "host.io");
    }

    #[test]
    fn test_website_from_malformed_url() {
        assert_eq!(website_from_url("not a url"), "");
        assert_eq!(website_from_url(""), "");
        assert_eq!(website_from_url("mailto:someone@example.com"), "");
        assert_eq!(website_from_url("http://bad host/x"), "bad host");
    }

    #[test]
    fn test_new_record_is_unenriched() {
        let record = Record::new(
            "https://example.com/a".to_string(),
            "Hi".to_string(),
            String::new(),
            Some(1000),
        );
        assert_eq!(record.website, "example.com");
        assert!(record.label.is_empty());
        assert!(record.is_unenriched());
    }
}
