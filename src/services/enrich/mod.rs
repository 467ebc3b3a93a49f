//! Enrichment backfiller.
//!
//! Repeatedly selects a batch of unenriched stories, fetches their pages with
//! bounded concurrency and commits every outcome of the batch in a single
//! transaction. Failed fetches are written as failed attempts so an
//! unreachable URL stops being selected once its attempts run out.

mod types;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::repository::{BatchSummary, EnrichmentOutcome, RecordRepository};
use crate::scrapers::{BoundedFetcher, PageFetcher};

pub use types::{EnrichConfig, EnrichError, EnrichEvent, EnrichResult};

/// Service driving the backfill loop.
pub struct EnrichService {
    pages: Arc<dyn PageFetcher>,
    records: Arc<RecordRepository>,
    config: EnrichConfig,
}

impl EnrichService {
    pub fn new(
        pages: Arc<dyn PageFetcher>,
        records: Arc<RecordRepository>,
        config: EnrichConfig,
    ) -> Self {
        Self {
            pages,
            records,
            config,
        }
    }

    /// Process batches until nothing eligible remains or `max_batches` is hit.
    pub async fn run(
        &self,
        events: Option<mpsc::Sender<EnrichEvent>>,
    ) -> Result<EnrichResult, EnrichError> {
        let max_attempts = self.config.max_attempts;
        let batch_size = self.config.batch_size.max(1);

        let pending = self.records.count_pending(max_attempts)?;
        info!(pending, batch_size, "Starting enrichment");
        emit(&events, EnrichEvent::Started { pending }).await;

        let fetcher = BoundedFetcher::new(self.config.workers);
        let mut result = EnrichResult::default();

        loop {
            if let Some(max) = self.config.max_batches {
                if result.batches >= max {
                    info!(batches = result.batches, "Batch limit reached");
                    break;
                }
            }

            let batch = self
                .records
                .select_unenriched_batch(batch_size, max_attempts)?;
            if batch.is_empty() {
                break;
            }

            let outcomes = self.fetch_batch(&fetcher, &batch, &events).await;
            let summary = self.records.apply_enrichment_batch(&outcomes)?;
            let BatchSummary { enriched, failed } = summary;

            result.batches += 1;
            result.enriched += enriched;
            result.failed += failed;

            info!(size = batch.len(), enriched, failed, "Committed batch");
            emit(
                &events,
                EnrichEvent::BatchCommitted {
                    size: batch.len(),
                    enriched,
                    failed,
                },
            )
            .await;

            if summary.changed() == 0 {
                // Every selected row bumps its attempts; no change means the
                // selection would repeat forever
                warn!("Batch changed no rows, stopping");
                break;
            }
        }

        result.remaining = self.records.count_pending(max_attempts)?;
        Ok(result)
    }

    /// Fetch every URL in the batch. Each URL gets exactly one outcome.
    async fn fetch_batch(
        &self,
        fetcher: &BoundedFetcher,
        batch: &[String],
        events: &Option<mpsc::Sender<EnrichEvent>>,
    ) -> Vec<(String, EnrichmentOutcome)> {
        let pages = self.pages.clone();
        let mut stream = fetcher.fetch(batch.to_vec(), move |url| {
            let pages = pages.clone();
            async move {
                let outcome = match pages.fetch_page(&url).await {
                    Ok(page) => EnrichmentOutcome::Enriched {
                        title: page.title,
                        text: page.text,
                    },
                    Err(e) => {
                        debug!(url = %url, "Page fetch failed: {}", e);
                        EnrichmentOutcome::Failed { error: e.summary() }
                    }
                };
                Some((url, outcome))
            }
        });

        let mut outcomes = HashMap::with_capacity(batch.len());
        while let Some((url, outcome)) = stream.recv().await {
            let error = match &outcome {
                EnrichmentOutcome::Failed { error } => Some(error.clone()),
                EnrichmentOutcome::Enriched { .. } => None,
            };
            emit(
                events,
                EnrichEvent::PageFetched {
                    url: url.clone(),
                    error,
                },
            )
            .await;
            outcomes.insert(url, outcome);
        }

        batch
            .iter()
            .map(|url| {
                let outcome = outcomes.remove(url).unwrap_or_else(|| {
                    warn!(url = %url, "No fetch outcome reported, recording failure");
                    EnrichmentOutcome::Failed {
                        error: "fetch did not complete".to_string(),
                    }
                });
                (url.clone(), outcome)
            })
            .collect()
    }
}

async fn emit(events: &Option<mpsc::Sender<EnrichEvent>>, event: EnrichEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::scrapers::{FetchError, FetchedPage};
    use async_trait::async_trait;
    use rusqlite::Connection;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serves canned pages; unknown URLs fail with 503, `panics` panics.
    #[derive(Default)]
    struct FakePages {
        pages: HashMap<String, FetchedPage>,
        panics: Vec<String>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl FakePages {
        fn with(urls: &[&str]) -> Self {
            let pages = urls
                .iter()
                .map(|u| {
                    (
                        u.to_string(),
                        FetchedPage {
                            title: format!("Title of {}", u),
                            text: format!("Body of {}", u),
                        },
                    )
                })
                .collect();
            Self {
                pages,
                ..Default::default()
            }
        }

        fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl PageFetcher for FakePages {
        async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
            *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
            if self.panics.iter().any(|u| u == url) {
                panic!("fetcher blew up on {}", url);
            }
            self.pages.get(url).cloned().ok_or(FetchError::Status(503))
        }
    }

    fn setup(urls: &[&str]) -> (Arc<RecordRepository>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let repo = RecordRepository::new(&dir.path().join("stories.db")).unwrap();
        let records: Vec<Record> = urls
            .iter()
            .map(|u| Record::new(u.to_string(), String::new(), String::new(), Some(1)))
            .collect();
        repo.upsert_ignoring_duplicates(&records).unwrap();
        (Arc::new(repo), dir)
    }

    fn config(batch_size: usize) -> EnrichConfig {
        EnrichConfig {
            batch_size,
            workers: 2,
            max_attempts: 3,
            max_batches: None,
        }
    }

    #[tokio::test]
    async fn test_enriches_everything_in_batches() {
        let urls = ["https://a.com/1", "https://a.com/2", "https://b.com/3", "https://b.com/4", "https://c.com/5"];
        let (repo, _dir) = setup(&urls);
        let pages = Arc::new(FakePages::with(&urls));

        let result = EnrichService::new(pages.clone(), repo.clone(), config(2))
            .run(None)
            .await
            .unwrap();

        assert_eq!(result.batches, 3);
        assert_eq!(result.enriched, 5);
        assert_eq!(result.failed, 0);
        assert_eq!(result.remaining, 0);
        assert_eq!(repo.count_unenriched().unwrap(), 0);

        let record = repo.get("https://b.com/3").unwrap().unwrap();
        assert_eq!(record.title, "Title of https://b.com/3");
        assert_eq!(record.text, "Body of https://b.com/3");
        for url in urls {
            assert_eq!(pages.calls(url), 1);
        }
    }

    #[tokio::test]
    async fn test_unreachable_urls_stop_after_max_attempts() {
        let (repo, _dir) = setup(&["https://up.example/", "https://down.example/"]);
        let pages = Arc::new(FakePages::with(&["https://up.example/"]));

        let result = EnrichService::new(pages.clone(), repo.clone(), config(10))
            .run(None)
            .await
            .unwrap();

        assert_eq!(result.batches, 3);
        assert_eq!(result.enriched, 1);
        assert_eq!(result.failed, 3);
        assert_eq!(result.remaining, 0);
        assert_eq!(pages.calls("https://down.example/"), 3);
        assert_eq!(pages.calls("https://up.example/"), 1);

        let down = repo.get("https://down.example/").unwrap().unwrap();
        assert!(down.title.is_empty() && down.text.is_empty());
        assert_eq!(
            repo.last_error("https://down.example/").unwrap(),
            Some((3, Some("HTTP 503".to_string())))
        );
        assert_eq!(repo.stats(3).unwrap().exhausted, 1);
    }

    #[tokio::test]
    async fn test_enriched_and_labeled_rows_are_left_alone() {
        let (repo, _dir) = setup(&["https://done.example/", "https://todo.example/"]);
        repo.update_enrichment("https://done.example/", "Kept", "kept body")
            .unwrap();
        Connection::open(repo.database_path())
            .unwrap()
            .execute(
                "UPDATE data SET label = 'keep' WHERE url = 'https://done.example/'",
                [],
            )
            .unwrap();

        let pages = Arc::new(FakePages::with(&["https://done.example/", "https://todo.example/"]));
        EnrichService::new(pages.clone(), repo.clone(), config(10))
            .run(None)
            .await
            .unwrap();

        assert_eq!(pages.calls("https://done.example/"), 0);
        let done = repo.get("https://done.example/").unwrap().unwrap();
        assert_eq!(done.title, "Kept");
        assert_eq!(done.text, "kept body");
        assert_eq!(done.label, "keep");
    }

    #[tokio::test]
    async fn test_lost_fetch_is_recorded_as_failure() {
        let (repo, _dir) = setup(&["https://ok.example/", "https://crash.example/"]);
        let pages = Arc::new(FakePages {
            panics: vec!["https://crash.example/".to_string()],
            ..FakePages::with(&["https://ok.example/"])
        });

        let result = EnrichService::new(pages.clone(), repo.clone(), config(10))
            .run(None)
            .await
            .unwrap();

        assert_eq!(result.enriched, 1);
        assert_eq!(pages.calls("https://crash.example/"), 3);
        assert_eq!(
            repo.last_error("https://crash.example/").unwrap(),
            Some((3, Some("fetch did not complete".to_string())))
        );
    }

    #[tokio::test]
    async fn test_batch_limit() {
        let urls = ["https://a.com/1", "https://a.com/2", "https://a.com/3"];
        let (repo, _dir) = setup(&urls);
        let pages = Arc::new(FakePages::with(&urls));

        let mut limited = config(1);
        limited.max_batches = Some(2);
        let result = EnrichService::new(pages, repo.clone(), limited)
            .run(None)
            .await
            .unwrap();

        assert_eq!(result.batches, 2);
        assert_eq!(result.remaining, 1);
        assert_eq!(repo.count_unenriched().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_emits_events() {
        let (repo, _dir) = setup(&["https://a.com/1", "https://gone.example/"]);
        let pages = Arc::new(FakePages::with(&["https://a.com/1"]));
        let (tx, mut rx) = mpsc::channel(64);

        let mut once = config(10);
        once.max_batches = Some(1);
        EnrichService::new(pages, repo, once)
            .run(Some(tx))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events[0], EnrichEvent::Started { pending: 2 });
        assert!(events.contains(&EnrichEvent::PageFetched {
            url: "https://gone.example/".to_string(),
            error: Some("HTTP 503".to_string()),
        }));
        assert_eq!(
            events.last(),
            Some(&EnrichEvent::BatchCommitted {
                size: 2,
                enriched: 1,
                failed: 1
            })
        );
    }

    #[tokio::test]
    async fn test_untitled_page_does_not_half_enrich() {
        let (repo, _dir) = setup(&["https://files.example/paper.pdf"]);
        let mut fake = FakePages::default();
        fake.pages.insert(
            "https://files.example/paper.pdf".to_string(),
            FetchedPage {
                title: String::new(),
                text: "body text".to_string(),
            },
        );
        let pages = Arc::new(fake);

        let result = EnrichService::new(pages.clone(), repo.clone(), config(10))
            .run(None)
            .await
            .unwrap();

        assert_eq!(result.enriched, 0);
        assert_eq!(result.failed, 3);
        assert_eq!(result.remaining, 0);

        let record = repo.get("https://files.example/paper.pdf").unwrap().unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.text, "");
        assert_eq!(
            repo.last_error("https://files.example/paper.pdf").unwrap(),
            Some((3, Some("page has no title".to_string())))
        );
        assert_eq!(repo.stats(3).unwrap().exhausted, 1);
    }
}
