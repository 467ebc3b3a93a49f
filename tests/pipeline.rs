//! End-to-end ingest and enrich against a mock item API and mock pages.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use hnharvest::repository::{CheckpointStore, FileCheckpointStore, RecordRepository};
use hnharvest::scrapers::{HackerNewsClient, HttpClient, HttpPageFetcher};
use hnharvest::services::{EnrichConfig, EnrichService, IngestConfig, IngestService};

async fn mount_item(server: &MockServer, id: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v0/item/{}.json", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/page/{}", page)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html.to_string(), "text/html"))
        .mount(server)
        .await;
}

struct Harness {
    server: MockServer,
    records: Arc<RecordRepository>,
    checkpoint: Arc<FileCheckpointStore>,
    _dir: TempDir,
}

impl Harness {
    async fn new() -> Self {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let records = Arc::new(RecordRepository::new(&dir.path().join("stories.db")).unwrap());
        let checkpoint = Arc::new(FileCheckpointStore::new(
            dir.path().join("last_processed_id.txt"),
        ));
        Self {
            server,
            records,
            checkpoint,
            _dir: dir,
        }
    }

    fn http(&self) -> HttpClient {
        HttpClient::new(Duration::from_secs(5)).unwrap()
    }

    fn page_url(&self, page: &str) -> String {
        format!("{}/page/{}", self.server.uri(), page)
    }

    fn ingest(&self, max_chunks: Option<u64>) -> IngestService {
        let source = HackerNewsClient::new(self.http(), &format!("{}/v0", self.server.uri()));
        IngestService::new(
            Arc::new(source),
            self.records.clone(),
            self.checkpoint.clone(),
            IngestConfig {
                chunk_size: 4,
                workers: 3,
                chunk_delay: Duration::ZERO,
                max_chunks,
            },
        )
    }

    fn enrich(&self) -> EnrichService {
        EnrichService::new(
            Arc::new(HttpPageFetcher::new(self.http())),
            self.records.clone(),
            EnrichConfig {
                batch_size: 2,
                workers: 2,
                max_attempts: 3,
                max_batches: None,
            },
        )
    }
}

#[tokio::test]
async fn ingest_then_enrich() {
    let h = Harness::new().await;

    Mock::given(method("GET"))
        .and(path("/v0/maxitem.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(7)))
        .expect(1)
        .mount(&h.server)
        .await;

    mount_item(
        &h.server,
        6,
        json!({"id": 6, "type": "story", "title": "A story", "url": h.page_url("a"), "time": 1700000006}),
    )
    .await;
    mount_item(&h.server, 5, json!({"id": 5, "type": "comment", "text": "nice"})).await;
    mount_item(
        &h.server,
        4,
        json!({"id": 4, "type": "story", "title": "Gone", "url": h.page_url("missing"), "time": 1700000004}),
    )
    .await;
    mount_item(&h.server, 3, json!({"id": 3, "type": "story", "title": "Ask HN: anything?"})).await;
    mount_item(&h.server, 2, serde_json::Value::Null).await;
    mount_item(
        &h.server,
        1,
        json!({"id": 1, "type": "story", "url": h.page_url("b"), "time": 1700000001}),
    )
    .await;

    mount_page(
        &h.server,
        "a",
        "<html><head><title>Page A</title></head><body><p>Hello world</p></body></html>",
    )
    .await;
    mount_page(
        &h.server,
        "b",
        "<html><head><title>Page B</title></head><body><h1>Second</h1><p>More text</p></body></html>",
    )
    .await;

    // Walk 6..=3 then 2..=1
    let result = h.ingest(None).run(None).await.unwrap();
    assert_eq!(result.chunks, 2);
    assert_eq!(result.found, 3);
    assert_eq!(result.inserted, 3);
    assert!(result.complete);
    assert_eq!(h.checkpoint.load(), Some(1));

    let a = h.records.get(&h.page_url("a")).unwrap().unwrap();
    assert_eq!(a.title, "A story");
    assert_eq!(a.website, "127.0.0.1");
    assert_eq!(a.time, Some(1700000006));
    assert!(a.text.is_empty());

    // Checkpoint at 1 means nothing left; maxitem is not requested again
    let again = h.ingest(None).run(None).await.unwrap();
    assert_eq!(again.chunks, 0);
    assert!(again.complete);

    let enriched = h.enrich().run(None).await.unwrap();
    assert_eq!(enriched.enriched, 2);
    assert_eq!(enriched.failed, 3);
    assert_eq!(enriched.remaining, 0);

    let a = h.records.get(&h.page_url("a")).unwrap().unwrap();
    assert_eq!(a.title, "A story");
    assert!(a.text.contains("Hello world"));

    let b = h.records.get(&h.page_url("b")).unwrap().unwrap();
    assert_eq!(b.title, "Page B");
    assert!(b.text.contains("Second"));
    assert!(b.text.contains("More text"));

    let missing = h.records.get(&h.page_url("missing")).unwrap().unwrap();
    assert_eq!(missing.title, "Gone");
    assert!(missing.text.is_empty());
    assert_eq!(
        h.records.last_error(&h.page_url("missing")).unwrap(),
        Some((3, Some("HTTP 404".to_string())))
    );

    let stats = h.records.stats(3).unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.enriched, 2);
    assert_eq!(stats.exhausted, 1);
}

#[tokio::test]
async fn interrupted_walk_resumes_below_checkpoint() {
    let h = Harness::new().await;

    Mock::given(method("GET"))
        .and(path("/v0/maxitem.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(11)))
        .expect(1)
        .mount(&h.server)
        .await;
    for id in 1..=10u64 {
        mount_item(
            &h.server,
            id,
            json!({"id": id, "type": "story", "title": format!("Story {}", id), "url": format!("https://site{}.example/post", id)}),
        )
        .await;
    }

    // One chunk only: 10..=7
    let first = h.ingest(Some(1));
    let partial = first.run(None).await.unwrap();
    assert_eq!(partial.chunks, 1);
    assert!(!partial.complete);
    assert_eq!(h.checkpoint.load(), Some(7));
    assert_eq!(h.records.stats(3).unwrap().total, 4);

    let rest = h.ingest(None).run(None).await.unwrap();
    assert_eq!(rest.chunks, 2);
    assert_eq!(rest.inserted, 6);
    assert!(rest.complete);
    assert_eq!(h.records.stats(3).unwrap().total, 10);
}
