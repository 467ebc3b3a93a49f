//! Ingestion walker.
//!
//! Walks item IDs downward from the high-water mark in fixed-size chunks.
//! Each chunk is fetched with bounded concurrency, filtered to stories with
//! external URLs, inserted (ignoring duplicates) and then checkpointed, so an
//! interrupted walk resumes at the chunk that was in progress.

mod types;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::models::Record;
use crate::repository::{CheckpointStore, RecordRepository};
use crate::scrapers::{BoundedFetcher, ItemSource};

pub use types::{IngestConfig, IngestError, IngestEvent, IngestResult};

/// Inclusive `(high, low)` bounds of the chunk starting at `current`.
pub fn chunk_bounds(current: u64, chunk_size: u64) -> (u64, u64) {
    let low = current.saturating_sub(chunk_size.saturating_sub(1)).max(1);
    (current, low)
}

/// Number of chunks needed to walk from `start_id` down to 1.
pub fn estimate_chunks(start_id: u64, chunk_size: u64) -> u64 {
    if start_id == 0 {
        0
    } else {
        (start_id - 1) / chunk_size.max(1) + 1
    }
}

/// Service driving the chunked walk.
pub struct IngestService {
    source: Arc<dyn ItemSource>,
    records: Arc<RecordRepository>,
    checkpoint: Arc<dyn CheckpointStore>,
    config: IngestConfig,
}

impl IngestService {
    pub fn new(
        source: Arc<dyn ItemSource>,
        records: Arc<RecordRepository>,
        checkpoint: Arc<dyn CheckpointStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            source,
            records,
            checkpoint,
            config,
        }
    }

    /// First ID to fetch and whether it came from a checkpoint.
    ///
    /// The max item is only requested when there is nothing to resume from.
    pub async fn start_id(&self) -> Result<(u64, bool), IngestError> {
        if let Some(checkpoint) = self.checkpoint.load() {
            return Ok((checkpoint.saturating_sub(1), true));
        }

        let max_id = self
            .source
            .max_item()
            .await
            .map_err(IngestError::HighWaterMark)?;
        Ok((max_id.saturating_sub(1), false))
    }

    /// Walk until ID 1 is reached or `max_chunks` chunks are done.
    ///
    /// Chunks are strictly sequential: the next chunk starts only after the
    /// previous chunk's rows and checkpoint are on disk.
    pub async fn run(
        &self,
        events: Option<mpsc::Sender<IngestEvent>>,
    ) -> Result<IngestResult, IngestError> {
        let (start_id, resumed) = self.start_id().await?;
        let chunk_size = self.config.chunk_size.max(1);
        let total_chunks = estimate_chunks(start_id, chunk_size);

        if resumed {
            info!(start_id, total_chunks, "Resuming ingestion");
        } else {
            info!(start_id, total_chunks, "Starting ingestion from the top");
        }
        emit(
            &events,
            IngestEvent::Started {
                start_id,
                total_chunks,
                resumed,
            },
        )
        .await;

        let fetcher = BoundedFetcher::new(self.config.workers);
        let mut result = IngestResult::default();
        let mut current = start_id;

        while current >= 1 {
            if let Some(max) = self.config.max_chunks {
                if result.chunks >= max {
                    info!(chunks = result.chunks, "Chunk limit reached");
                    break;
                }
            }

            let (high, low) = chunk_bounds(current, chunk_size);
            let records = self.fetch_chunk(&fetcher, high, low).await;
            let inserted = self.records.upsert_ignoring_duplicates(&records)?;
            self.checkpoint.save(low)?;

            result.chunks += 1;
            result.found += records.len();
            result.inserted += inserted;
            result.last_checkpoint = Some(low);

            info!(
                high,
                low,
                found = records.len(),
                inserted,
                "Finished chunk {}/{}",
                result.chunks,
                total_chunks
            );
            emit(
                &events,
                IngestEvent::ChunkCompleted {
                    high,
                    low,
                    found: records.len(),
                    inserted,
                },
            )
            .await;

            current = low - 1;
            if current >= 1 && !self.config.chunk_delay.is_zero() {
                tokio::time::sleep(self.config.chunk_delay).await;
            }
        }

        result.complete = current < 1;
        Ok(result)
    }

    /// Fetch every ID in `[low, high]`, keeping stories with external URLs.
    async fn fetch_chunk(&self, fetcher: &BoundedFetcher, high: u64, low: u64) -> Vec<Record> {
        let source = self.source.clone();
        let mut stream = fetcher.fetch((low..=high).rev(), move |id| {
            let source = source.clone();
            async move {
                match source.item(id).await {
                    Ok(Some(item)) => item.into_record(),
                    Ok(None) => None,
                    Err(e) => {
                        debug!(id, "Dropping item: {}", e);
                        None
                    }
                }
            }
        });

        let mut records = Vec::new();
        while let Some(record) = stream.recv().await {
            records.push(record);
        }
        records
    }
}

async fn emit(events: &Option<mpsc::Sender<IngestEvent>>, event: IngestEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
