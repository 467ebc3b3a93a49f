//! Ingestion service types and events.

use std::time::Duration;

use thiserror::Error;

use crate::repository::RepositoryError;
use crate::scrapers::FetchError;

/// Events emitted while walking the ID space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestEvent {
    /// Walk is about to begin
    Started {
        start_id: u64,
        total_chunks: u64,
        resumed: bool,
    },
    /// A chunk was stored and checkpointed
    ChunkCompleted {
        high: u64,
        low: u64,
        found: usize,
        inserted: usize,
    },
}

/// Result of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestResult {
    pub chunks: u64,
    /// Story records produced by the fetches.
    pub found: usize,
    /// Rows actually added (duplicates excluded).
    pub inserted: usize,
    pub last_checkpoint: Option<u64>,
    /// True when the walk reached ID 1.
    pub complete: bool,
}

/// Configuration for the ingestion service.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub chunk_size: u64,
    pub workers: usize,
    /// Pause between chunks.
    pub chunk_delay: Duration,
    /// Stop after this many chunks (the next run resumes).
    pub max_chunks: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            workers: 2,
            chunk_delay: Duration::from_millis(100),
            max_chunks: None,
        }
    }
}

/// Fatal ingestion errors. Per-item fetch failures never end up here.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("could not determine the current max item ID: {0}")]
    HighWaterMark(#[source] FetchError),
}
