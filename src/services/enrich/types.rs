//! Enrichment service types and events.

use thiserror::Error;

use crate::repository::RepositoryError;

/// Events emitted during enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichEvent {
    /// Backfill is about to begin
    Started { pending: u64 },
    /// One page fetch finished (the write happens with its batch)
    PageFetched {
        url: String,
        error: Option<String>,
    },
    /// A batch of outcomes was committed
    BatchCommitted {
        size: usize,
        enriched: usize,
        failed: usize,
    },
}

/// Result of an enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichResult {
    pub batches: u64,
    pub enriched: usize,
    pub failed: usize,
    /// Unenriched rows still eligible when the run stopped.
    pub remaining: u64,
}

/// Configuration for the enrichment service.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub batch_size: usize,
    pub workers: usize,
    /// Rows that failed this many times are no longer selected.
    pub max_attempts: u32,
    /// Stop after this many batches.
    pub max_batches: Option<u64>,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            workers: 2,
            max_attempts: 3,
            max_batches: None,
        }
    }
}

/// Fatal enrichment errors. Page fetch failures are recorded, not raised.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
