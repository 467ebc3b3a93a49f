//! Repository layer for durable pipeline state.
//!
//! - `records`: the SQLite story table
//! - `checkpoint`: the ingestion resume cursor

pub mod checkpoint;
pub mod records;

pub use checkpoint::{CheckpointStore, FileCheckpointStore};
pub use records::{BatchSummary, EnrichmentOutcome, RecordRepository, RecordStats};

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

/// Persistence failures. None of these are recoverable locally.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Open a database connection with proper concurrency settings.
pub(crate) fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 30000;
    "#,
    )?;
    Ok(conn)
}
