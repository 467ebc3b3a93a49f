//! Service layer for hnharvest.
//!
//! Ingestion and enrichment are kept free of UI concerns; progress is
//! reported over optional event channels that the CLI renders.

pub mod enrich;
pub mod ingest;

pub use enrich::{EnrichConfig, EnrichError, EnrichEvent, EnrichResult, EnrichService};
pub use ingest::{IngestConfig, IngestError, IngestEvent, IngestResult, IngestService};
