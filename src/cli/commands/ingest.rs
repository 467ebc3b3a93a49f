//! Ingest command.

use console::style;
use tokio::sync::mpsc;

use crate::cli::progress::IngestProgress;
use crate::config::Settings;
use crate::repository::CheckpointStore;
use crate::services::{IngestEvent, IngestService};

use super::helpers::{checkpoint_store, item_source, open_records};
use super::IngestArgs;

/// Walk item IDs from the checkpoint (or max item) down to 1.
pub async fn cmd_ingest(settings: &Settings, args: &IngestArgs) -> anyhow::Result<()> {
    let records = open_records(settings)?;
    let checkpoint = checkpoint_store(settings);

    if args.restart {
        checkpoint.clear()?;
        println!("{} Checkpoint cleared", style("↻").cyan());
    }

    let mut config = settings.ingest_config();
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size.max(1);
    }
    if let Some(workers) = args.workers {
        config.workers = workers.max(1);
    }
    if args.max_chunks > 0 {
        config.max_chunks = Some(args.max_chunks);
    }

    let service = IngestService::new(item_source(settings)?, records, checkpoint, config);

    // Event channel for progress updates
    let (event_tx, mut event_rx) = mpsc::channel::<IngestEvent>(100);
    let event_handler = tokio::spawn(async move {
        let mut progress = IngestProgress::default();
        while let Some(event) = event_rx.recv().await {
            progress.handle(event);
        }
        progress.finish();
    });

    let result = service.run(Some(event_tx)).await;
    let _ = event_handler.await;
    let result = result?;

    println!(
        "{} Ingested {} chunks: {} stories found, {} new",
        style("✓").green(),
        result.chunks,
        result.found,
        result.inserted
    );
    if result.complete {
        println!("  {} Reached item 1", style("→").dim());
    } else if let Some(low) = result.last_checkpoint {
        println!(
            "  {} Stopped at item {}; the next run resumes below it",
            style("→").dim(),
            low
        );
    }

    Ok(())
}
