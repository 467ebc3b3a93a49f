//! Enrich command.

use console::style;
use tokio::sync::mpsc;

use crate::cli::progress::EnrichProgress;
use crate::config::Settings;
use crate::services::{EnrichEvent, EnrichService};

use super::helpers::{open_records, page_fetcher};
use super::EnrichArgs;

/// Backfill titles and text for stored stories.
pub async fn cmd_enrich(settings: &Settings, args: &EnrichArgs) -> anyhow::Result<()> {
    let records = open_records(settings)?;

    if args.retry_failed {
        let reset = records.reset_failures()?;
        println!(
            "{} Reset attempts on {} failed stories",
            style("↻").cyan(),
            reset
        );
    }

    let mut config = settings.enrich_config();
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size.max(1);
    }
    if let Some(workers) = args.enrich_workers {
        config.workers = workers.max(1);
    }
    if args.max_batches > 0 {
        config.max_batches = Some(args.max_batches);
    }

    if records.count_pending(config.max_attempts)? == 0 {
        println!("{} No stories need enrichment", style("!").yellow());
        return Ok(());
    }

    let service = EnrichService::new(page_fetcher(settings)?, records, config);

    let (event_tx, mut event_rx) = mpsc::channel::<EnrichEvent>(100);
    let event_handler = tokio::spawn(async move {
        let mut progress = EnrichProgress::default();
        while let Some(event) = event_rx.recv().await {
            progress.handle(event);
        }
        progress.finish();
    });

    let result = service.run(Some(event_tx)).await;
    let _ = event_handler.await;
    let result = result?;

    println!(
        "{} Enriched {} stories in {} batches ({} failed attempts)",
        style("✓").green(),
        result.enriched,
        result.batches,
        result.failed
    );
    if result.remaining > 0 {
        println!(
            "  {} {} stories still pending",
            style("→").dim(),
            result.remaining
        );
    }

    Ok(())
}
