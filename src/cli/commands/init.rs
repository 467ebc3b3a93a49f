//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::repository::CheckpointStore;

use super::helpers::{checkpoint_store, open_records};

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let records = open_records(settings)?;
    let total = records.stats(settings.max_enrich_attempts)?.total;

    println!(
        "  {} Database: {} ({} records)",
        style("✓").green(),
        settings.database_path().display(),
        total
    );

    match checkpoint_store(settings).load() {
        Some(id) => println!(
            "  {} Checkpoint: resuming below item {}",
            style("→").dim(),
            id
        ),
        None => println!(
            "  {} No checkpoint yet; ingestion starts at the current max item",
            style("→").dim()
        ),
    }

    println!(
        "{} Initialized hnharvest in {}",
        style("✓").green(),
        settings.data_dir.display()
    );

    Ok(())
}
