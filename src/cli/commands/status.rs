//! Status command.

use console::style;
use serde_json::json;

use crate::config::Settings;
use crate::repository::CheckpointStore;

use super::helpers::{checkpoint_store, open_records};

/// Show checkpoint position and record counts.
pub async fn cmd_status(settings: &Settings, json: bool) -> anyhow::Result<()> {
    if !settings.database_path().exists() {
        println!(
            "{} Not initialized. Run 'hnharvest init' first.",
            style("!").yellow()
        );
        return Ok(());
    }

    let records = open_records(settings)?;
    let stats = records.stats(settings.max_enrich_attempts)?;
    let checkpoint = checkpoint_store(settings).load();

    if json {
        let value = json!({
            "database": settings.database_path(),
            "checkpoint": checkpoint,
            "records": stats.total,
            "enriched": stats.enriched,
            "pending": stats.pending,
            "exhausted": stats.exhausted,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let separator = "─".repeat(50);
    println!("{}", style("hnharvest status").bold());
    println!("{}", separator);
    println!("Database:   {}", settings.database_path().display());
    match checkpoint {
        Some(id) => println!("Checkpoint: {}", id),
        None => println!("Checkpoint: {}", style("none").dim()),
    }
    println!("{}", separator);
    println!("{:<12} {:>10}", "Records", stats.total);
    println!("{:<12} {:>10}", "Enriched", style(stats.enriched).green());
    println!("{:<12} {:>10}", "Pending", style(stats.pending).yellow());
    println!("{:<12} {:>10}", "Exhausted", style(stats.exhausted).red());

    Ok(())
}
