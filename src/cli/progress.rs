//! Progress bars for long-running commands.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::services::{EnrichEvent, IngestEvent};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

fn bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Renders ingestion events as a chunk progress bar.
#[derive(Default)]
pub struct IngestProgress {
    bar: Option<ProgressBar>,
    stories: usize,
    inserted: usize,
}

impl IngestProgress {
    pub fn handle(&mut self, event: IngestEvent) {
        match event {
            IngestEvent::Started {
                start_id,
                total_chunks,
                resumed,
            } => {
                let how = if resumed { "Resuming" } else { "Starting" };
                println!(
                    "{} {} at item {} ({} chunks to go)",
                    style("→").cyan(),
                    how,
                    start_id,
                    total_chunks
                );
                self.bar = Some(bar(total_chunks));
            }
            IngestEvent::ChunkCompleted {
                low,
                found,
                inserted,
                ..
            } => {
                self.stories += found;
                self.inserted += inserted;
                if let Some(ref pb) = self.bar {
                    pb.inc(1);
                    pb.set_message(format!(
                        "down to {} · {} stories, {} new",
                        low, self.stories, self.inserted
                    ));
                }
            }
        }
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.bar {
            pb.finish_and_clear();
        }
    }
}

/// Renders enrichment events as a per-page progress bar.
#[derive(Default)]
pub struct EnrichProgress {
    bar: Option<ProgressBar>,
    failed: usize,
}

impl EnrichProgress {
    pub fn handle(&mut self, event: EnrichEvent) {
        match event {
            EnrichEvent::Started { pending } => {
                println!(
                    "{} Enriching {} pending stories",
                    style("→").cyan(),
                    pending
                );
                self.bar = Some(bar(pending));
            }
            EnrichEvent::PageFetched { url, error } => {
                if let Some(ref pb) = self.bar {
                    pb.inc(1);
                    if let Some(error) = error {
                        self.failed += 1;
                        pb.println(format!("{} {}: {}", style("✗").red(), url, error));
                    }
                    pb.set_message(format!("{} failed", self.failed));
                }
            }
            EnrichEvent::BatchCommitted { .. } => {}
        }
    }

    pub fn finish(&self) {
        if let Some(ref pb) = self.bar {
            pb.finish_and_clear();
        }
    }
}
