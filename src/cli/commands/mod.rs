//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod enrich;
mod helpers;
mod ingest;
mod init;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, LoadOptions};

#[derive(Parser)]
#[command(name = "hnharvest")]
#[command(about = "Hacker News story archiver and page enricher")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing the database or a .db file directly.
    #[arg(long, short = 't', global = true, env = "HNHARVEST_TARGET")]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true, env = "HNHARVEST_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct IngestArgs {
    /// IDs per chunk (checkpoint granularity)
    #[arg(long)]
    chunk_size: Option<u64>,
    /// Concurrent item fetches
    #[arg(short, long)]
    workers: Option<usize>,
    /// Stop after this many chunks (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_chunks: u64,
    /// Discard the checkpoint and start again from the current max item
    #[arg(long)]
    restart: bool,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct EnrichArgs {
    /// Records per batch (one transaction per batch)
    #[arg(long)]
    batch_size: Option<usize>,
    /// Concurrent page fetches
    #[arg(short = 'W', long)]
    enrich_workers: Option<usize>,
    /// Stop after this many batches (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_batches: u64,
    /// Give URLs that ran out of attempts another chance
    #[arg(long)]
    retry_failed: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Walk item IDs downward and store stories with external URLs
    Ingest {
        #[command(flatten)]
        args: IngestArgs,
    },

    /// Fetch pages for stored stories that are missing a title or text
    Enrich {
        #[command(flatten)]
        args: EnrichArgs,
    },

    /// Ingest, then enrich
    Run {
        #[command(flatten)]
        ingest: IngestArgs,
        #[command(flatten)]
        enrich: EnrichArgs,
    },

    /// Show checkpoint and record counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        target: cli.target,
    };
    let settings = load_settings(&options).await?;
    settings.validate()?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Ingest { args } => ingest::cmd_ingest(&settings, &args).await,
        Commands::Enrich { args } => enrich::cmd_enrich(&settings, &args).await,
        Commands::Run { ingest, enrich } => {
            ingest::cmd_ingest(&settings, &ingest).await?;
            enrich::cmd_enrich(&settings, &enrich).await
        }
        Commands::Status { json } => status::cmd_status(&settings, json).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_flags() {
        let cli = Cli::try_parse_from([
            "hnharvest",
            "-t",
            "/tmp/hn",
            "run",
            "--chunk-size",
            "500",
            "--max-batches",
            "2",
            "--retry-failed",
        ])
        .unwrap();

        assert_eq!(cli.target, Some(PathBuf::from("/tmp/hn")));
        match cli.command {
            Commands::Run { ingest, enrich } => {
                assert_eq!(ingest.chunk_size, Some(500));
                assert!(!ingest.restart);
                assert_eq!(enrich.max_batches, 2);
                assert!(enrich.retry_failed);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_ingest_restart() {
        let cli = Cli::try_parse_from(["hnharvest", "ingest", "--restart", "-w", "8"]).unwrap();
        match cli.command {
            Commands::Ingest { args } => {
                assert!(args.restart);
                assert_eq!(args.workers, Some(8));
                assert_eq!(args.max_chunks, 0);
            }
            _ => panic!("expected ingest"),
        }
    }
}
