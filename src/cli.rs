//! Command-line surface: argument parsing and the async [`run`] entrypoint shared by
//! `main` and the integration tests.
//!
//! - `sync --config <file>`: synchronise a drive folder into the document database
//! - `convert <file.md>`: print the blocks a local markdown file converts to, as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::batch::batch_count;
use crate::convert::markdown_to_blocks;
use crate::drive::DriveClient;
use crate::load_config::load_config;
use crate::notion::NotionClient;
use crate::synchronise::{synchronise, SyncOutcome, SynchroniseConfig};

#[derive(Parser)]
#[clap(
    name = "drive-notion-sync",
    version,
    about = "Synchronise markdown documents from a Drive folder into a Notion database"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronise the configured folder into the configured database
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Convert a local markdown file and print the resulting blocks as JSON
    Convert {
        /// Markdown file to convert
        input: PathBuf,
        /// Print JSON on a single line
        #[clap(long)]
        compact: bool,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let settings = load_config(config)?;
            tracing::info!(command = "sync", "Starting synchronisation process");

            let drive = DriveClient::new(settings.secrets.google_access_token.clone());
            let store = NotionClient::new(
                settings.secrets.notion_token.clone(),
                settings.config.notion.database_id.clone(),
                settings.config.notion.properties.clone(),
            );
            let sync_config = SynchroniseConfig {
                folder_id: settings.config.drive.folder_id.clone(),
                recursive: settings.config.drive.recursive,
            };

            let report = synchronise(&sync_config, &drive, &store)
                .await
                .map_err(|e| {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    anyhow::Error::new(e)
                })?;

            println!("Synchronise complete.");
            for file in &report.files {
                let status = match &file.outcome {
                    SyncOutcome::Created { blocks, .. } => format!("created ({blocks} blocks)"),
                    SyncOutcome::Updated { blocks, .. } => format!("updated ({blocks} blocks)"),
                    SyncOutcome::Skipped { .. } => "unchanged".to_string(),
                    SyncOutcome::Failed { reason } => format!("FAILED: {reason}"),
                };
                println!("  {} [{}]: {}", file.name, file.file_id, status);
            }
            println!(
                "created={} updated={} skipped={} failed={}",
                report.created(),
                report.updated(),
                report.skipped(),
                report.failed()
            );
            tracing::info!(command = "sync", ?report, "Synchronisation report");
            Ok(())
        }
        Commands::Convert { input, compact } => {
            let markdown = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let blocks = markdown_to_blocks(&markdown);
            let json = if compact {
                serde_json::to_string(&blocks)?
            } else {
                serde_json::to_string_pretty(&blocks)?
            };
            println!("{json}");
            eprintln!(
                "{} blocks, {} append batches",
                blocks.len(),
                batch_count(blocks.len())
            );
            Ok(())
        }
    }
}
