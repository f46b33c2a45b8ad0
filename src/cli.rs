use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::discover;
use crate::load_config::load_config;
use crate::storage::S3Client;
use crate::synchronise::{self, SyncParams};

/// CLI for s3ferry: batch-upload completed recorder files to S3.
#[derive(Parser)]
#[clap(
    name = "s3ferry",
    version,
    about = "Upload completed recorder files to an S3 bucket, grouped by date key"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload all ready files to the target bucket using the given config file
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            config.trace_loaded();

            let client = match config.profile.as_deref() {
                Some(profile) => S3Client::from_profile(profile).await,
                None => S3Client::from_env().await,
            };

            let params = SyncParams {
                source_dir: config.source_dir.clone(),
                pattern: config.pattern.clone(),
                cutoff: discover::daily_cutoff(config.cutoff_minute),
                bucket: config.bucket.clone(),
                cleanup_source: config.cleanup_source,
            };

            tracing::info!(command = "sync", "Starting synchronisation run");
            let summary = synchronise::run(&params, &client).await;
            tracing::info!(
                command = "sync",
                succeeded = summary.succeeded,
                total = summary.total,
                "Synchronisation complete"
            );
            Ok(())
        }
    }
}
