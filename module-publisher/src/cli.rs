//! # module-publisher CLI Interface (Module)
//!
//! Command parsing and the async entrypoint shared by `main` and the
//! integration tests. All pipeline logic lives in `module-publisher-core`;
//! this module only wires configuration, the git client and the S3 store
//! together.

use crate::load_config::resolve_config;
use crate::upload::S3Store;
use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use module_publisher_core::checkout::GitCli;
use module_publisher_core::index_check::check_index_files;
use module_publisher_core::publish::publish;
use std::path::PathBuf;
use std::sync::Arc;

/// CLI for module-publisher: publish pinned module versions to a bucket.
#[derive(Parser)]
#[clap(
    name = "module-publisher",
    version,
    about = "Publish module archives and READMEs to object storage and update the version ledger"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archive, upload and record every module version not yet in the ledger
    Publish(PublishArgs),
    /// Reject index edits that change `version` or `commit` without the other
    CheckIndex {
        /// Index after the change
        #[clap(long, default_value = "cfbs.json")]
        new: PathBuf,
        /// Index before the change
        #[clap(long, default_value = "cfbs.old.json")]
        old: PathBuf,
    },
}

#[derive(Debug, Default, Args)]
pub struct PublishArgs {
    /// Directory holding the module index and the version ledger
    #[clap(long, env = "workdir")]
    pub workdir: Option<PathBuf>,
    /// Destination bucket
    #[clap(long, env = "BUCKET_NAME")]
    pub bucket: Option<String>,
    /// Base URL reported for uploaded objects
    #[clap(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,
    /// Maximum number of uploads in flight
    #[clap(long)]
    pub upload_concurrency: Option<usize>,
    /// Optional YAML file with defaults for the options above
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish(args) => {
            let config = resolve_config(args)?;
            config.publish.trace_loaded();
            tracing::info!(
                command = "publish",
                bucket = %config.storage.bucket,
                "Starting publishing run"
            );

            let store = S3Store::new(&config.storage);
            let report = publish(&config.publish, Arc::new(GitCli::new()), &store).await?;
            tracing::info!(
                command = "publish",
                added = report.added.len(),
                skipped = report.skipped,
                uploaded = report.uploaded.len(),
                "Publishing complete"
            );
            Ok(())
        }
        Commands::CheckIndex { new, old } => {
            let violations = check_index_files(&new, &old)?;
            if violations.is_empty() {
                tracing::info!(command = "check-index", "Index changes are consistent");
                return Ok(());
            }
            let rendered: Vec<String> = violations.iter().map(|v| format!("Error: {v}")).collect();
            bail!(rendered.join("\n"))
        }
    }
}
