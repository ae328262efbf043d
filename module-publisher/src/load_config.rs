//! `load_config` module: merges the optional YAML file, command-line flags and
//! environment variables into the settings a publishing run needs.
//!
//! Precedence, highest first: command-line flag, environment variable (both
//! resolved by clap), YAML file, built-in default. Secrets are never read
//! from the YAML file; credentials come from the environment only (see
//! [`crate::upload`]).
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.

use crate::cli::PublishArgs;
use anyhow::{anyhow, Result};
use module_publisher_core::config::PublishConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Shape of the optional YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub workdir: Option<PathBuf>,
    pub index_file: Option<String>,
    pub ledger_file: Option<String>,
    pub commit_message_file: Option<String>,
    pub scratch_dir: Option<String>,
    pub upload_concurrency: Option<usize>,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct StorageSection {
    pub bucket: Option<String>,
    pub public_base_url: Option<String>,
}

/// Where uploaded objects go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub bucket: String,
    pub public_base_url: Option<String>,
}

#[derive(Debug)]
pub struct CliConfig {
    pub publish: PublishConfig,
    pub storage: StorageSettings,
}

/// Loads a static YAML config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Combines command-line/environment values with the optional YAML file.
pub fn resolve_config(args: PublishArgs) -> Result<CliConfig> {
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };

    let workdir = args.workdir.or(file.workdir).ok_or_else(|| {
        anyhow!(
            "working directory is not set; pass --workdir or set the `workdir` environment \
             variable"
        )
    })?;
    let bucket = args.bucket.or(file.storage.bucket).ok_or_else(|| {
        anyhow!("bucket is not set; pass --bucket or set the BUCKET_NAME environment variable")
    })?;

    let mut publish = PublishConfig::new(workdir);
    if let Some(index_file) = file.index_file {
        publish.index_file = index_file;
    }
    if let Some(ledger_file) = file.ledger_file {
        publish.ledger_file = ledger_file;
    }
    if let Some(commit_message_file) = file.commit_message_file {
        publish.commit_message_file = commit_message_file;
    }
    if let Some(scratch_dir) = file.scratch_dir {
        publish.scratch_dir = scratch_dir;
    }
    if let Some(concurrency) = args.upload_concurrency.or(file.upload_concurrency) {
        publish.upload_concurrency = concurrency;
    }

    Ok(CliConfig {
        publish,
        storage: StorageSettings {
            bucket,
            public_base_url: args.public_base_url.or(file.storage.public_base_url),
        },
    })
}
