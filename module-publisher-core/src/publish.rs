//! High-level pipeline: orchestrates checkout → archive/README → upload → ledger.
//!
//! One call to [`publish`] performs a full release run:
//!   - Reads the module index and the existing version ledger
//!   - Resets the scratch directory
//!   - For every module not yet in the ledger, checks out the pinned commit,
//!     collects its README and builds its archive
//!   - Uploads all collected files as a single task group
//!   - Writes the updated ledger and the commit message
//!
//! # Error Handling
//! Every step is fail-fast. A failure after some files were uploaded leaves
//! the bucket ahead of the ledger; re-running republishes those versions.
//!
//! # Navigation
//! - Main entrypoint: [`publish`]
//! - Module loop without I/O on the ledger files: [`process_modules`]. It
//!   shells out to git, so [`publish`] runs it on the blocking thread pool.

use crate::artifact::{collect_readme, create_archive};
use crate::checkout::checkout_path;
use crate::config::PublishConfig;
use crate::contract::{ObjectStore, SourceControl, UploadTask, UploadedObject};
use crate::error::{PublishError, Result};
use crate::ledger::{now_millis, persist, CommitMessage, Ledger, VersionRecord};
use crate::manifest::{load_index, load_ledger, ModuleDescriptor, ModuleIndex};
use crate::upload::dispatch_uploads;
use crate::workspace::reset_workspace;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// A module version added during this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedVersion {
    pub module: String,
    pub version: String,
}

/// Outcome of the module loop: what was added and what must be uploaded.
#[derive(Debug)]
pub struct ProcessedBatch {
    pub added: Vec<AddedVersion>,
    pub skipped: usize,
    pub uploads: Vec<UploadTask>,
    pub commit_message: CommitMessage,
}

#[derive(Debug)]
pub struct PublishReport {
    pub added: Vec<AddedVersion>,
    pub skipped: usize,
    pub uploaded: Vec<UploadedObject>,
}

fn required<'a>(name: &str, value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            error!(module = name, field, "Module is missing a required attribute");
            Err(PublishError::MissingField {
                module: name.to_string(),
                field,
            })
        }
    }
}

fn process_module<S>(
    scm: &S,
    scratch: &Path,
    name: &str,
    module: &ModuleDescriptor,
    commit: &str,
    uploads: &mut Vec<UploadTask>,
) -> Result<VersionRecord>
where
    S: SourceControl + ?Sized,
{
    let repo = required(name, module.repo.as_deref(), "repo")?;
    let dest = checkout_path(scratch, name);
    info!(module = name, repo, commit, path = %dest.display(), "Checking out module");
    scm.checkout(repo, commit, &dest)?;

    let subdirectory = module.subdirectory();
    let readme = collect_readme(name, commit, subdirectory, &dest, uploads)?;
    let archive = create_archive(scm, name, commit, subdirectory, &dest, uploads)?;

    let (readme_url, readme_sha256) = match readme {
        Some(readme) => (Some(readme.url), Some(readme.sha256)),
        None => (None, None),
    };
    Ok(VersionRecord {
        commit: commit.to_string(),
        timestamp: now_millis(),
        archive_url: archive.url,
        archive_sha256: archive.sha256,
        readme_url,
        readme_sha256,
        steps: module.steps.clone().unwrap_or_default(),
        subdirectory: module.subdirectory.clone().unwrap_or_default(),
        by: module.by.clone(),
        repo: repo.to_string(),
        dependencies: module.dependencies.clone().filter(|deps| !deps.is_empty()),
    })
}

/// Processes every module of `index` that is neither an alias nor already
/// recorded in `ledger`, appending new records to `ledger`.
pub fn process_modules<S>(
    index: &ModuleIndex,
    ledger: &mut Ledger,
    scm: &S,
    scratch: &Path,
    ledger_file: &str,
) -> Result<ProcessedBatch>
where
    S: SourceControl + ?Sized,
{
    let mut batch = ProcessedBatch {
        added: Vec::new(),
        skipped: 0,
        uploads: Vec::new(),
        commit_message: CommitMessage::new(ledger_file),
    };

    for (name, module) in &index.modules {
        if module.is_alias() {
            debug!(module = %name, "Skipping alias");
            batch.skipped += 1;
            continue;
        }
        if let Some(version) = module.version.as_deref() {
            if ledger.contains(name, version) {
                debug!(module = %name, version, "Version already published, skipping");
                batch.skipped += 1;
                continue;
            }
        }

        let commit = required(name, module.commit.as_deref(), "commit")?;
        let version = required(name, module.version.as_deref(), "version")?;

        let record = process_module(scm, scratch, name, module, commit, &mut batch.uploads)?;
        ledger.insert(name, version, &record)?;
        batch.commit_message.record_added(name, version);
        batch.added.push(AddedVersion {
            module: name.clone(),
            version: version.to_string(),
        });
        info!(module = %name, version, commit, "Module version processed");
    }

    Ok(batch)
}

/// Runs the full publishing pipeline for `config`.
pub async fn publish<S, O>(config: &PublishConfig, scm: Arc<S>, store: &O) -> Result<PublishReport>
where
    S: SourceControl + ?Sized + 'static,
    O: ObjectStore + ?Sized,
{
    info!("[PUBLISH] Starting publishing pipeline");
    let index = load_index(&config.index_path())?;
    let mut ledger = load_ledger(&config.ledger_path())?;

    let scratch = config.scratch_path();
    reset_workspace(&scratch)?;

    let ledger_file = config.ledger_file.clone();
    let (ledger, batch) = tokio::task::spawn_blocking(move || {
        let batch = process_modules(&index, &mut ledger, scm.as_ref(), &scratch, &ledger_file)?;
        Ok::<_, PublishError>((ledger, batch))
    })
    .await
    .map_err(|source| {
        error!(error = %source, "[PUBLISH] Module processing task did not complete");
        PublishError::Task { source }
    })??;

    if batch.uploads.is_empty() {
        info!(skipped = batch.skipped, "[PUBLISH] Nothing new to publish");
        return Ok(PublishReport {
            added: batch.added,
            skipped: batch.skipped,
            uploaded: Vec::new(),
        });
    }

    let uploaded = dispatch_uploads(store, &batch.uploads, config.upload_concurrency).await?;
    info!(count = uploaded.len(), "[PUBLISH] Uploads complete");

    persist(
        &config.ledger_path(),
        &ledger,
        &config.commit_message_path(),
        &batch.commit_message,
    )?;

    info!(
        added = batch.added.len(),
        skipped = batch.skipped,
        "[PUBLISH] Publishing complete"
    );
    Ok(PublishReport {
        added: batch.added,
        skipped: batch.skipped,
        uploaded,
    })
}
