//! Error type shared by every stage of the publishing pipeline.
//!
//! All failures are fatal: the CLI prints the error and exits. Variants carry
//! enough context (path, module, repository, commit) to diagnose the failing
//! step without re-running.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, PublishError>;

/// A single failed upload inside an aggregated [`PublishError::Upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    /// Destination key of the object that could not be stored.
    pub key: String,
    /// Rendered error returned by the object store.
    pub message: String,
}

#[derive(Debug, Error)]
pub enum PublishError {
    /// An input file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input file is not valid JSON.
    #[error("failed to parse {path}: {source}")]
    ParseInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The module index has no `index` object.
    #[error("invalid module index {path}: {reason}")]
    InvalidIndex { path: PathBuf, reason: String },

    /// A module descriptor in the index has the wrong shape.
    #[error("invalid descriptor for module {module}: {source}")]
    InvalidModule {
        module: String,
        #[source]
        source: serde_json::Error,
    },

    /// The ledger document is not a JSON object.
    #[error("invalid version ledger {path}: {reason}")]
    InvalidLedger { path: PathBuf, reason: String },

    /// A new version cannot be added to the ledger without altering
    /// existing content.
    #[error("cannot record {module} {version} in the version ledger: {reason}")]
    LedgerEntry {
        module: String,
        version: String,
        reason: String,
    },

    /// A module selected for publishing lacks a required attribute.
    #[error("{module} module does not have {field}")]
    MissingField { module: String, field: &'static str },

    /// The scratch directory could not be reset.
    #[error("failed to prepare workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A git command exited unsuccessfully.
    #[error("git {operation} failed for {target} {commit}: {message}")]
    Git {
        operation: &'static str,
        /// Repository URL for clone/checkout/fetch, module name for archive.
        target: String,
        commit: String,
        message: String,
    },

    /// The git executable could not be started.
    #[error("failed to launch git {operation}: {source}")]
    GitSpawn {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A produced file could not be read back for hashing.
    #[error("failed to hash {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The README scan could not list the module directory.
    #[error("failed to scan {path} for a README: {source}")]
    ReadmeScan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more uploads in the task group failed.
    #[error("{} upload(s) failed: {}", .failures.len(), render_failures(.failures))]
    Upload { failures: Vec<UploadFailure> },

    /// The blocking module loop did not run to completion.
    #[error("module processing task failed: {source}")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },

    /// The ledger or commit message could not be written.
    #[error("failed to persist outputs: {}", .failures.join("; "))]
    Persist { failures: Vec<String> },
}

fn render_failures(failures: &[UploadFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.key, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
