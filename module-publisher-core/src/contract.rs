//! # contract: seams between the pipeline and the outside world
//!
//! The pipeline talks to two external collaborators: a source-control tool
//! that can materialise and archive a commit, and an object store that accepts
//! public uploads. Both are traits so the CLI can plug in real clients and
//! tests can plug in fakes or `mockall` mocks (exported with the
//! `test-export-mocks` feature).

use crate::error::Result;
use async_trait::async_trait;
use mockall::automock;
use std::path::{Path, PathBuf};

/// Error type for [`ObjectStore`] implementations.
pub type UploadError = Box<dyn std::error::Error + Send + Sync>;

/// A file waiting to be uploaded under a deterministic key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub local_path: PathBuf,
    pub key: String,
}

/// An object that was stored successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub key: String,
    /// Public location reported by the store.
    pub location: String,
}

/// Materialises and archives repository commits.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait SourceControl: Send + Sync {
    /// Clone `repo` into `dest` and check out `commit`, including tags.
    fn checkout(&self, repo: &str, commit: &str, dest: &Path) -> Result<()>;

    /// Write a gzip tarball of `commit` (or of `subdirectory` within it,
    /// prefixed with the subdirectory name) to `output`. `module` names the
    /// archive in errors.
    fn archive(
        &self,
        module: &str,
        checkout_dir: &Path,
        commit: &str,
        subdirectory: Option<String>,
        output: &Path,
    ) -> Result<()>;
}

/// Destination bucket for published files.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `local_path` under `key` with public-read visibility and return
    /// the public location of the object.
    async fn put_public(
        &self,
        local_path: &Path,
        key: &str,
    ) -> std::result::Result<String, UploadError>;
}
