use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_INDEX_FILE: &str = "cfbs.json";
pub const DEFAULT_LEDGER_FILE: &str = "versions.json";
pub const DEFAULT_COMMIT_MESSAGE_FILE: &str = "commitMsg.txt";
pub const DEFAULT_SCRATCH_DIR: &str = "tmp";

/// Where the pipeline reads its inputs and writes its outputs.
///
/// Every file name is resolved relative to `workdir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    pub workdir: PathBuf,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_ledger_file")]
    pub ledger_file: String,
    #[serde(default = "default_commit_message_file")]
    pub commit_message_file: String,
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,
    /// Maximum number of uploads in flight at once.
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
}

impl PublishConfig {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            index_file: default_index_file(),
            ledger_file: default_ledger_file(),
            commit_message_file: default_commit_message_file(),
            scratch_dir: default_scratch_dir(),
            upload_concurrency: default_upload_concurrency(),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.workdir.join(&self.index_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.workdir.join(&self.ledger_file)
    }

    pub fn commit_message_path(&self) -> PathBuf {
        self.workdir.join(&self.commit_message_file)
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.workdir.join(&self.scratch_dir)
    }

    pub fn trace_loaded(&self) {
        info!(
            workdir = %self.workdir.display(),
            index = %self.index_file,
            ledger = %self.ledger_file,
            upload_concurrency = self.upload_concurrency,
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}

fn default_index_file() -> String {
    DEFAULT_INDEX_FILE.to_string()
}

fn default_ledger_file() -> String {
    DEFAULT_LEDGER_FILE.to_string()
}

fn default_commit_message_file() -> String {
    DEFAULT_COMMIT_MESSAGE_FILE.to_string()
}

fn default_scratch_dir() -> String {
    DEFAULT_SCRATCH_DIR.to_string()
}

fn default_upload_concurrency() -> usize {
    1
}
