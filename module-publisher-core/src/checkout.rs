//! Cloning module repositories at a pinned commit using the `git` binary.

use crate::contract::SourceControl;
use crate::error::{PublishError, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, error, info};

/// Checkout location for `module_name` inside the scratch directory.
///
/// Hashing the module name keeps two repositories with the same display name
/// (hosted on different services) from sharing a directory.
pub fn checkout_path(scratch: &Path, module_name: &str) -> PathBuf {
    let digest = Sha256::digest(module_name.as_bytes());
    scratch.join(format!("{digest:x}"))
}

/// [`SourceControl`] backed by the `git` command line.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

fn run_git(args: &[&str], dir: Option<&Path>, operation: &'static str) -> Result<Output> {
    let mut cmd = Command::new("git");
    cmd.args(args)
        // Fail instead of prompting for credentials on private or missing repos.
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    debug!(operation, ?args, "Running git");
    cmd.output().map_err(|source| {
        error!(error = ?source, operation, "Failed to launch git process");
        PublishError::GitSpawn { operation, source }
    })
}

fn ensure_success(
    output: &Output,
    operation: &'static str,
    target: &str,
    commit: &str,
) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    error!(
        operation,
        target,
        commit,
        status = %output.status,
        stderr = %stderr.trim(),
        "Git exited with non-zero code"
    );
    Err(PublishError::Git {
        operation,
        target: target.to_string(),
        commit: commit.to_string(),
        message: stderr.trim().to_owned(),
    })
}

impl SourceControl for GitCli {
    fn checkout(&self, repo: &str, commit: &str, dest: &Path) -> Result<()> {
        // git would parse an option-like revision as a flag.
        if commit.starts_with('-') {
            error!(repo, commit, "Refusing option-like commit");
            return Err(PublishError::Git {
                operation: "checkout",
                target: repo.to_string(),
                commit: commit.to_string(),
                message: "commit must not start with '-'".to_string(),
            });
        }

        let dest_str = dest.to_string_lossy().into_owned();
        let clone_args = ["clone", "--no-checkout", "--", repo, dest_str.as_str()];
        let output = run_git(&clone_args, None, "clone")?;
        ensure_success(&output, "clone", repo, commit)?;
        info!(repo, path = %dest.display(), "Cloned git repository");

        // The trailing `--` forces `commit` to be read as a revision.
        let output = run_git(&["checkout", commit, "--"], Some(dest), "checkout")?;
        ensure_success(&output, "checkout", repo, commit)?;
        info!(repo, commit, "Checked out commit");

        let output = run_git(&["fetch", "--all", "--tags"], Some(dest), "fetch")?;
        ensure_success(&output, "fetch", repo, commit)?;
        debug!(repo, commit, "Fetched tags");
        Ok(())
    }

    fn archive(
        &self,
        module: &str,
        checkout_dir: &Path,
        commit: &str,
        subdirectory: Option<String>,
        output: &Path,
    ) -> Result<()> {
        let output_str = output.to_string_lossy().into_owned();
        let result = match subdirectory.as_deref() {
            Some(sub) => {
                let tree = format!("{commit}:{sub}");
                let prefix = format!("{sub}/");
                run_git(
                    &[
                        "archive",
                        "--format",
                        "tar.gz",
                        "--prefix",
                        prefix.as_str(),
                        "--output",
                        output_str.as_str(),
                        tree.as_str(),
                    ],
                    Some(checkout_dir),
                    "archive",
                )?
            }
            None => run_git(
                &["archive", "--format", "tar.gz", "--output", output_str.as_str(), commit],
                Some(checkout_dir),
                "archive",
            )?,
        };
        ensure_success(&result, "archive", module, commit)?;
        info!(module, commit, ?subdirectory, archive = %output.display(), "Created archive");
        Ok(())
    }
}
