//! Per-module artifacts: the source archive and the README.
//!
//! Both artifacts are hashed with SHA-256 and registered as [`UploadTask`]s
//! under `modules/<name>/<commit><suffix>`.

use crate::contract::{SourceControl, UploadTask};
use crate::error::{PublishError, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

// readme, readme.org, readme.md, readme.adoc, readme.rst
static README_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^readme(\.(org|md|adoc|rst))?$").expect("README pattern is valid")
});

/// A published artifact: its object key and content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub url: String,
    pub sha256: String,
}

/// Object key for a file belonging to `module`.
pub fn object_key(module: &str, file_name: &str) -> String {
    format!("modules/{module}/{file_name}")
}

/// Streaming hex SHA-256 of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let hash_err = |source| PublishError::Hash {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(hash_err)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(hash_err)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Archives `commit` (or its `subdirectory`) into `<checkout>/<commit>.tar.gz`.
pub fn create_archive<S>(
    scm: &S,
    module: &str,
    commit: &str,
    subdirectory: Option<&str>,
    checkout_dir: &Path,
    uploads: &mut Vec<UploadTask>,
) -> Result<Artifact>
where
    S: SourceControl + ?Sized,
{
    let file_name = format!("{commit}.tar.gz");
    let local_path = checkout_dir.join(&file_name);
    let subdirectory = subdirectory.map(str::to_string);
    scm.archive(module, checkout_dir, commit, subdirectory, &local_path)?;

    let sha256 = sha256_file(&local_path)?;
    let key = object_key(module, &file_name);
    info!(module, key = %key, sha256 = %sha256, "Archive ready for upload");
    uploads.push(UploadTask {
        local_path,
        key: key.clone(),
    });
    Ok(Artifact { url: key, sha256 })
}

/// Finds the README in `dir`.
///
/// When several files match, a `.md` file wins; otherwise the alphabetically
/// first name is chosen.
pub fn discover_readme(dir: &Path) -> Result<Option<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| PublishError::ReadmeScan {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PublishError::ReadmeScan {
            path: dir.to_path_buf(),
            source,
        })?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if README_PATTERN.is_match(&name) && entry.path().is_file() {
            candidates.push(name);
        }
    }

    if candidates.len() > 1 {
        warn!(dir = %dir.display(), ?candidates, "Multiple README files found");
    }
    candidates.sort();
    let chosen = candidates
        .iter()
        .find(|name| extension_of(name).eq_ignore_ascii_case(".md"))
        .or_else(|| candidates.first());
    debug!(dir = %dir.display(), readme = ?chosen, "README discovery finished");
    Ok(chosen.map(|name| dir.join(name)))
}

/// Extension including the leading dot, or an empty string.
fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[idx..],
        _ => "",
    }
}

/// Locates, hashes and registers the README of a module, if it has one.
pub fn collect_readme(
    module: &str,
    commit: &str,
    subdirectory: Option<&str>,
    checkout_dir: &Path,
    uploads: &mut Vec<UploadTask>,
) -> Result<Option<Artifact>> {
    let scan_dir = match subdirectory {
        Some(sub) => checkout_dir.join(sub),
        None => checkout_dir.to_path_buf(),
    };
    let Some(readme) = discover_readme(&scan_dir)? else {
        info!(module, dir = %scan_dir.display(), "No README found");
        return Ok(None);
    };

    let file_name = readme
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let key = object_key(module, &format!("{commit}{}", extension_of(&file_name)));
    let sha256 = sha256_file(&readme)?;
    info!(module, readme = %readme.display(), key = %key, "README ready for upload");
    uploads.push(UploadTask {
        local_path: readme,
        key: key.clone(),
    });
    Ok(Some(Artifact { url: key, sha256 }))
}
