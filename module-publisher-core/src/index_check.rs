//! Consistency check between two revisions of the module index.
//!
//! A release must bump `version` and `commit` together. Modules that are new,
//! removed, or lack either attribute on either side are ignored here.

use crate::error::Result;
use crate::manifest::{load_index, ModuleIndex};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexChangeViolation {
    VersionChangedWithoutCommit { module: String },
    CommitChangedWithoutVersion { module: String },
}

impl fmt::Display for IndexChangeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionChangedWithoutCommit { module } => write!(
                f,
                "Attribute 'version' was changed, but not 'commit'; in module '{module}'"
            ),
            Self::CommitChangedWithoutVersion { module } => write!(
                f,
                "Attribute 'commit' was changed but not 'version'; in module '{module}'"
            ),
        }
    }
}

pub fn compare_index_changes(new: &ModuleIndex, old: &ModuleIndex) -> Vec<IndexChangeViolation> {
    let mut violations = Vec::new();
    for (name, new_module) in &new.modules {
        let Some(old_module) = old.get(name) else {
            continue;
        };
        let (Some(new_version), Some(new_commit), Some(old_version), Some(old_commit)) = (
            new_module.version.as_deref(),
            new_module.commit.as_deref(),
            old_module.version.as_deref(),
            old_module.commit.as_deref(),
        ) else {
            continue;
        };

        let version_changed = new_version != old_version;
        let commit_changed = new_commit != old_commit;
        if version_changed && !commit_changed {
            violations.push(IndexChangeViolation::VersionChangedWithoutCommit {
                module: name.clone(),
            });
        } else if commit_changed && !version_changed {
            violations.push(IndexChangeViolation::CommitChangedWithoutVersion {
                module: name.clone(),
            });
        }
    }
    violations
}

/// Loads two index files and compares them.
pub fn check_index_files(new_path: &Path, old_path: &Path) -> Result<Vec<IndexChangeViolation>> {
    let new = load_index(new_path)?;
    let old = load_index(old_path)?;
    let violations = compare_index_changes(&new, &old);
    for violation in &violations {
        warn!(%violation, "Index change rejected");
    }
    info!(
        modules = new.len(),
        violations = violations.len(),
        "Index change check finished"
    );
    Ok(violations)
}
