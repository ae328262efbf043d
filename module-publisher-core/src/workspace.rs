use crate::error::{PublishError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

/// Deletes and recreates the scratch directory used for checkouts.
///
/// Not safe against concurrent runs sharing the same directory.
pub fn reset_workspace(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|source| {
            error!(error = ?source, path = %path.display(), "Failed to remove scratch directory");
            PublishError::Workspace {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(path = %path.display(), "Removed existing scratch directory");
    }
    fs::create_dir_all(path).map_err(|source| {
        error!(error = ?source, path = %path.display(), "Failed to create scratch directory");
        PublishError::Workspace {
            path: path.to_path_buf(),
            source,
        }
    })?;
    info!(path = %path.display(), "Scratch directory ready");
    Ok(())
}
