//! The version ledger and the commit message written alongside it.
//!
//! The ledger maps module name → version label → [`VersionRecord`]. Content
//! already on disk is kept verbatim, including fields this crate does not know
//! about; new versions are appended and never overwrite an existing entry.

use crate::error::{PublishError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

/// Metadata recorded for one published module version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub commit: String,
    /// Milliseconds since the Unix epoch at which the record was created.
    pub timestamp: u64,
    pub archive_url: String,
    pub archive_sha256: String,
    pub readme_url: Option<String>,
    pub readme_sha256: Option<String>,
    pub steps: Vec<String>,
    pub subdirectory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: Map<String, Value>,
}

impl Ledger {
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn contains(&self, module: &str, version: &str) -> bool {
        self.entries
            .get(module)
            .and_then(Value::as_object)
            .is_some_and(|versions| versions.contains_key(version))
    }

    /// Typed view of a stored record, if present and well formed.
    pub fn record(&self, module: &str, version: &str) -> Option<VersionRecord> {
        let raw = self.entries.get(module)?.get(version)?;
        serde_json::from_value(raw.clone()).ok()
    }

    /// Appends a record.
    ///
    /// Fails without touching the ledger when the (module, version) pair
    /// already exists or when the module entry is not an object of versions.
    pub fn insert(&mut self, module: &str, version: &str, record: &VersionRecord) -> Result<()> {
        let refuse = |reason: String| {
            warn!(module, version, reason = %reason, "Refusing to change ledger entry");
            PublishError::LedgerEntry {
                module: module.to_string(),
                version: version.to_string(),
                reason,
            }
        };
        if self.contains(module, version) {
            return Err(refuse("version is already recorded".to_string()));
        }
        let value = serde_json::to_value(record).map_err(|e| {
            error!(error = ?e, module, version, "Failed to serialise version record");
            refuse(format!("record cannot be serialised: {e}"))
        })?;
        match self
            .entries
            .entry(module.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(versions) => {
                versions.insert(version.to_string(), value);
                Ok(())
            }
            other => Err(refuse(format!("existing entry is not an object: {other}"))),
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn render(&self) -> std::result::Result<String, serde_json::Error> {
        let mut rendered = serde_json::to_string_pretty(&self.entries)?;
        rendered.push('\n');
        Ok(rendered)
    }
}

/// Human-readable summary of what a run added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    lines: Vec<String>,
}

impl CommitMessage {
    pub fn new(ledger_file: &str) -> Self {
        Self {
            lines: vec![format!("Updated {ledger_file}\n")],
        }
    }

    pub fn record_added(&mut self, module: &str, version: &str) {
        self.lines.push(format!("- Added {module} {version} version"));
    }

    pub fn added_count(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Writes the ledger and then the commit message.
///
/// Both writes are attempted even if the first fails; there is no rollback.
pub fn persist(
    ledger_path: &Path,
    ledger: &Ledger,
    message_path: &Path,
    message: &CommitMessage,
) -> Result<()> {
    let mut failures = Vec::new();

    match ledger.render() {
        Ok(rendered) => match fs::write(ledger_path, rendered) {
            Ok(()) => info!(path = %ledger_path.display(), "Wrote version ledger"),
            Err(e) => {
                error!(error = ?e, path = %ledger_path.display(), "Failed to write version ledger");
                failures.push(format!("{}: {e}", ledger_path.display()));
            }
        },
        Err(e) => {
            error!(error = ?e, "Failed to serialise version ledger");
            failures.push(format!("{}: {e}", ledger_path.display()));
        }
    }

    match fs::write(message_path, message.render()) {
        Ok(()) => info!(
            path = %message_path.display(),
            added = message.added_count(),
            "Wrote commit message"
        ),
        Err(e) => {
            error!(error = ?e, path = %message_path.display(), "Failed to write commit message");
            failures.push(format!("{}: {e}", message_path.display()));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(PublishError::Persist { failures })
    }
}
