//! Reading the module index and the existing version ledger.
//!
//! The index is a `{ "index": { <name>: <descriptor> } }` document. Module order
//! follows the file, which matters because processing is fail-fast.

use crate::error::{PublishError, Result};
use crate::ledger::Ledger;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// One entry of the module index.
///
/// Every attribute is optional when parsing: alias entries carry little more
/// than `alias`. Required attributes are enforced when a module is published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub commit: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub subdirectory: Option<String>,
    #[serde(default)]
    pub steps: Option<Vec<String>>,
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub alias: Option<Value>,
    #[serde(default)]
    pub by: Option<String>,
}

impl ModuleDescriptor {
    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }

    /// Subdirectory to publish, if one is configured and non-empty.
    pub fn subdirectory(&self) -> Option<&str> {
        self.subdirectory.as_deref().filter(|s| !s.is_empty())
    }
}

/// Modules in the order they appear in the index file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleIndex {
    pub modules: Vec<(String, ModuleDescriptor)>,
}

impl ModuleIndex {
    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules
            .iter()
            .find(|(module_name, _)| module_name == name)
            .map(|(_, module)| module)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| {
        error!(error = ?source, path = %path.display(), "Failed to read input file");
        PublishError::ReadInput {
            path: path.to_path_buf(),
            source,
        }
    })?;
    serde_json::from_str(&content).map_err(|source| {
        error!(error = ?source, path = %path.display(), "Failed to parse input JSON");
        PublishError::ParseInput {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Loads the module index from `path`.
pub fn load_index(path: &Path) -> Result<ModuleIndex> {
    let document = read_json(path)?;
    let entries = match document.get("index") {
        Some(Value::Object(entries)) => entries,
        Some(_) => {
            return Err(PublishError::InvalidIndex {
                path: path.to_path_buf(),
                reason: "`index` is not an object".to_string(),
            })
        }
        None => {
            return Err(PublishError::InvalidIndex {
                path: path.to_path_buf(),
                reason: "missing `index` object".to_string(),
            })
        }
    };

    let mut modules = Vec::with_capacity(entries.len());
    for (name, raw) in entries {
        let module: ModuleDescriptor =
            serde_json::from_value(raw.clone()).map_err(|source| PublishError::InvalidModule {
                module: name.clone(),
                source,
            })?;
        modules.push((name.clone(), module));
    }

    info!(path = %path.display(), modules = modules.len(), "Loaded module index");
    Ok(ModuleIndex { modules })
}

/// Loads the version ledger from `path`. An empty object is a valid ledger.
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    match read_json(path)? {
        Value::Object(entries) => {
            info!(path = %path.display(), modules = entries.len(), "Loaded version ledger");
            Ok(Ledger::from_map(entries))
        }
        other => Err(PublishError::InvalidLedger {
            path: path.to_path_buf(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
