//! Document file parsing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ComposeError, ComposeResult};

use super::value::{Mapping, Value};

/// One parsed configuration document: its `defaults` list (raw, interpreted by
/// the composer) and the remaining top-level keys.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    /// Source file, or a synthetic label for documents built in memory.
    pub path: PathBuf,
    /// The raw `defaults` node, if the document has one.
    pub defaults: Option<Value>,
    /// Top-level keys excluding `defaults`.
    pub body: Mapping,
}

impl ConfigDocument {
    /// An empty in-memory document, used by callers that assemble their own
    /// defaults list instead of reading an entry file.
    pub fn synthetic(label: &str) -> Self {
        Self { path: PathBuf::from(label), defaults: None, body: Mapping::new() }
    }
}

/// Read and parse a document from disk.
pub fn load_document(path: &Path) -> ComposeResult<ConfigDocument> {
    let content = fs::read_to_string(path)
        .map_err(|source| ComposeError::Io { path: path.to_path_buf(), source })?;
    parse_document(&content, path)
}

/// Parse document text. The root must be a mapping (or empty).
pub fn parse_document(content: &str, path: &Path) -> ComposeResult<ConfigDocument> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|source| ComposeError::Parse { path: path.to_path_buf(), source })?;

    let value = Value::from_yaml(raw)
        .map_err(|reason| ComposeError::InvalidDocument { path: path.to_path_buf(), reason })?;

    let mut body = match value {
        Value::Map(map) => map,
        Value::Null => Mapping::new(),
        other => {
            return Err(ComposeError::InvalidDocument {
                path: path.to_path_buf(),
                reason: format!("document root must be a mapping, found {}", other.kind()),
            })
        }
    };

    let defaults = body.remove("defaults");
    Ok(ConfigDocument { path: path.to_path_buf(), defaults, body })
}
