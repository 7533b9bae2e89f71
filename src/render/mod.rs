//! Resolved configuration rendering.

pub mod report;

use anyhow::Result;

use crate::document::Value;

/// Output encodings for a resolved tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => to_yaml_string(value),
        OutputFormat::Json => to_json_string(value),
    }
}

/// Canonical YAML rendering; mapping keys come out sorted, deferred values as
/// the `???` marker.
pub fn to_yaml_string(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(&value.to_yaml())?)
}

/// Pretty JSON rendering with a trailing newline.
pub fn to_json_string(value: &Value) -> Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(&value.to_json())?))
}
