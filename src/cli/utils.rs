//! Shared CLI utilities.

use anyhow::Result;

use crate::render::OutputFormat;

/// Resolve an output format name, defaulting to YAML when absent.
pub fn resolve_format(name: Option<&str>) -> Result<OutputFormat> {
    match name {
        None => Ok(OutputFormat::Yaml),
        Some(name) => OutputFormat::parse(name).ok_or_else(|| {
            anyhow::anyhow!("Invalid output format '{name}' (expected yaml or json)")
        }),
    }
}
