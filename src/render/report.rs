//! Composition report JSON generation.

use crate::compose::ComposeStats;
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Write a machine-readable record of one composition run.
pub fn write_report(
    report_path: &Path,
    entry: &Path,
    applied_directives: &[String],
    stats: &ComposeStats,
    fingerprint: &str,
    include_timestamp: bool,
) -> Result<()> {
    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert("entry".to_string(), Value::String(entry.display().to_string()));
    report.insert("directives".to_string(), serde_json::to_value(applied_directives)?);
    report.insert(
        "stats".to_string(),
        json!({
            "documents_loaded": stats.documents_loaded,
            "directives_applied": stats.directives_applied,
            "overrides_applied": stats.overrides_applied,
            "interpolations_resolved": stats.interpolations_resolved,
            "deferred_remaining": stats.deferred_remaining,
        }),
    );
    report.insert("fingerprint".to_string(), Value::String(fingerprint.to_string()));

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(report))?)?;
    Ok(())
}
