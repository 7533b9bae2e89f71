//! confstack: Compose layered configuration documents
//!
//! This tool composes hierarchical, override-composing configuration documents
//! into a single resolved configuration for experiment and training runs.

use anyhow::Result;

fn main() -> Result<()> {
    confstack::cli::run()
}
