//! Info command implementation

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::compose::parse_defaults;
use crate::document::load_document;
use crate::registry::DocumentRegistry;

#[derive(Args)]
pub struct InfoArgs {
    /// Config root directory to inspect
    #[arg(value_name = "PATH", default_value = ".")]
    pub config_root: PathBuf,

    /// Entry document whose defaults list to preview
    #[arg(long, value_name = "FILE")]
    pub entry: Option<PathBuf>,
}

pub fn run(args: InfoArgs) -> Result<()> {
    let root = args.config_root.canonicalize()?;
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let registry = DocumentRegistry::new(root.clone());
    let groups = registry.groups()?;

    println!("Config root: {}", root.display());

    let mut total_documents = 0;
    if !groups.is_empty() {
        println!("{}", style("Groups:").bold());
        for group in &groups {
            let documents = registry.documents_in(group)?;
            total_documents += documents.len();
            let label = if group.is_empty() { "(root)" } else { group.as_str() };
            println!("  {}: {}", label, documents.join(", "));
        }
    }

    if let Some(entry) = &args.entry {
        let doc = load_document(entry)?;
        let directives = parse_defaults(&doc)?;
        println!("{}", style("Defaults:").bold());
        if directives.is_empty() {
            println!("  (none)");
        }
        for directive in &directives {
            let marker = if directive.name.is_none() { "  (disabled)" } else { "" };
            println!("  {}{}", directive.display(), marker);
        }
        println!("{}", style("Local keys:").bold());
        for key in doc.body.keys() {
            println!("  {key}");
        }
    }

    println!("{}", style("Statistics:").bold());
    println!("  Groups: {}", groups.len());
    println!("  Documents: {total_documents}");

    Ok(())
}
