//! Interactive guided composition.

use anyhow::Result;
use clap::Args;
use console::style;
use dialoguer::{theme::ColorfulTheme, Select};
use std::fs;
use std::path::{Path, PathBuf};

use super::utils::resolve_format;
use crate::compose::Composer;
use crate::document::{ConfigDocument, Mapping, Value};
use crate::registry::DocumentRegistry;
use crate::render;

const SKIP_CHOICE: &str = "(skip)";

#[derive(Args)]
pub struct GuidedArgs {
    /// Config root directory
    #[arg(value_name = "PATH", default_value = ".")]
    pub config_root: PathBuf,

    /// Output format: yaml or json
    #[arg(short, long, value_name = "FMT")]
    pub format: Option<String>,

    /// Write the resolved configuration to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: GuidedArgs) -> Result<()> {
    let root = args.config_root.canonicalize()?;
    let registry = DocumentRegistry::new(root.clone());
    let groups = registry.groups()?;
    if groups.is_empty() {
        anyhow::bail!("No document groups under {}", root.display());
    }

    print_preview(&root, &registry, &groups)?;

    let mut picked: Vec<Value> = Vec::new();
    for group in &groups {
        let documents = registry.documents_in(group)?;
        let label = if group.is_empty() { "(root)" } else { group.as_str() };

        let mut items: Vec<&str> = documents.iter().map(String::as_str).collect();
        items.push(SKIP_CHOICE);

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Pick a document for {label}"))
            .default(0)
            .items(&items)
            .interact()?;
        if selection >= documents.len() {
            continue;
        }
        let name = documents[selection].clone();

        if group.is_empty() {
            picked.push(Value::Str(name));
        } else {
            let mut directive = Mapping::new();
            directive.insert(group.clone(), Value::Str(name));
            picked.push(Value::Map(directive));
        }
    }

    if picked.is_empty() {
        anyhow::bail!("Nothing selected, nothing to compose");
    }

    let mut entry = ConfigDocument::synthetic("<guided>");
    entry.defaults = Some(Value::Seq(picked));

    let mut composer = Composer::new(&root);
    let resolved = composer.compose_document(entry)?;

    println!();
    println!("{}", style("Composed from:").bold());
    for directive in composer.applied_directives() {
        println!("  {directive}");
    }
    println!();

    let format = resolve_format(args.format.as_deref())?;
    let rendered = render::render(resolved.root(), format)?;
    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &rendered)?;
            println!("Resolved configuration written to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

fn print_preview(root: &Path, registry: &DocumentRegistry, groups: &[String]) -> Result<()> {
    let root_name = root.file_name().and_then(|n| n.to_str()).unwrap_or("configs");
    let mut total_documents = 0;
    for group in groups {
        total_documents += registry.documents_in(group)?.len();
    }

    println!();
    println!("Guided composition for '{root_name}'");
    println!("  Groups:    {}", groups.len());
    println!("  Documents: {total_documents}");
    println!();
    Ok(())
}
