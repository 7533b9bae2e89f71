//! Compose command implementation

use anyhow::Result;
use clap::Args;
use std::fs;
use std::path::PathBuf;

use super::utils::resolve_format;
use crate::compose::Composer;
use crate::config::load_settings;
use crate::overrides::parse_overrides;
use crate::render::{self, report};

#[derive(Args)]
pub struct ComposeArgs {
    /// Entry document to compose
    #[arg(value_name = "ENTRY")]
    pub entry: PathBuf,

    /// Overrides applied after file composition (dotted.path=value)
    #[arg(value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Config root directory (defaults to the entry document's directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub config_root: Option<PathBuf>,

    /// Output format: yaml or json
    #[arg(short, long, value_name = "FMT")]
    pub format: Option<String>,

    /// Write the resolved configuration to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write a JSON composition report
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Fail if any required (???) value is still unset
    #[arg(long)]
    pub strict: bool,

    /// Print the resolved configuration's fingerprint to stderr
    #[arg(long)]
    pub fingerprint: bool,

    /// Omit the timestamp from the report
    #[arg(long)]
    pub no_timestamp: bool,

    /// Settings file for the tool itself
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,
}

pub fn run(args: ComposeArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = load_settings(&cwd, args.settings.as_deref())?;

    if !args.entry.is_file() {
        anyhow::bail!("Entry document not found: {}", args.entry.display());
    }

    let config_root = args
        .config_root
        .or_else(|| settings.config_root.clone())
        .or_else(|| args.entry.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    let format = resolve_format(args.format.as_deref().or(settings.format.as_deref()))?;

    let overrides = parse_overrides(&args.overrides)?;
    let mut composer = Composer::new(&config_root).runtime_overrides(overrides);
    let resolved = composer.compose(&args.entry)?;

    if args.strict || settings.strict {
        resolved.require_concrete()?;
    }

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

    if args.fingerprint {
        eprintln!("fingerprint: {}", resolved.fingerprint());
    }

    if let Some(report_path) = &args.report {
        report::write_report(
            report_path,
            &args.entry,
            composer.applied_directives(),
            composer.stats(),
            &resolved.fingerprint(),
            !args.no_timestamp,
        )?;
        eprintln!("Composition report written to {}", report_path.display());
    }

    Ok(())
}
