//! Command-line interface for confstack
//!
//! Provides `compose`, `info`, `guided`, and `completions` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod completions;
mod compose;
mod guided;
mod info;
mod utils;

/// Compose layered configuration documents into one resolved configuration
#[derive(Parser)]
#[command(name = "confstack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose an entry document into a resolved configuration
    Compose(Box<compose::ComposeArgs>),

    /// Display config root information without composing
    Info(info::InfoArgs),

    /// Interactively pick one document per group and compose the result
    Guided(guided::GuidedArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Compose(args) => compose::run(*args),
        Commands::Info(args) => info::run(args),
        Commands::Guided(args) => guided::run(args),
        Commands::Completions(args) => completions::run(args),
    }
}
