//! Command-line interface for repo-insight

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repo_insight::config::{load_settings, Settings};

mod analyze;
mod chat;
mod key;
mod parse;
mod select;
mod settings;
mod utils;

/// Select, prompt and parse project analyses
#[derive(Parser)]
#[command(name = "repo-insight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to ./repo-insight.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory and show which files fit the token budget
    Select(select::SelectArgs),

    /// Recover and validate a recorded generator response
    Parse(parse::ParseArgs),

    /// Run the full analysis pipeline against a recorded response
    Analyze(analyze::AnalyzeArgs),

    /// Print a follow-up prompt for a question about a previous analysis
    Chat(chat::ChatArgs),

    /// Print the cache key for a locator and content version
    Key(key::KeyArgs),

    /// Show effective settings and any problems with them
    Config(settings::ConfigArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

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

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Select(args) => select::run(args, &settings(config)?),
        Commands::Parse(args) => parse::run(args),
        Commands::Analyze(args) => analyze::run(args, &settings(config)?),
        Commands::Chat(args) => chat::run(args),
        Commands::Key(args) => key::run(args),
        Commands::Config(args) => settings::run(args, &settings(config)?),
    }
}

fn settings(config: Option<&Path>) -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    load_settings(&cwd, config)
}
