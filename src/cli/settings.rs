//! Config command implementation

use anyhow::Result;
use clap::Args;
use console::style;

use repo_insight::config::Settings;

#[derive(Args)]
pub struct ConfigArgs {
    /// Exit with an error when the settings have problems
    #[arg(long)]
    pub check: bool,
}

pub fn run(args: ConfigArgs, settings: &Settings) -> Result<()> {
    print!("{}", toml::to_string_pretty(&settings.redacted())?);

    let missing = settings.missing_env_vars();
    if !missing.is_empty() {
        eprintln!("{} {}", style("Missing environment variables:").yellow(), missing.join(", "));
    }
    let problems = settings.problems();
    for problem in &problems {
        eprintln!("{} {problem}", style("problem:").red());
    }

    if args.check {
        settings.validate()?;
    }
    Ok(())
}
