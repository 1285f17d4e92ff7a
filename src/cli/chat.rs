//! Chat command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::read_input;
use repo_insight::llm::{build_chat_prompt, parse_and_validate_analysis_response};
use repo_insight::scan::FileScanner;

#[derive(Args)]
pub struct ChatArgs {
    /// The follow-up question
    #[arg(value_name = "MESSAGE")]
    pub message: String,

    /// Recorded response of the previous analysis (reads stdin when `-`)
    #[arg(long, value_name = "FILE")]
    pub previous: PathBuf,

    /// Project directory whose files are listed in the prompt
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,
}

pub fn run(args: ChatArgs) -> Result<()> {
    if args.message.trim().is_empty() {
        anyhow::bail!("Message must not be empty");
    }

    let text = read_input(Some(args.previous.as_path()))?;
    let previous = parse_and_validate_analysis_response(&text)
        .with_context(|| format!("Previous analysis in {} is unusable", args.previous.display()))?;

    let files = match &args.path {
        Some(path) => Some(FileScanner::new(path.canonicalize()?).scan()?),
        None => None,
    };

    print!("{}", build_chat_prompt(&args.message, &previous, files.as_deref())?);
    Ok(())
}
