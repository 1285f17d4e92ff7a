//! Parse command implementation

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use super::utils::read_input;
use repo_insight::error::ParseError;
use repo_insight::llm::{parse_and_validate_analysis_response, parse_json_response};

#[derive(Args)]
pub struct ParseArgs {
    /// Recorded generator output (reads stdin when omitted or `-`)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Only recover the JSON object, skip schema validation
    #[arg(long)]
    pub raw: bool,
}

pub fn run(args: ParseArgs) -> Result<()> {
    let text = read_input(args.file.as_deref())?;

    let output = if args.raw {
        parse_json_response(&text).map(|value| serde_json::to_string_pretty(&value))
    } else {
        parse_and_validate_analysis_response(&text).map(|response| serde_json::to_string_pretty(&response))
    };

    match output {
        Ok(json) => {
            println!("{}", json?);
            Ok(())
        }
        Err(err @ ParseError::Schema { .. }) => {
            eprintln!("{}", style("Schema violations:").red().bold());
            for violation in err.violations() {
                eprintln!("  - {violation}");
            }
            anyhow::bail!("response failed validation with {} problem(s)", err.violations().len())
        }
        Err(err) => Err(err.into()),
    }
}
