//! Key command implementation

use anyhow::Result;
use clap::Args;

use repo_insight::cache::AnalysisCache;
use repo_insight::service::AnalysisReport;

#[derive(Args)]
pub struct KeyArgs {
    /// Source locator, e.g. a repository URL
    pub locator: String,

    /// Content version, e.g. a commit SHA
    #[arg(id = "content_version", value_name = "VERSION")]
    pub version: String,
}

pub fn run(args: KeyArgs) -> Result<()> {
    println!("{}", AnalysisCache::<AnalysisReport>::generate_key(&args.locator, &args.version));
    Ok(())
}
