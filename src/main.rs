//! repo-insight: turn a project's files into a validated analysis
//!
//! Selects the most important files under a token budget, builds the analysis
//! prompt, and recovers a typed result from unreliable generator output.

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    cli::run()
}
