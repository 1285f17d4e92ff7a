//! Analyze command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::parse_csv;
use repo_insight::config::Settings;
use repo_insight::domain::UserContext;
use repo_insight::llm::ReplayGenerator;
use repo_insight::scan::FileScanner;
use repo_insight::service::{AnalysisRequest, AnalysisService};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Local directory path to analyze
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Recorded generator response to replay
    #[arg(long, value_name = "FILE")]
    pub response: PathBuf,

    /// What the project is about, in the owner's words
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Token budget (defaults to the configured budget)
    #[arg(short, long, value_name = "TOKENS")]
    pub budget: Option<usize>,

    /// Caller identity used for rate limiting
    #[arg(long, default_value = "cli")]
    pub caller: String,

    /// Source locator used for the cache key (defaults to the directory path)
    #[arg(long, value_name = "URL")]
    pub locator: Option<String>,

    /// Content version, e.g. a commit SHA (defaults to a content hash)
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Follow symbolic links while scanning
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Current week of the project, for the prompt's user context
    #[arg(long)]
    pub week: Option<u32>,

    /// Tasks already completed (comma-separated)
    #[arg(long, value_name = "TASKS")]
    pub completed: Option<String>,

    /// The owner's current goal
    #[arg(long)]
    pub goal: Option<String>,
}

pub fn run(args: AnalyzeArgs, settings: &Settings) -> Result<()> {
    let root = args.path.canonicalize()?;
    let mut scanner = FileScanner::new(root.clone()).follow_symlinks(args.follow_symlinks);
    if let Some(globs) = parse_csv(&args.exclude_glob) {
        scanner = scanner.exclude_globs(globs);
    }
    let files = scanner.scan()?;

    let generator = ReplayGenerator::from_file(&args.response, settings.llm_model.clone())?;
    let mut settings = settings.clone();
    if let Some(budget) = args.budget {
        settings.token_budget = budget;
    }
    let service = AnalysisService::new(generator, &settings);

    let completed = parse_csv(&args.completed).unwrap_or_default();
    let user_context = (args.week.is_some() || args.goal.is_some() || !completed.is_empty()).then(|| {
        UserContext { current_week: args.week, previous_tasks_completed: completed, user_goal: args.goal }
    });

    let request = AnalysisRequest {
        caller: args.caller,
        locator: args.locator.unwrap_or_else(|| root.display().to_string()),
        version: args.version,
        description: args.description,
        user_context,
        files,
    };
    let report = service
        .analyze(&request)
        .with_context(|| format!("Analysis of {} failed", root.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
