//! Select command implementation

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;
use std::path::PathBuf;

use super::utils::parse_csv;
use repo_insight::config::Settings;
use repo_insight::domain::{ExcludedFile, ScanStats, SelectionStats};
use repo_insight::rank::file_priority;
use repo_insight::scan::FileScanner;
use repo_insight::select::select_files;
use repo_insight::utils::{estimate_tokens, format_with_commas};

#[derive(Args)]
pub struct SelectArgs {
    /// Local directory path to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Token budget (defaults to the configured budget)
    #[arg(short, long, value_name = "TOKENS")]
    pub budget: Option<usize>,

    /// Print the selection as JSON
    #[arg(long)]
    pub json: bool,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,

    /// Skip files larger than this (bytes)
    #[arg(long, value_name = "BYTES")]
    pub max_file_bytes: Option<u64>,

    /// Ignore .gitignore rules
    #[arg(long)]
    pub no_gitignore: bool,

    /// Follow symbolic links while scanning
    #[arg(long)]
    pub follow_symlinks: bool,
}

#[derive(Serialize)]
struct SelectedFile<'a> {
    path: &'a str,
    tier: u8,
    tokens: usize,
}

#[derive(Serialize)]
struct SelectionReport<'a> {
    budget: usize,
    total_tokens: usize,
    files: Vec<SelectedFile<'a>>,
    excluded_files: &'a [ExcludedFile],
    truncated_files: &'a [String],
    stats: SelectionStats,
    scan: &'a ScanStats,
}

pub fn run(args: SelectArgs, settings: &Settings) -> Result<()> {
    let root = args.path.canonicalize()?;
    if !root.is_dir() {
        anyhow::bail!("Path is not a directory: {}", root.display());
    }

    let mut scanner = FileScanner::new(root)
        .respect_gitignore(!args.no_gitignore)
        .follow_symlinks(args.follow_symlinks);
    if let Some(bytes) = args.max_file_bytes {
        scanner = scanner.max_file_bytes(bytes);
    }
    if let Some(globs) = parse_csv(&args.exclude_glob) {
        scanner = scanner.exclude_globs(globs);
    }
    let files = scanner.scan()?;

    let budget = args.budget.unwrap_or(settings.token_budget);
    let selection = select_files(&files, budget);

    let report = SelectionReport {
        budget,
        total_tokens: selection.total_tokens,
        files: selection
            .files
            .iter()
            .map(|f| SelectedFile {
                path: &f.path,
                tier: file_priority(&f.path),
                tokens: estimate_tokens(&f.content),
            })
            .collect(),
        excluded_files: &selection.excluded_files,
        truncated_files: &selection.truncated_files,
        stats: selection.stats,
        scan: scanner.stats(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} of {} files, {} of {} tokens",
        style("Selected").bold(),
        report.stats.output_files,
        report.stats.input_files,
        format_with_commas(report.total_tokens),
        format_with_commas(budget)
    );
    for file in &report.files {
        let marker = if report.truncated_files.iter().any(|p| p == file.path) { " (truncated)" } else { "" };
        println!("  [{:>2}] {} ({} tokens){}", file.tier, file.path, format_with_commas(file.tokens), marker);
    }
    if !report.excluded_files.is_empty() {
        println!("{}", style("Excluded:").yellow());
        for excluded in report.excluded_files {
            println!("  {} ({})", excluded.path, excluded.reason.as_str());
        }
    }

    let scan = report.scan;
    println!("Statistics:");
    println!("  Total files scanned: {}", scan.files_scanned);
    println!("  Files included: {}", scan.files_included);
    println!("  Files skipped (size): {}", scan.files_skipped_size);
    println!("  Files skipped (binary): {}", scan.files_skipped_binary);
    println!("  Files skipped (glob): {}", scan.files_skipped_glob);
    println!("  Total bytes: {}", format_with_commas(scan.total_bytes_included as usize));

    Ok(())
}
