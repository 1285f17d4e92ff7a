//! Core data types shared across selection, scanning and the analysis service.

use serde::{Deserialize, Serialize};

/// A project file as handed to the analyzer. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into() }
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Why a file was left out of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The file did not fit in the remaining token budget.
    OverBudget,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::OverBudget => "over_budget",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedFile {
    pub path: String,
    pub reason: ExclusionReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionStats {
    pub input_files: usize,
    pub output_files: usize,
}

/// Outcome of budget-constrained file selection. Element order is part of the
/// result: `files` is in priority order, `excluded_files` and
/// `truncated_files` in the order they were encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub files: Vec<FileRecord>,
    pub excluded_files: Vec<ExcludedFile>,
    pub truncated_files: Vec<String>,
    pub total_tokens: usize,
    pub stats: SelectionStats,
}

/// Per-scan counters reported by the local file scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_included: usize,
    pub files_skipped_size: usize,
    pub files_skipped_binary: usize,
    pub files_skipped_glob: usize,
    pub total_bytes_included: u64,
}

/// Optional context the user supplies alongside a project description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub current_week: Option<u32>,
    #[serde(default)]
    pub previous_tasks_completed: Vec<String>,
    pub user_goal: Option<String>,
}
