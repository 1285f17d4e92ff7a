//! Budget-constrained file selection.
//!
//! Files are ranked by [`crate::rank::file_priority`] and accepted greedily in
//! priority order until the token budget is spent. The walk never backtracks
//! and never reorders for tighter packing: a file that does not fit is
//! recorded as excluded and the walk moves on to the next one.

use crate::domain::{ExcludedFile, ExclusionReason, FileRecord, SelectionResult, SelectionStats};
use crate::rank::rank_indices;
use crate::utils::estimate_tokens;

/// Token budget used when the caller does not supply one.
pub const DEFAULT_TOKEN_BUDGET: usize = 50_000;

/// Files estimated above this many tokens are truncated before budgeting.
pub const MAX_FILE_TOKENS: usize = 8_000;

/// Character length an oversized file is cut to (before the marker).
pub const TRUNCATED_FILE_CHARS: usize = 16_000;

pub const TRUNCATION_MARKER: &str = "\n\n... (truncated)";

/// Select files for analysis using [`DEFAULT_TOKEN_BUDGET`].
pub fn select_files_for_analysis(files: &[FileRecord]) -> SelectionResult {
    select_files(files, DEFAULT_TOKEN_BUDGET)
}

/// Select the most important subset of `files` whose estimated token cost
/// fits in `token_budget`.
///
/// Pure: identical input always yields an identical result, element order
/// included.
pub fn select_files(files: &[FileRecord], token_budget: usize) -> SelectionResult {
    let mut result = SelectionResult {
        stats: SelectionStats { input_files: files.len(), output_files: 0 },
        ..SelectionResult::default()
    };

    for (idx, tier) in rank_indices(files.iter().map(|f| f.path.as_str())) {
        let file = &files[idx];
        let mut content_tokens = estimate_tokens(&file.content);
        let mut truncated = None;

        if content_tokens > MAX_FILE_TOKENS {
            let content = truncate_content(&file.content);
            content_tokens = estimate_tokens(&content);
            truncated = Some(content);
        }

        if result.total_tokens + content_tokens > token_budget {
            tracing::debug!(
                path = %file.path,
                tier,
                tokens = content_tokens,
                remaining = token_budget.saturating_sub(result.total_tokens),
                "excluding file over budget"
            );
            result.excluded_files.push(ExcludedFile {
                path: file.path.clone(),
                reason: ExclusionReason::OverBudget,
            });
            continue;
        }

        result.total_tokens += content_tokens;
        match truncated {
            Some(content) => {
                result.truncated_files.push(file.path.clone());
                result.files.push(FileRecord::new(file.path.clone(), content));
            }
            None => result.files.push(file.clone()),
        }
    }

    result.stats.output_files = result.files.len();
    tracing::debug!(
        selected = result.stats.output_files,
        excluded = result.excluded_files.len(),
        truncated = result.truncated_files.len(),
        total_tokens = result.total_tokens,
        token_budget,
        "file selection complete"
    );
    result
}

fn truncate_content(content: &str) -> String {
    let cut = content.char_indices().nth(TRUNCATED_FILE_CHARS).map_or(content.len(), |(i, _)| i);
    let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len());
    out.push_str(&content[..cut]);
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: String) -> FileRecord {
        FileRecord::new(path, content)
    }

    fn paths(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_selects_all_when_within_budget() {
        let files = vec![
            file("README.md", "a".repeat(100)),
            file("package.json", "b".repeat(100)),
            file("src/index.ts", "c".repeat(100)),
        ];

        let result = select_files(&files, 1000);

        assert_eq!(result.files.len(), 3);
        assert!(result.excluded_files.is_empty());
        assert_eq!(result.total_tokens, 75);
        assert_eq!(result.stats, SelectionStats { input_files: 3, output_files: 3 });
    }

    #[test]
    fn test_high_priority_file_kept_regardless_of_input_order() {
        let forward = vec![
            file("src/utils.ts", "a".repeat(10_000)),
            file("README.md", "b".repeat(100)),
            file("src/helper.ts", "c".repeat(10_000)),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        for files in [forward, reversed] {
            let result = select_files(&files, 500);
            assert_eq!(paths(&result.files), vec!["README.md"]);
            assert_eq!(result.excluded_files.len(), 2);
            assert!(result
                .excluded_files
                .iter()
                .all(|excluded| excluded.reason == ExclusionReason::OverBudget));
        }
    }

    #[test]
    fn test_output_follows_priority_order() {
        let files = vec![
            file("src/utils/helper.ts", "x".into()),
            file("docs/guide.md", "x".into()),
            file("src/index.ts", "x".into()),
            file("README.md", "x".into()),
            file("notes.xyz", "x".into()),
        ];

        let result = select_files(&files, 1000);

        assert_eq!(
            paths(&result.files),
            vec!["README.md", "docs/guide.md", "src/index.ts", "src/utils/helper.ts", "notes.xyz"]
        );
    }

    #[test]
    fn test_greedy_walk_continues_after_exclusion() {
        // The big entry point is skipped, the smaller source file after it still fits.
        let files = vec![
            file("README.md", "a".repeat(400)),
            file("src/main.ts", "b".repeat(2_000)),
            file("src/util.ts", "c".repeat(200)),
        ];

        let result = select_files(&files, 200);

        assert_eq!(paths(&result.files), vec!["README.md", "src/util.ts"]);
        assert_eq!(paths_of_excluded(&result), vec!["src/main.ts"]);
        assert_eq!(result.total_tokens, 150);
    }

    fn paths_of_excluded(result: &SelectionResult) -> Vec<&str> {
        result.excluded_files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_oversized_file_is_truncated() {
        let files = vec![file("src/huge.ts", "z".repeat(100_000))];

        let result = select_files(&files, DEFAULT_TOKEN_BUDGET);

        assert_eq!(result.truncated_files, vec!["src/huge.ts".to_string()]);
        let content = &result.files[0].content;
        assert!(content.ends_with(TRUNCATION_MARKER));
        assert_eq!(content.chars().count(), TRUNCATED_FILE_CHARS + TRUNCATION_MARKER.len());
        assert_eq!(result.total_tokens, estimate_tokens(content));
    }

    #[test]
    fn test_truncated_file_still_over_budget_is_excluded() {
        let files = vec![file("src/huge.ts", "z".repeat(100_000))];

        let result = select_files(&files, 100);

        assert!(result.files.is_empty());
        assert!(result.truncated_files.is_empty());
        assert_eq!(paths_of_excluded(&result), vec!["src/huge.ts"]);
    }

    #[test]
    fn test_empty_input() {
        let result = select_files(&[], 1000);
        assert_eq!(result, SelectionResult::default());
    }

    #[test]
    fn test_zero_budget_excludes_everything() {
        let files = vec![file("README.md", "hello".into()), file("src/a.ts", "x".into())];

        let result = select_files(&files, 0);

        assert!(result.files.is_empty());
        assert_eq!(result.excluded_files.len(), 2);
        assert_eq!(result.stats.output_files, 0);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let files: Vec<FileRecord> = (0..20)
            .map(|i| file(&format!("src/mod{i}.rs"), "q".repeat(40 * (i + 1))))
            .collect();

        assert_eq!(select_files(&files, 600), select_files(&files, 600));
    }

    #[test]
    fn test_stats_report_input_count() {
        let files = vec![file("file1.ts", "content1".into()), file("file2.ts", "content2".into())];

        let result = select_files_for_analysis(&files);

        assert_eq!(result.stats.input_files, 2);
        assert!(result.total_tokens > 0);
    }
}
