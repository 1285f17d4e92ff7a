//! Error types for the response pipeline and the analysis service.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Characters of raw generator text kept from the start of the output.
const PREVIEW_HEAD_CHARS: usize = 600;
/// Characters kept from the end of the output.
const PREVIEW_TAIL_CHARS: usize = 200;

/// One field that did not match the expected response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Dotted field path, e.g. `analysis.tasks[2].priority`.
    pub path: String,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), reason: reason.into() }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Failure to turn raw generator text into a validated analysis.
///
/// Every variant carries a bounded preview of the offending text, never the
/// full output.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("generator output contains no JSON object (preview: {preview:?})")]
    NoObject { preview: String },

    #[error(
        "failed to parse generator output as JSON: {} (preview: {preview:?})",
        .attempts.join("; ")
    )]
    Malformed { attempts: Vec<String>, preview: String },

    #[error(
        "generator output failed schema validation with {} problem(s): {}",
        .violations.len(),
        join_violations(.violations)
    )]
    Schema { violations: Vec<SchemaViolation>, preview: String },
}

impl ParseError {
    pub fn preview(&self) -> &str {
        match self {
            ParseError::NoObject { preview }
            | ParseError::Malformed { preview, .. }
            | ParseError::Schema { preview, .. } => preview,
        }
    }

    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            ParseError::Schema { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Failure of a full analysis request.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("rate limit exceeded, retry in {}s", .retry_after.as_secs_f64().ceil())]
    RateLimited { retry_after: Duration },

    #[error("no files found to analyze")]
    NoFiles,

    #[error("token budget left no room for any of {excluded} file(s)")]
    EmptySelection { excluded: usize },

    #[error("generator call failed: {0:#}")]
    Generator(anyhow::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Bounded head-and-tail excerpt of `text` for diagnostics.
pub fn preview(text: &str) -> String {
    let total = text.chars().count();
    if total <= PREVIEW_HEAD_CHARS + PREVIEW_TAIL_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_HEAD_CHARS).collect();
    let tail: String = text.chars().skip(total - PREVIEW_TAIL_CHARS).collect();
    format!("{head} [... {} chars omitted ...] {tail}", total - PREVIEW_HEAD_CHARS - PREVIEW_TAIL_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_preview_is_verbatim() {
        assert_eq!(preview("{\"a\": 1"), "{\"a\": 1");
    }

    #[test]
    fn test_long_preview_is_bounded() {
        let text = format!("{}{}", "h".repeat(5_000), "t".repeat(5_000));
        let excerpt = preview(&text);
        assert!(excerpt.len() < 1_000);
        assert!(excerpt.starts_with(&"h".repeat(PREVIEW_HEAD_CHARS)));
        assert!(excerpt.ends_with(&"t".repeat(PREVIEW_TAIL_CHARS)));
        assert!(excerpt.contains("9200 chars omitted"));
    }

    #[test]
    fn test_schema_error_lists_every_violation() {
        let err = ParseError::Schema {
            violations: vec![
                SchemaViolation::new("analysis.detected_stage", "expected one of ..."),
                SchemaViolation::new("analysis.tasks[0].priority", "expected string"),
            ],
            preview: String::new(),
        };
        let message = err.to_string();
        assert!(message.contains("2 problem(s)"));
        assert!(message.contains("analysis.detected_stage"));
        assert!(message.contains("analysis.tasks[0].priority"));
    }

    #[test]
    fn test_rate_limited_message_rounds_up() {
        let err = AnalyzeError::RateLimited { retry_after: Duration::from_millis(1500) };
        assert_eq!(err.to_string(), "rate limit exceeded, retry in 2s");
    }
}
