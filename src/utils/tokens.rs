//! Token estimation

/// Estimate tokens using a conservative heuristic: one token per four
/// characters, rounded up.
///
/// Counts Unicode code points rather than bytes so multi-byte content (CJK
/// text, emoji) is not over-counted. Used for budgeting only, never billing.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
