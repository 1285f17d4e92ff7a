//! Locate a single JSON object inside free-form generator output.
//!
//! Generators wrap their answer in markdown fences, prefix it with prose or
//! headings, and append commentary. Extraction peels those layers off and
//! returns a borrowed slice of the input; it never allocates and never fails
//! loudly.

/// Strip a leading fence line (```` ``` ```` or ```` ```json ````) when the
/// text also ends with a closing fence.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = after_open.trim_end().strip_suffix("```") else {
        return trimmed;
    };
    // Drop an optional language tag directly after the opening fence.
    let tag_len = body
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_')
        .unwrap_or(body.len());
    body[tag_len..].trim()
}

/// Drop leading markdown heading lines (and blank lines between them). A
/// heading line that contains an opening brace is kept, since the object may
/// start on it.
pub fn strip_leading_headings(text: &str) -> &str {
    let mut rest = text.trim_start();
    while rest.starts_with('#') {
        let line_end = rest.find('\n').unwrap_or(rest.len());
        if rest[..line_end].contains('{') {
            break;
        }
        rest = rest[line_end..].trim_start();
    }
    rest
}

/// Text cleanup applied before any brace scanning.
pub fn preprocess(raw: &str) -> &str {
    strip_leading_headings(strip_code_fence(raw))
}

/// Scan from the opening brace at the start of `text` and return the first
/// balanced object, string- and escape-aware. `None` if the braces never
/// balance.
pub fn balanced_object(text: &str) -> Option<&str> {
    debug_assert!(text.starts_with('{'));
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, byte) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Span from the first `{` through the last `}`, without balance checking.
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Best candidate object in `raw`: the first balanced object after cleanup,
/// or the first-to-last brace span when the output was cut off. `None` when
/// there is no opening brace at all.
pub fn extract_object(raw: &str) -> Option<&str> {
    let cleaned = preprocess(raw);
    let start = cleaned.find('{')?;
    let from_brace = &cleaned[start..];
    balanced_object(from_brace).or_else(|| brace_span(from_brace))
}
