//! Textual fixups for almost-JSON.
//!
//! A single string-aware pass that removes what strict JSON rejects but
//! generators routinely emit: trailing commas, `//` and `/* */` comments, and
//! raw control characters. Raw newlines and tabs inside string literals are
//! escaped instead of dropped so multi-line values survive.
//!
//! The pass is idempotent: repairing already-repaired text is a no-op.

/// Apply every repair to `candidate`.
pub fn repair(candidate: &str) -> String {
    let bytes = candidate.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];

        if in_string {
            if escaped {
                escaped = false;
                if !is_stripped_control(byte) {
                    out.push(byte);
                }
            } else {
                match byte {
                    b'\\' => {
                        escaped = true;
                        out.push(byte);
                    }
                    b'"' => {
                        in_string = false;
                        out.push(byte);
                    }
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    b'\t' => out.extend_from_slice(b"\\t"),
                    b if is_stripped_control(b) => {}
                    b => out.push(b),
                }
            }
            i += 1;
            continue;
        }

        match byte {
            b'"' => {
                in_string = true;
                out.push(byte);
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line_comment(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
            }
            b',' if matches!(next_significant(bytes, i + 1), Some(b'}' | b']')) => {
                i += 1;
            }
            b if is_stripped_control(b) => {
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    // Only ASCII bytes were removed or inserted, so the output is valid UTF-8
    // whenever the input was.
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Control characters other than newline, carriage return and tab.
fn is_stripped_control(byte: u8) -> bool {
    (byte < 0x20 && !matches!(byte, b'\n' | b'\r' | b'\t')) || byte == 0x7f
}

/// Index just past the `//` comment starting at `start` (the newline is kept).
fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..].iter().position(|&b| b == b'\n').map_or(bytes.len(), |offset| start + offset)
}

/// Index just past the `*/` closing the comment at `start`, or end of input.
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let body = start + 2;
    bytes
        .get(body..)
        .and_then(|rest| rest.windows(2).position(|w| w == b"*/"))
        .map_or(bytes.len(), |offset| body + offset + 2)
}

/// Next byte outside whitespace and comments, looking forward from `from`.
fn next_significant(bytes: &[u8], mut from: usize) -> Option<u8> {
    while from < bytes.len() {
        match bytes[from] {
            b' ' | b'\t' | b'\n' | b'\r' => from += 1,
            b'/' if bytes.get(from + 1) == Some(&b'/') => from = skip_line_comment(bytes, from),
            b'/' if bytes.get(from + 1) == Some(&b'*') => from = skip_block_comment(bytes, from),
            b if is_stripped_control(b) => from += 1,
            b => return Some(b),
        }
    }
    None
}
