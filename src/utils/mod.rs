//! Small shared helpers: token estimates, hashing, path normalization, decoding.

pub mod encoding;
pub mod hashing;
pub mod paths;
pub mod tokens;

pub use encoding::{decode_bytes, looks_binary, read_text_file, DecodedText};
pub use hashing::{content_version, fingerprint};
pub use paths::{basename, normalize_path};
pub use tokens::estimate_tokens;

/// Format an integer with thousands separators (`12345` -> `12,345`).
pub fn format_with_commas(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
