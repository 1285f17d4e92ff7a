//! Byte decoding for project files.
//!
//! Files are read once; the raw bytes are then sniffed for binary content and
//! decoded with BOM detection, a strict UTF-8 fast path, and `chardetng`
//! detection as the fallback for legacy encodings.

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::path::Path;

const BINARY_SAMPLE_SIZE: usize = 8192;

/// Decoded text plus the name of the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
}

/// Heuristic binary check over the leading bytes: any NUL byte, or fewer than
/// 70% printable ASCII / whitespace bytes.
pub fn looks_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(BINARY_SAMPLE_SIZE)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    // Bytes >= 0x80 are counted as text so UTF-8 prose is not misclassified.
    let texty = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || matches!(b, b'\t' | b'\n' | b'\r') || b >= 0x80)
        .count();
    (texty as f64 / sample.len() as f64) < 0.70
}

/// Decode raw bytes into text, never failing: undecodable sequences become
/// U+FFFD replacement characters.
pub fn decode_bytes(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedText { text: text.into_owned(), encoding: encoding.name() };
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText { text: text.to_string(), encoding: UTF_8.name() };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&bytes[..bytes.len().min(BINARY_SAMPLE_SIZE)], true);
    let encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(bytes);
    DecodedText { text: text.into_owned(), encoding: encoding.name() }
}

/// Read a text file, returning `None` when it looks binary.
pub fn read_text_file(path: &Path) -> Result<Option<DecodedText>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    if looks_binary(&bytes) {
        return Ok(None);
    }
    Ok(Some(decode_bytes(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_utf8_passthrough() {
        let decoded = decode_bytes("Test content 🚀".as_bytes());
        assert_eq!(decoded.text, "Test content 🚀");
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice(b"Hello");
        let decoded = decode_bytes(&bytes);
        assert_eq!(decoded.text, "Hello");
    }

    #[test]
    fn test_utf16le_bom() {
        let bytes = [0xff, 0xfe, b'h', 0x00, b'i', 0x00];
        let decoded = decode_bytes(&bytes);
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.encoding, "UTF-16LE");
    }

    #[test]
    fn test_latin1_fallback() {
        // French prose in windows-1252
        let bytes = b"La cr\xe8me br\xfbl\xe9e du caf\xe9 est d\xe9licieuse et tr\xe8s sucr\xe9e.";
        let decoded = decode_bytes(bytes);
        assert!(decoded.text.starts_with("La cr"));
        assert!(!decoded.text.contains('\u{fffd}'));
    }

    #[test]
    fn test_null_byte_is_binary() {
        assert!(looks_binary(&[0x00, 0x01, 0x02]));
        assert!(!looks_binary(b"Normal text file"));
        assert!(!looks_binary(b""));
    }

    #[test]
    fn test_read_text_file_decodes_whole_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all("Hello, wörld!".as_bytes()).unwrap();
        file.flush().unwrap();

        let decoded = read_text_file(file.path()).unwrap().unwrap();
        assert_eq!(decoded.text, "Hello, wörld!");
        assert_eq!(decoded.encoding, "UTF-8");
    }

    #[test]
    fn test_read_text_file_skips_binary() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x00, 0xff, 0x10]).unwrap();
        file.flush().unwrap();

        assert!(read_text_file(file.path()).unwrap().is_none());
    }
}
