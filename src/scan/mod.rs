//! Local file source with gitignore support

use crate::domain::{FileRecord, ScanStats};
use anyhow::Result;
use std::path::Path;

pub mod scanner;

pub use scanner::FileScanner;

/// Scan `root` with default settings.
pub fn scan_directory<P: AsRef<Path>>(root: P) -> Result<(Vec<FileRecord>, ScanStats)> {
    let mut scanner = FileScanner::new(root.as_ref().to_path_buf());
    let files = scanner.scan()?;
    Ok((files, scanner.stats().clone()))
}
