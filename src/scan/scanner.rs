//! Directory walker producing `FileRecord`s

use crate::domain::{FileRecord, ScanStats};
use crate::utils::{normalize_path, read_text_file, DecodedText};
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 1_048_576;

/// Lock files and build output that carry no signal for analysis.
const DEFAULT_EXCLUDE_GLOBS: &[&str] = &[
    "**/package-lock.json",
    "**/yarn.lock",
    "**/pnpm-lock.yaml",
    "**/Cargo.lock",
    "**/poetry.lock",
    "**/*.min.js",
    "**/*.min.css",
    "**/*.map",
    "**/dist/**",
    "**/build/**",
    "**/target/**",
    "**/coverage/**",
];

const SKIPPED_DIRS: &[&str] = &["node_modules", "__pycache__", ".git", ".venv", "venv"];

/// Walks a project directory and reads every eligible text file.
pub struct FileScanner {
    root_path: PathBuf,
    exclude_globs: Vec<String>,
    max_file_bytes: u64,
    respect_gitignore: bool,
    follow_symlinks: bool,
    stats: ScanStats,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self {
            root_path,
            exclude_globs: DEFAULT_EXCLUDE_GLOBS.iter().map(|s| s.to_string()).collect(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            respect_gitignore: true,
            follow_symlinks: false,
            stats: ScanStats::default(),
        }
    }

    /// Add glob patterns to exclude, on top of the defaults.
    pub fn exclude_globs(mut self, globs: Vec<String>) -> Self {
        self.exclude_globs.extend(globs);
        self
    }

    pub fn max_file_bytes(mut self, max_bytes: u64) -> Self {
        self.max_file_bytes = max_bytes;
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    fn build_exclude_globset(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_globs {
            let glob = Glob::new(pattern).with_context(|| format!("Invalid exclude glob: {pattern}"))?;
            builder.add(glob);
        }
        Ok(builder.build()?)
    }

    /// Scan the directory and return its text files sorted by relative path.
    pub fn scan(&mut self) -> Result<Vec<FileRecord>> {
        self.stats = ScanStats::default();

        if !self.root_path.is_dir() {
            anyhow::bail!("Not a directory: {}", self.root_path.display());
        }
        let exclude_globset = self.build_exclude_globset()?;

        let mut builder = WalkBuilder::new(&self.root_path);
        builder
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .follow_links(self.follow_symlinks)
            .hidden(false)
            .parents(true)
            .filter_entry(|entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                let Some(name) = entry.file_name().to_str() else {
                    return true;
                };
                !is_dir || !(SKIPPED_DIRS.contains(&name) || (name.starts_with('.') && name != ".github"))
            });

        let mut candidates: Vec<(PathBuf, String)> = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!("Skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            self.stats.files_scanned += 1;

            let path = entry.path();
            let Some(rel_path) = relative_path(&self.root_path, path) else {
                continue;
            };
            if exclude_globset.is_match(&rel_path) {
                self.stats.files_skipped_glob += 1;
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > self.max_file_bytes {
                self.stats.files_skipped_size += 1;
                continue;
            }
            candidates.push((path.to_path_buf(), rel_path));
        }

        candidates.sort_by(|a, b| a.1.cmp(&b.1));

        let decoded: Vec<(String, Result<Option<DecodedText>>)> = candidates
            .into_par_iter()
            .map(|(path, rel_path)| {
                let text = read_text_file(&path);
                (rel_path, text)
            })
            .collect();

        let mut files = Vec::with_capacity(decoded.len());
        for (rel_path, text) in decoded {
            match text {
                Ok(Some(text)) => {
                    self.stats.files_included += 1;
                    self.stats.total_bytes_included += text.text.len() as u64;
                    if text.encoding != "UTF-8" {
                        tracing::debug!(path = %rel_path, encoding = text.encoding, "decoded non-UTF-8 file");
                    }
                    files.push(FileRecord::new(rel_path, text.text));
                }
                Ok(None) => self.stats.files_skipped_binary += 1,
                Err(err) => tracing::warn!("{err:#}"),
            }
        }

        tracing::debug!(
            scanned = self.stats.files_scanned,
            included = self.stats.files_included,
            "scan complete"
        );
        Ok(files)
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(normalize_path(rel.to_str()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_scanner_basic_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("README.md"), "# Demo").unwrap();
        fs::write(root.join("notes.txt"), "text file").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let files = scanner.scan().unwrap();

        assert_eq!(paths(&files), vec!["README.md", "notes.txt", "src/main.rs"]);
        assert_eq!(files[2].content, "fn main() {}");
        assert_eq!(scanner.stats().files_included, 3);
    }

    #[test]
    fn test_scanner_respects_size_limit() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("large.rs"), "a".repeat(2_000)).unwrap();
        fs::write(root.join("small.rs"), "fn main() {}").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf()).max_file_bytes(1_000);
        let files = scanner.scan().unwrap();

        assert_eq!(paths(&files), vec!["small.rs"]);
        assert_eq!(scanner.stats().files_skipped_size, 1);
    }

    #[test]
    fn test_binary_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G', 0, 0, 0, 13]).unwrap();
        fs::write(root.join("index.js"), "console.log(1)").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let files = scanner.scan().unwrap();

        assert_eq!(paths(&files), vec!["index.js"]);
        assert_eq!(scanner.stats().files_skipped_binary, 1);
    }

    #[test]
    fn test_default_and_custom_excludes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("dist")).unwrap();
        fs::write(root.join("dist/bundle.js"), "x").unwrap();
        fs::write(root.join("package-lock.json"), "{}").unwrap();
        fs::write(root.join("secret.env"), "KEY=1").unwrap();
        fs::write(root.join("app.ts"), "export {}").unwrap();

        let mut scanner =
            FileScanner::new(root.to_path_buf()).exclude_globs(vec!["*.env".to_string()]);
        let files = scanner.scan().unwrap();

        assert_eq!(paths(&files), vec!["app.ts"]);
        assert_eq!(scanner.stats().files_skipped_glob, 3);
    }

    #[test]
    fn test_hidden_dirs_skipped_except_github() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join(".cache/a.py"), "# hidden cache").unwrap();
        fs::create_dir_all(root.join(".github/workflows")).unwrap();
        fs::write(root.join(".github/workflows/ci.yml"), "on: push").unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();

        let mut scanner = FileScanner::new(root.to_path_buf());
        let files = scanner.scan().unwrap();

        assert_eq!(paths(&files), vec![".github/workflows/ci.yml"]);
    }

    #[test]
    fn test_gitignore_is_respected_unless_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join(".gitignore"), "ignored.txt\n").unwrap();
        fs::write(root.join("ignored.txt"), "skip me").unwrap();
        fs::write(root.join("kept.txt"), "keep me").unwrap();

        let files = FileScanner::new(root.to_path_buf()).scan().unwrap();
        assert!(!paths(&files).contains(&"ignored.txt"));
        assert!(paths(&files).contains(&"kept.txt"));

        let files = FileScanner::new(root.to_path_buf()).respect_gitignore(false).scan().unwrap();
        assert!(paths(&files).contains(&"ignored.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_dirs_followed_only_when_enabled() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("shared.ts"), "export {}").unwrap();
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("index.ts"), "export {}").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("linked")).unwrap();

        let files = FileScanner::new(root.to_path_buf()).scan().unwrap();
        assert_eq!(paths(&files), vec!["index.ts"]);

        let files = FileScanner::new(root.to_path_buf()).follow_symlinks(true).scan().unwrap();
        assert_eq!(paths(&files), vec!["index.ts", "linked/shared.ts"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(FileScanner::new(missing).scan().is_err());
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut scanner =
            FileScanner::new(temp_dir.path().to_path_buf()).exclude_globs(vec!["[".to_string()]);
        assert!(scanner.scan().is_err());
    }
}
