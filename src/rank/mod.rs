//! File ranking by importance
//!
//! Every path gets an integer tier (lower is more important) from a fixed
//! rule list evaluated in order, first match wins. Only the path is consulted,
//! never file content, so ranking is cheap and deterministic.

use crate::utils::{basename, normalize_path};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use regex::Regex;

pub mod tier {
    /// Project manifest or readme.
    pub const ESSENTIAL: u8 = 1;
    /// Documentation and build/tooling configuration.
    pub const DOCS_AND_CONFIG: u8 = 3;
    /// Conventional application entry points.
    pub const ENTRY_POINT: u8 = 4;
    /// Anything under a conventional source directory.
    pub const SOURCE: u8 = 7;
    pub const DEFAULT: u8 = 10;
}

const ESSENTIAL_FILES: &[&str] = &[
    "readme",
    "readme.md",
    "readme.mdx",
    "readme.rst",
    "readme.txt",
    "package.json",
    "cargo.toml",
    "pyproject.toml",
    "requirements.txt",
    "go.mod",
    "gemfile",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "composer.json",
    "mix.exs",
    "pubspec.yaml",
];

const DOC_PATTERNS: &[&str] =
    &["docs/**", "**/docs/**", "doc/**", "**/doc/**", "**/*.md", "**/*.mdx", "**/*.rst", "**/*.adoc"];

const CONFIG_PATTERNS: &[&str] = &[
    "**/tsconfig*.json",
    "**/jsconfig.json",
    "**/next.config.*",
    "**/vite.config.*",
    "**/vitest.config.*",
    "**/webpack.config.*",
    "**/rollup.config.*",
    "**/babel.config.*",
    "**/jest.config.*",
    "**/tailwind.config.*",
    "**/postcss.config.*",
    "**/svelte.config.*",
    "**/nuxt.config.*",
    "**/astro.config.*",
    "**/.eslintrc*",
    "**/eslint.config.*",
    "**/.prettierrc*",
    "**/.babelrc",
    "**/.env.example",
    "**/dockerfile",
    "**/docker-compose.*",
    "**/compose.yaml",
    "**/compose.yml",
    "**/makefile",
    "**/procfile",
    "**/vercel.json",
    "**/netlify.toml",
    "**/fly.toml",
    "**/render.yaml",
    "**/setup.py",
    "**/setup.cfg",
    "**/tox.ini",
    "**/rust-toolchain.toml",
    "**/.github/workflows/*",
    "**/.gitlab-ci.yml",
];

static DOC_GLOBS: Lazy<GlobSet> = Lazy::new(|| build_globset(DOC_PATTERNS));
static CONFIG_GLOBS: Lazy<GlobSet> = Lazy::new(|| build_globset(CONFIG_PATTERNS));

static ENTRY_POINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(index|main|app|server|lib|__main__)\.(ts|tsx|js|jsx|mjs|cjs|py|rs|go|rb|java|kt|swift|php|vue|svelte)$")
        .unwrap()
});

static SOURCE_DIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|/)(src|lib|app|pages|components|pkg|cmd|internal|server|api|source)/").unwrap()
});

fn build_globset(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = GlobBuilder::new(pattern).case_insensitive(true).build() {
            builder.add(glob);
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Priority tier for a repository-relative path. See [`tier`].
pub fn file_priority(path: &str) -> u8 {
    let normalized = normalize_path(path).to_lowercase();
    let name = basename(&normalized);

    if ESSENTIAL_FILES.contains(&name) {
        tier::ESSENTIAL
    } else if DOC_GLOBS.is_match(&normalized) || CONFIG_GLOBS.is_match(&normalized) {
        tier::DOCS_AND_CONFIG
    } else if ENTRY_POINT.is_match(name) {
        tier::ENTRY_POINT
    } else if SOURCE_DIR.is_match(&normalized) {
        tier::SOURCE
    } else {
        tier::DEFAULT
    }
}

/// Whether the path names a conventional entry point.
pub fn is_entry_point(path: &str) -> bool {
    let normalized = normalize_path(path).to_lowercase();
    ENTRY_POINT.is_match(basename(&normalized))
}

/// Indices of `paths` sorted by ascending tier; equal tiers keep input order.
pub fn rank_indices<'a, I>(paths: I) -> Vec<(usize, u8)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ranked: Vec<(usize, u8)> =
        paths.into_iter().enumerate().map(|(idx, path)| (idx, file_priority(path))).collect();
    // sort_by_key is stable
    ranked.sort_by_key(|&(_, tier)| tier);
    ranked
}
