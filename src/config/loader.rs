//! Settings loading

use super::Settings;
use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};

/// Variables read without a prefix, named as deployments already set them.
const PLAIN_ENV_VARS: &[&str] = &["OPENROUTER_API_KEY", "GITHUB_TOKEN", "LLM_MODEL", "LLM_MAX_TOKENS"];
const ENV_PREFIX: &str = "REPO_INSIGHT_";

const CONFIG_CANDIDATES: &[&str] = &["repo-insight.toml", ".repo-insight.toml"];

/// Load settings for a run started in `dir`.
///
/// An explicit `config_path` must exist and parse. An auto-discovered file
/// that fails to parse is skipped with a warning.
pub fn load_settings(dir: &Path, config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            extract(Some(path)).with_context(|| format!("Invalid config file: {}", path.display()))
        }
        None => match discover_config(dir) {
            Some(found) => extract(Some(&found)).or_else(|err| {
                tracing::warn!("Failed to parse auto-discovered config {}: {}", found.display(), err);
                extract(None).context("Invalid settings in environment")
            }),
            None => extract(None).context("Invalid settings in environment"),
        },
    }
}

fn figment(config_file: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(Env::raw().only(PLAIN_ENV_VARS))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

fn extract(config_file: Option<&Path>) -> Result<Settings> {
    let settings: Settings = figment(config_file).extract()?;
    tracing::debug!(
        config = ?config_file,
        model = %settings.llm_model,
        token_budget = settings.token_budget,
        "settings loaded"
    );
    Ok(settings)
}

fn discover_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}
