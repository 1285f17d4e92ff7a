//! Runtime settings
//!
//! Settings are layered with figment: built-in defaults, then a TOML file,
//! then environment variables (Env > File > Defaults).

pub mod loader;

pub use loader::load_settings;

use crate::cache::CacheConfig;
use crate::limit::RateLimitConfig;
use crate::select::DEFAULT_TOKEN_BUDGET;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LLM_MODEL: &str = "anthropic/claude-sonnet-4";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 4_000;
pub const LLM_MAX_TOKENS_RANGE: std::ops::RangeInclusive<u32> = 100..=100_000;

const API_KEY_PREFIX: &str = "sk-or-";
const GITHUB_TOKEN_PREFIXES: &[&str] = &["ghp_", "github_pat_"];

/// Environment variables without which the generator cannot be called.
pub const REQUIRED_ENV_VARS: &[&str] = &["OPENROUTER_API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openrouter_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub token_budget: usize,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            github_token: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_max_tokens: DEFAULT_LLM_MAX_TOKENS,
            token_budget: DEFAULT_TOKEN_BUDGET,
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Settings {
    /// Every problem with these settings, in a stable order.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        match self.openrouter_api_key.as_deref() {
            None | Some("") => problems.push("OPENROUTER_API_KEY is required".to_string()),
            Some(key) if !key.starts_with(API_KEY_PREFIX) => {
                problems.push(format!("OPENROUTER_API_KEY must start with \"{API_KEY_PREFIX}\""))
            }
            Some(_) => {}
        }

        if let Some(token) = self.github_token.as_deref() {
            if !GITHUB_TOKEN_PREFIXES.iter().any(|prefix| token.starts_with(prefix)) {
                problems.push("GITHUB_TOKEN must start with \"ghp_\" or \"github_pat_\"".to_string());
            }
        }

        if self.llm_model.trim().is_empty() {
            problems.push("LLM_MODEL must not be empty".to_string());
        }
        if !LLM_MAX_TOKENS_RANGE.contains(&self.llm_max_tokens) {
            problems.push(format!(
                "LLM_MAX_TOKENS must be between {} and {}, got {}",
                LLM_MAX_TOKENS_RANGE.start(),
                LLM_MAX_TOKENS_RANGE.end(),
                self.llm_max_tokens
            ));
        }
        if self.cache.max_entries == 0 {
            problems.push("cache.max_entries must be at least 1".to_string());
        }
        if self.cache.ttl_ms == 0 {
            problems.push("cache.ttl_ms must be at least 1".to_string());
        }
        if self.rate_limit.window_ms == 0 {
            problems.push("rate_limit.window_ms must be at least 1".to_string());
        }
        if self.rate_limit.max_requests == 0 {
            problems.push("rate_limit.max_requests must be at least 1".to_string());
        }

        problems
    }

    /// Fail with every problem listed if the settings are unusable.
    pub fn validate(&self) -> anyhow::Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }
        anyhow::bail!("Invalid configuration:\n  - {}", problems.join("\n  - "))
    }

    /// Required variables that have no value.
    pub fn missing_env_vars(&self) -> Vec<&'static str> {
        REQUIRED_ENV_VARS
            .iter()
            .copied()
            .filter(|name| match *name {
                "OPENROUTER_API_KEY" => self.openrouter_api_key.as_deref().map_or(true, str::is_empty),
                _ => false,
            })
            .collect()
    }

    pub fn is_configured(&self) -> bool {
        self.missing_env_vars().is_empty()
    }

    /// Copy safe to print: secrets keep only their prefix.
    pub fn redacted(&self) -> Settings {
        Settings {
            openrouter_api_key: self.openrouter_api_key.as_deref().map(mask_secret),
            github_token: self.github_token.as_deref().map(mask_secret),
            ..self.clone()
        }
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{visible}****")
}
