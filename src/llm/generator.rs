//! The text-generation collaborator.
//!
//! Network clients live outside this crate; anything that can turn a prompt
//! into text implements [`Generator`].

use anyhow::{Context, Result};
use std::path::Path;

/// Raw output of one generator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Free-form text, never trusted to be valid JSON.
    pub content: String,
    pub model: String,
    pub tokens_used: u64,
}

pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<Generation>;
}

/// Replays a recorded response regardless of the prompt. Used to re-run the
/// pipeline against captured generator output.
#[derive(Debug, Clone)]
pub struct ReplayGenerator {
    content: String,
    model: String,
}

impl ReplayGenerator {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self { content: content.into(), model: model.into() }
    }

    pub fn from_file(path: &Path, model: impl Into<String>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed reading recorded response: {}", path.display()))?;
        Ok(Self::new(content, model))
    }
}

impl Generator for ReplayGenerator {
    fn generate(&self, prompt: &str) -> Result<Generation> {
        tracing::debug!(prompt_chars = prompt.len(), model = %self.model, "replaying recorded response");
        Ok(Generation {
            content: self.content.clone(),
            model: self.model.clone(),
            tokens_used: 0,
        })
    }
}

impl<G: Generator + ?Sized> Generator for &G {
    fn generate(&self, prompt: &str) -> Result<Generation> {
        (**self).generate(prompt)
    }
}
