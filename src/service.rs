//! End-to-end analysis of one project.
//!
//! Admission, caching, selection, prompting, generation and parsing are
//! composed here; each step lives in its own module.

use crate::cache::{AnalysisCache, CacheConfig};
use crate::config::Settings;
use crate::domain::{FileRecord, UserContext};
use crate::error::AnalyzeError;
use crate::limit::{RateLimitConfig, RateLimiter};
use crate::llm::{
    build_analysis_prompt, detect_stage, detect_tech_stack, parse_and_validate_analysis_response,
    AnalysisResponse, Generator, ProjectOutline,
};
use crate::select::{select_files, DEFAULT_TOKEN_BUDGET};
use crate::utils::{content_version, estimate_tokens};
use serde::Serialize;
use std::time::Instant;

/// One analysis request. `version` identifies the content snapshot (a commit
/// SHA for remote sources); when absent it is derived from the file contents.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub caller: String,
    pub locator: String,
    pub version: Option<String>,
    pub description: String,
    pub user_context: Option<UserContext>,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisMetadata {
    pub files_analyzed: usize,
    pub files_excluded: usize,
    pub files_truncated: usize,
    pub total_lines: usize,
    pub prompt_tokens: usize,
    pub model_used: String,
    pub tokens_used: u64,
    pub analysis_duration_ms: u64,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub response: AnalysisResponse,
    pub metadata: AnalysisMetadata,
}

pub struct AnalysisService<G> {
    generator: G,
    cache: AnalysisCache<AnalysisReport>,
    limiter: RateLimiter,
    token_budget: usize,
}

impl<G: Generator> AnalysisService<G> {
    pub fn new(generator: G, settings: &Settings) -> Self {
        Self::with_parts(
            generator,
            AnalysisCache::new(settings.cache),
            RateLimiter::new(settings.rate_limit),
            settings.token_budget,
        )
    }

    /// Service with default cache and limiter settings.
    pub fn with_defaults(generator: G) -> Self {
        Self::with_parts(
            generator,
            AnalysisCache::new(CacheConfig::default()),
            RateLimiter::new(RateLimitConfig::default()),
            DEFAULT_TOKEN_BUDGET,
        )
    }

    pub fn with_parts(
        generator: G,
        cache: AnalysisCache<AnalysisReport>,
        limiter: RateLimiter,
        token_budget: usize,
    ) -> Self {
        Self { generator, cache, limiter, token_budget }
    }

    pub fn cache(&self) -> &AnalysisCache<AnalysisReport> {
        &self.cache
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalyzeError> {
        let decision = self.limiter.check(&request.caller);
        if !decision.allowed {
            return Err(AnalyzeError::RateLimited { retry_after: decision.reset_in });
        }

        if request.files.is_empty() {
            return Err(AnalyzeError::NoFiles);
        }

        let version = match &request.version {
            Some(version) => version.clone(),
            None => content_version(&request.files),
        };
        let key = AnalysisCache::<AnalysisReport>::generate_key(&request.locator, &version);
        if let Some(mut report) = self.cache.get(&key) {
            tracing::debug!(locator = %request.locator, %version, "analysis cache hit");
            report.metadata.cached = true;
            return Ok(report);
        }
        tracing::debug!(locator = %request.locator, %version, "analysis cache miss");

        let selection = select_files(&request.files, self.token_budget);
        if selection.files.is_empty() {
            return Err(AnalyzeError::EmptySelection { excluded: selection.excluded_files.len() });
        }

        let outline = ProjectOutline::from_files(&request.files);
        let tech_stack = detect_tech_stack(&request.files);
        let stage = detect_stage(&request.files, &outline);
        tracing::debug!(?stage, stack = ?tech_stack, "local project outline");
        let prompt = build_analysis_prompt(
            &selection.files,
            &request.description,
            &outline,
            &tech_stack,
            stage,
            request.user_context.as_ref(),
        );
        let prompt_tokens = estimate_tokens(&prompt);

        let started = Instant::now();
        let generation = self.generator.generate(&prompt).map_err(AnalyzeError::Generator)?;
        let response = parse_and_validate_analysis_response(&generation.content)?;
        let elapsed = started.elapsed();

        if let AnalysisResponse::Complete(analysis) = &response {
            for (task, missing) in analysis.dangling_dependencies() {
                tracing::warn!(task, depends_on = missing, "task depends on a task not in the analysis");
            }
        }

        let report = AnalysisReport {
            response,
            metadata: AnalysisMetadata {
                files_analyzed: selection.files.len(),
                files_excluded: selection.excluded_files.len(),
                files_truncated: selection.truncated_files.len(),
                total_lines: request.files.iter().map(FileRecord::line_count).sum(),
                prompt_tokens,
                model_used: generation.model,
                tokens_used: generation.tokens_used,
                analysis_duration_ms: elapsed.as_millis() as u64,
                cached: false,
            },
        };
        self.cache.set(key, report.clone());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Generation, ReplayGenerator};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const COMPLETE: &str = r#"Here you go:
```json
{
  "needs_clarification": false,
  "questions": [],
  "analysis": {
    "project_summary": "A demo app.",
    "detected_stage": "mvp",
    "tech_stack": ["TypeScript"],
    "strengths": [{"area": "Docs", "detail": "Clear README"}],
    "issues": [{"severity": "medium", "area": "Tests", "detail": "None yet", "file_path": null}],
    "tasks": [
      {"title": "Add tests", "description": "Cover the API", "priority": "high", "category": "technical", "estimated_minutes": 90, "depends_on": null},
      {"title": "Deploy", "description": "Ship it", "priority": "medium", "category": "product", "estimated_minutes": 60, "depends_on": "Set up CI"},
    ],
    "next_milestone": "First users"
  }
}
```"#;

    struct Counting {
        calls: AtomicUsize,
        content: String,
    }

    impl Counting {
        fn new(content: &str) -> Self {
            Self { calls: AtomicUsize::new(0), content: content.to_string() }
        }
    }

    impl Generator for Counting {
        fn generate(&self, _prompt: &str) -> anyhow::Result<Generation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Generation { content: self.content.clone(), model: "test-model".into(), tokens_used: 42 })
        }
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            caller: "127.0.0.1".into(),
            locator: "https://github.com/user/demo".into(),
            version: Some("abc123".into()),
            description: "A demo".into(),
            user_context: None,
            files: vec![
                FileRecord::new("README.md", "# Demo\nHello"),
                FileRecord::new("src/index.ts", "export {}"),
            ],
        }
    }

    #[test]
    fn test_full_pipeline_and_metadata() {
        let service = AnalysisService::with_defaults(Counting::new(COMPLETE));
        let report = service.analyze(&request()).unwrap();

        let AnalysisResponse::Complete(analysis) = &report.response else {
            panic!("expected complete analysis");
        };
        assert_eq!(analysis.tasks.len(), 2);
        assert_eq!(report.metadata.files_analyzed, 2);
        assert_eq!(report.metadata.total_lines, 3);
        assert_eq!(report.metadata.model_used, "test-model");
        assert_eq!(report.metadata.tokens_used, 42);
        assert!(report.metadata.prompt_tokens > 0);
        assert!(!report.metadata.cached);
    }

    #[test]
    fn test_second_request_is_served_from_cache() {
        let service = AnalysisService::with_defaults(Counting::new(COMPLETE));
        let first = service.analyze(&request()).unwrap();
        let second = service.analyze(&request()).unwrap();

        assert_eq!(service.generator.calls.load(Ordering::SeqCst), 1);
        assert!(second.metadata.cached);
        assert_eq!(first.response, second.response);

        let other_version = AnalysisRequest { version: Some("def456".into()), ..request() };
        service.analyze(&other_version).unwrap();
        assert_eq!(service.generator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_version_derived_from_content() {
        let service = AnalysisService::with_defaults(Counting::new(COMPLETE));
        let mut req = AnalysisRequest { version: None, ..request() };
        service.analyze(&req).unwrap();
        service.analyze(&req).unwrap();
        assert_eq!(service.generator.calls.load(Ordering::SeqCst), 1);

        req.files[1].content.push_str("\nexport const x = 1;");
        service.analyze(&req).unwrap();
        assert_eq!(service.generator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rate_limit_rejects_before_generation() {
        let limiter = RateLimiter::new(RateLimitConfig { window_ms: 60_000, max_requests: 1 });
        let service = AnalysisService::with_parts(
            Counting::new(COMPLETE),
            AnalysisCache::new(CacheConfig::default()),
            limiter,
            1_000,
        );
        service.analyze(&request()).unwrap();
        let err = service.analyze(&request()).unwrap_err();
        assert!(matches!(err, AnalyzeError::RateLimited { .. }));

        let other_caller = AnalysisRequest { caller: "10.0.0.2".into(), ..request() };
        assert!(service.analyze(&other_caller).is_ok());
    }

    #[test]
    fn test_no_files_and_empty_selection() {
        let service = AnalysisService::with_defaults(Counting::new(COMPLETE));
        let empty = AnalysisRequest { files: Vec::new(), ..request() };
        assert!(matches!(service.analyze(&empty), Err(AnalyzeError::NoFiles)));

        let tight = AnalysisService::with_parts(
            Counting::new(COMPLETE),
            AnalysisCache::new(CacheConfig::default()),
            RateLimiter::default(),
            0,
        );
        match tight.analyze(&request()) {
            Err(AnalyzeError::EmptySelection { excluded }) => assert_eq!(excluded, 2),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(tight.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_total_lines_counts_excluded_files() {
        struct Capturing(std::sync::Mutex<String>);
        impl Generator for Capturing {
            fn generate(&self, prompt: &str) -> anyhow::Result<Generation> {
                *self.0.lock().unwrap() = prompt.to_string();
                Ok(Generation { content: COMPLETE.to_string(), model: "m".into(), tokens_used: 1 })
            }
        }

        let mut req = request();
        req.files.push(FileRecord::new("assets/data.txt", "a\nb\nc\n".repeat(2_000)));
        let service = AnalysisService::with_parts(
            Capturing(std::sync::Mutex::new(String::new())),
            AnalysisCache::new(CacheConfig::default()),
            RateLimiter::default(),
            200,
        );
        let report = service.analyze(&req).unwrap();

        assert_eq!(report.metadata.files_excluded, 1);
        assert_eq!(report.metadata.files_analyzed, 2);
        assert_eq!(report.metadata.total_lines, 3 + 6_000);

        let prompt = service.generator.0.lock().unwrap();
        assert!(prompt.contains("## Detected stack\nTypeScript\n"));
        assert!(prompt.contains("## Preliminary stage\nmvp\n"));
        assert!(!prompt.contains("### assets/data.txt"));
    }

    #[test]
    fn test_parse_failure_is_not_cached() {
        let service = AnalysisService::with_defaults(Counting::new("I cannot help with that."));
        assert!(matches!(service.analyze(&request()), Err(AnalyzeError::Parse(_))));
        assert!(service.analyze(&request()).is_err());
        assert_eq!(service.generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.cache().stats().size, 0);
    }

    #[test]
    fn test_generator_failure() {
        struct Failing;
        impl Generator for Failing {
            fn generate(&self, _prompt: &str) -> anyhow::Result<Generation> {
                anyhow::bail!("upstream returned 502")
            }
        }
        let service = AnalysisService::with_defaults(Failing);
        let err = service.analyze(&request()).unwrap_err();
        assert!(err.to_string().contains("upstream returned 502"));
    }

    #[test]
    fn test_clarification_passes_through() {
        let raw = r#"{"needs_clarification": true, "questions": [{"id": "goal", "question": "Who uses it?", "why": "Scope"}]}"#;
        let service = AnalysisService::with_defaults(ReplayGenerator::new(raw, "replay"));
        let report = service.analyze(&request()).unwrap();
        assert!(report.response.needs_clarification());
    }
}
