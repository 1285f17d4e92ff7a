//! repo-insight: defensive shaping of project-analysis requests and responses.
//!
//! Files go in through [`select`], which fits the most important ones into a
//! token budget. Generator output comes back through [`llm`], which recovers
//! and validates a typed analysis from unreliable text. [`cache`] and
//! [`limit`] bound repeated and excessive calls, and [`service`] wires the
//! steps together.

pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod limit;
pub mod llm;
pub mod rank;
pub mod scan;
pub mod select;
pub mod service;
pub mod utils;

pub use cache::{AnalysisCache, CacheConfig, CacheStats};
pub use domain::{FileRecord, SelectionResult};
pub use error::{AnalyzeError, ParseError, SchemaViolation};
pub use limit::{RateDecision, RateLimiter, RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW};
pub use llm::{parse_and_validate_analysis_response, parse_json_response, AnalysisResponse};
pub use rank::file_priority;
pub use select::{select_files, select_files_for_analysis};
pub use utils::estimate_tokens;
