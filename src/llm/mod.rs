//! Everything between a prompt and a validated analysis: prompt assembly, the
//! generator seam, and defensive recovery of typed results from raw output.

pub mod extract;
pub mod generator;
pub mod outline;
pub mod parse;
pub mod prompt;
pub mod repair;
pub mod schema;

pub use generator::{Generation, Generator, ReplayGenerator};
pub use parse::{parse_and_validate_analysis_response, parse_json_response};
pub use outline::{detect_stage, detect_tech_stack, ProjectOutline};
pub use prompt::{build_analysis_prompt, build_chat_prompt};
pub use schema::{validate_analysis, Analysis, AnalysisEnvelope, AnalysisResponse};
