//! Semantic analysis of email text through the completion capability.

pub mod orchestrator;
pub mod prompts;
pub mod types;
pub mod vocab;

pub use orchestrator::{AnalysisConfig, AnalysisOrchestrator, Fallback, parse_entities};
pub use types::{AnalysisField, AnalysisResult, Entities, NOT_FOUND, default_entities};
pub use vocab::{Category, EntityKind, Intent, LabelMatching, Sentiment};
