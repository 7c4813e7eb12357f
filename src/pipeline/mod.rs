//! Email routing pipeline.
//!
//! Every inbound message flows through:
//! 1. `parse_email()`: headers, attachment names, text body
//! 2. `clean_content()`: markup stripped, whitespace collapsed
//! 3. `AnalysisOrchestrator::analyze()`: five concurrent LLM calls with defaults
//! 4. `route()`: deterministic department and actions
//! 5. `DecisionSink::emit()`: outcome handed downstream
//!
//! **Routing never consults the LLM.** The same analysis always yields the
//! same decision.

pub mod controller;
pub mod routing;
pub mod similarity;
pub mod sink;
pub mod types;

pub use controller::PipelineController;
pub use routing::{Department, RoutingDecision, route, route_analysis};
pub use similarity::{EntityMatch, compare_entities, similarity_score};
pub use sink::{DecisionSink, JsonLinesSink, LogSink};
pub use types::{BatchReport, MessageOutcome, RoutedEmail};
