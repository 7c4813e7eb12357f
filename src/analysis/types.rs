//! Analysis result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::vocab::{Category, EntityKind, Intent, Sentiment};

/// Value meaning "this entity was not found in the email".
pub const NOT_FOUND: &str = "N/A";

/// Summary used when summarization fails.
pub const SUMMARY_UNAVAILABLE: &str = "Summary not available.";

/// Extracted entities keyed by label.
///
/// Not restricted to the known [`EntityKind`]s: whatever keys the capability
/// returned are kept.
pub type Entities = BTreeMap<String, String>;

/// Every known entity kind mapped to [`NOT_FOUND`].
pub fn default_entities() -> Entities {
    EntityKind::ALL
        .iter()
        .map(|kind| (kind.as_str().to_string(), NOT_FOUND.to_string()))
        .collect()
}

/// The five independently produced analysis fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisField {
    Category,
    Entities,
    Intent,
    Sentiment,
    Summary,
}

impl AnalysisField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Entities => "entities",
            Self::Intent => "intent",
            Self::Sentiment => "sentiment",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for AnalysisField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic analysis of one email.
///
/// Fields may disagree with each other (a "Feedback" email with "Negative"
/// sentiment); nothing reconciles them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub category: Category,
    pub entities: Entities,
    pub intent: Intent,
    pub sentiment: Sentiment,
    pub summary: String,
    /// Fields that fell back to their default because the call failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<AnalysisField>,
}

impl AnalysisResult {
    /// The result produced when every call fails.
    pub fn fallback() -> Self {
        Self {
            category: Category::fallback(),
            entities: default_entities(),
            intent: Intent::fallback(),
            sentiment: Sentiment::fallback(),
            summary: SUMMARY_UNAVAILABLE.to_string(),
            degraded: vec![
                AnalysisField::Category,
                AnalysisField::Entities,
                AnalysisField::Intent,
                AnalysisField::Sentiment,
                AnalysisField::Summary,
            ],
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}
