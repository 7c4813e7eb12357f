//! Shared types for the routing pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::types::AnalysisResult;
use crate::email::types::EmailMetadata;
use crate::pipeline::routing::RoutingDecision;

// ── Routed email ────────────────────────────────────────────────────

/// Everything the pipeline learned about one message.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedEmail {
    /// Identifier of the raw message (file name for directory sources).
    pub id: String,
    pub metadata: EmailMetadata,
    pub analysis: AnalysisResult,
    pub decision: RoutingDecision,
    /// Entity accuracy against the reference set, when one is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub processed_at: DateTime<Utc>,
}

// ── Per-message outcome ─────────────────────────────────────────────

/// Result of pushing one message through the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MessageOutcome {
    Routed(Box<RoutedEmail>),
    Failed { id: String, error: String },
}

impl MessageOutcome {
    pub fn id(&self) -> &str {
        match self {
            Self::Routed(routed) => &routed.id,
            Self::Failed { id, .. } => id,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Routed(_) => "routed",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_routed(&self) -> bool {
        matches!(self, Self::Routed(_))
    }
}

// ── Batch report ────────────────────────────────────────────────────

/// Outcomes of one batch, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<MessageOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_routed()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn routed(&self) -> impl Iterator<Item = &RoutedEmail> {
        self.outcomes.iter().filter_map(|o| match o {
            MessageOutcome::Routed(routed) => Some(routed.as_ref()),
            MessageOutcome::Failed { .. } => None,
        })
    }
}
