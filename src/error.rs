//! Error types for the inbox router.

use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::types::AnalysisField;

/// Top-level error type for the router.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// A raw message could not be decoded into metadata and body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("message is empty")]
    Empty,

    #[error("no message structure could be parsed")]
    Malformed,
}

/// A single analysis call against the completion capability failed.
///
/// Never escapes the orchestrator: each field has a default that replaces it.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisCallError {
    #[error("{field} call failed: {source}")]
    Llm {
        field: AnalysisField,
        #[source]
        source: LlmError,
    },

    #[error("{field} call timed out after {after:?}")]
    Timeout { field: AnalysisField, after: Duration },
}

impl AnalysisCallError {
    /// The analysis field the failed call was producing.
    pub fn field(&self) -> AnalysisField {
        match self {
            Self::Llm { field, .. } | Self::Timeout { field, .. } => *field,
        }
    }
}

/// Message source errors.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to seed sample message: {0}")]
    Sample(#[from] SampleError),
}

/// Building the demo message failed.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("invalid address {address}: {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),
}

/// Pipeline-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("Message has no text/plain body")]
    NoTextBody,

    #[error("Message task failed: {0}")]
    Task(String),

    #[error("Source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Sink failed: {0}")]
    Sink(String),
}

/// Result type alias for the router.
pub type Result<T> = std::result::Result<T, Error>;
