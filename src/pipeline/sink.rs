//! Decision sinks: where routing outcomes go once a message is done.

use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::PipelineError;
use crate::pipeline::types::MessageOutcome;

/// Receives every outcome of a batch, in input order.
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn emit(&self, outcome: &MessageOutcome) -> Result<(), PipelineError>;
}

/// Writes one log line per outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl DecisionSink for LogSink {
    async fn emit(&self, outcome: &MessageOutcome) -> Result<(), PipelineError> {
        match outcome {
            MessageOutcome::Routed(routed) => info!(
                id = %routed.id,
                sender = %routed.metadata.sender,
                subject = %routed.metadata.subject,
                destination = %routed.decision.destination,
                actions = ?routed.decision.actions.names(),
                similarity = ?routed.similarity,
                "Email routed"
            ),
            MessageOutcome::Failed { id, error } => {
                error!(id = %id, error = %error, "Email failed")
            }
        }
        Ok(())
    }
}

/// Writes each outcome as one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<W: Write + Send> DecisionSink for JsonLinesSink<W> {
    async fn emit(&self, outcome: &MessageOutcome) -> Result<(), PipelineError> {
        let line =
            serde_json::to_string(outcome).map_err(|e| PipelineError::Sink(e.to_string()))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| PipelineError::Sink("writer lock poisoned".into()))?;
        writeln!(writer, "{line}")
            .and_then(|()| writer.flush())
            .map_err(|e| PipelineError::Sink(e.to_string()))
    }
}
