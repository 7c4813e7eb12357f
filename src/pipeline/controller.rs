//! Pipeline controller: drives raw messages through parse → clean →
//! analyze → route, one spawned task per message.
//!
//! A failing message never fails its batch. Each failure becomes a
//! [`MessageOutcome::Failed`] in the report, at the same position the
//! message had in the input.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::analysis::AnalysisOrchestrator;
use crate::analysis::types::Entities;
use crate::email::normalize::clean_content;
use crate::email::parser::parse_email;
use crate::email::source::{MessageSource, RawMessage};
use crate::error::PipelineError;
use crate::pipeline::routing::route_analysis;
use crate::pipeline::sink::DecisionSink;
use crate::pipeline::similarity::compare_entities;
use crate::pipeline::types::{BatchReport, MessageOutcome, RoutedEmail};

/// Default number of messages processed at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

#[derive(Clone)]
pub struct PipelineController {
    orchestrator: Arc<AnalysisOrchestrator>,
    reference: Option<Arc<Entities>>,
    max_concurrent: usize,
}

impl PipelineController {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>) -> Self {
        Self {
            orchestrator,
            reference: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Score every routed email's entities against `expected`.
    pub fn with_reference(mut self, expected: Entities) -> Self {
        self.reference = Some(Arc::new(expected));
        self
    }

    /// Messages in flight at once; `1` processes strictly one after another.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run one message through the full pipeline.
    pub async fn process(&self, message: &RawMessage) -> Result<RoutedEmail, PipelineError> {
        info!(id = %message.id, bytes = message.bytes.len(), "Processing email");

        let parsed = parse_email(&message.bytes)?;
        debug!(
            id = %message.id,
            sender = %parsed.metadata.sender,
            subject = %parsed.metadata.subject,
            attachments = parsed.metadata.attachments.len(),
            "Parsed email"
        );

        let body = parsed.body.ok_or(PipelineError::NoTextBody)?;
        let content = clean_content(&body);

        let analysis = self.orchestrator.analyze(&content).await;
        if analysis.is_degraded() {
            warn!(
                id = %message.id,
                degraded = ?analysis.degraded,
                "Analysis fell back to defaults"
            );
        }

        let decision = route_analysis(&analysis, &parsed.metadata);

        let similarity = self.reference.as_deref().map(|expected| {
            let counts = compare_entities(&analysis.entities, expected);
            info!(
                id = %message.id,
                matched = counts.matched,
                compared = counts.total,
                score = counts.score(),
                "Entity similarity"
            );
            counts.score()
        });

        Ok(RoutedEmail {
            id: message.id.clone(),
            metadata: parsed.metadata,
            analysis,
            decision,
            similarity,
            processed_at: Utc::now(),
        })
    }

    /// Process a batch, keeping input order in the report.
    ///
    /// Every message runs in its own task, so a panic while processing one
    /// message is reported as that message's failure.
    pub async fn process_batch(&self, messages: Vec<RawMessage>) -> BatchReport {
        let count = messages.len();
        info!(count, max_concurrent = self.max_concurrent, "Processing email batch");

        let outcomes: Vec<MessageOutcome> = stream::iter(messages)
            .map(|message| {
                let controller = self.clone();
                let id = message.id.clone();
                let handle = tokio::spawn(async move { controller.process(&message).await });
                async move {
                    let result = handle
                        .await
                        .unwrap_or_else(|e| Err(PipelineError::Task(e.to_string())));
                    match result {
                        Ok(routed) => MessageOutcome::Routed(Box::new(routed)),
                        Err(e) => {
                            error!(id = %id, error = %e, "Failed to process email");
                            MessageOutcome::Failed {
                                id,
                                error: e.to_string(),
                            }
                        }
                    }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let report = BatchReport { outcomes };
        info!(
            routed = report.succeeded(),
            failed = report.failed(),
            total = count,
            "Batch processing complete"
        );
        report
    }

    /// Fetch everything from `source`, process it, and emit each outcome.
    ///
    /// Only a source failure aborts the run. Sink failures are logged per
    /// outcome and the remaining outcomes are still emitted.
    pub async fn run(
        &self,
        source: &dyn MessageSource,
        sink: &dyn DecisionSink,
    ) -> Result<BatchReport, PipelineError> {
        let messages = source.fetch().await?;
        info!(source = source.name(), count = messages.len(), "Fetched emails");

        let report = self.process_batch(messages).await;
        for outcome in &report.outcomes {
            if let Err(e) = sink.emit(outcome).await {
                warn!(id = %outcome.id(), error = %e, "Failed to emit outcome");
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::analysis::AnalysisConfig;
    use crate::analysis::vocab::Category;
    use crate::error::{LlmError, SourceError};
    use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};
    use crate::pipeline::routing::Department;

    /// Mock LLM keyed on words in the email text.
    ///
    /// "fraud" classifies as Fraud Report, "panic" panics, "slow" delays the
    /// answer. Everything else is General Inquiry.
    struct KeywordLlm;

    #[async_trait]
    impl LlmProvider for KeywordLlm {
        fn model_name(&self) -> &str {
            "keyword"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let prompt = request.last_user_content().to_string();
            if prompt.contains("panic") {
                panic!("provider blew up");
            }
            if prompt.contains("slow") {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            let answer = if prompt.starts_with("Classify") {
                if prompt.contains("fraud") {
                    "Fraud Report"
                } else {
                    "General Inquiry"
                }
            } else if prompt.starts_with("Extract") {
                "Account Number: 1234567890\nCustomer Name: Jane Doe"
            } else if prompt.contains("primary intent") {
                "Report a Problem"
            } else if prompt.starts_with("What is the sentiment") {
                "Negative"
            } else {
                "Short summary."
            };
            Ok(CompletionResponse::text(answer))
        }
    }

    fn controller() -> PipelineController {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(KeywordLlm), AnalysisConfig::default());
        PipelineController::new(Arc::new(orchestrator))
    }

    fn email(id: &str, body: &str) -> RawMessage {
        RawMessage::new(
            id,
            format!("From: a@b.com\r\nSubject: {id}\r\nDate: today\r\n\r\n{body}\r\n"),
        )
    }

    #[tokio::test]
    async fn process_routes_by_category() {
        let routed = controller()
            .process(&email("1", "<p>This is fraud on my account</p>"))
            .await
            .unwrap();

        assert_eq!(routed.id, "1");
        assert_eq!(routed.analysis.category, Category::FraudReport);
        assert_eq!(routed.decision.destination, Department::Fraud);
        assert_eq!(
            routed.decision.actions.send_acknowledgment.map(|a| a.to),
            Some("a@b.com".to_string())
        );
        assert_eq!(routed.metadata.timestamp, "today");
        assert!(routed.similarity.is_none());
    }

    #[tokio::test]
    async fn process_scores_against_reference() {
        let reference = Entities::from([
            ("Account Number".to_string(), "1234567890".to_string()),
            ("Customer Name".to_string(), "John Smith".to_string()),
            ("Amount".to_string(), "1000".to_string()),
        ]);
        let routed = controller()
            .with_reference(reference)
            .process(&email("1", "hello"))
            .await
            .unwrap();
        assert_eq!(routed.similarity, Some(0.5));
    }

    #[tokio::test]
    async fn multipart_without_text_body_fails() {
        let raw = "From: a@b.com\r\n\
Content-Type: multipart/alternative; boundary=\"b\"\r\n\
\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>html only</p>\r\n\
--b--\r\n";
        let err = controller()
            .process(&RawMessage::new("html", raw))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoTextBody));
    }

    #[tokio::test]
    async fn empty_message_is_a_parse_failure() {
        let err = controller()
            .process(&RawMessage::new("empty", Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn batch_continues_past_failures_and_keeps_order() {
        let messages = vec![
            email("slow", "slow fraud report"),
            RawMessage::new("empty", Vec::new()),
            email("panic", "panic now"),
            email("fast", "quick question"),
        ];

        let report = controller().process_batch(messages).await;

        let ids: Vec<&str> = report.outcomes.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec!["slow", "empty", "panic", "fast"]);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 2);
        assert!(report.outcomes[0].is_routed());
        match &report.outcomes[2] {
            MessageOutcome::Failed { error, .. } => assert!(error.contains("task failed")),
            other => panic!("expected failure, got {}", other.label()),
        }
    }

    #[tokio::test]
    async fn sequential_batch_matches_concurrent_batch() {
        let messages = vec![email("a", "fraud"), email("b", "hello")];
        let sequential = controller()
            .with_max_concurrent(1)
            .process_batch(messages.clone())
            .await;
        let concurrent = controller().process_batch(messages).await;

        let destinations = |report: &BatchReport| -> Vec<Department> {
            report.routed().map(|r| r.decision.destination).collect()
        };
        assert_eq!(destinations(&sequential), destinations(&concurrent));
        assert_eq!(
            destinations(&sequential),
            vec![Department::Fraud, Department::CustomerService]
        );
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        assert_eq!(controller().with_max_concurrent(0).max_concurrent(), 1);
    }

    struct VecSource(Vec<RawMessage>);

    #[async_trait]
    impl MessageSource for VecSource {
        fn name(&self) -> &str {
            "vec"
        }

        async fn fetch(&self) -> Result<Vec<RawMessage>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl MessageSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch(&self) -> Result<Vec<RawMessage>, SourceError> {
            Err(SourceError::Io {
                path: "/nowhere".into(),
                source: std::io::Error::other("gone"),
            })
        }
    }

    /// Records emitted ids and rejects the first emission.
    #[derive(Default)]
    struct FlakySink {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DecisionSink for FlakySink {
        async fn emit(&self, outcome: &MessageOutcome) -> Result<(), PipelineError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(outcome.id().to_string());
            if seen.len() == 1 {
                return Err(PipelineError::Sink("rejected".into()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_emits_every_outcome_despite_sink_errors() {
        let source = VecSource(vec![email("a", "hi"), RawMessage::new("b", Vec::new())]);
        let sink = FlakySink::default();

        let report = controller().run(&source, &sink).await.unwrap();

        assert_eq!(report.total(), 2);
        assert_eq!(*sink.seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn run_fails_when_source_fails() {
        let err = controller()
            .run(&FailingSource, &FlakySink::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }
}
