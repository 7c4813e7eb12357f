//! Integration tests for the routing pipeline.
//!
//! Each test points a `DirectorySource` at a temp directory, runs the
//! controller against a stub LLM, and checks the JSON-lines output.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::timeout;

use inbox_router::analysis::{AnalysisConfig, AnalysisOrchestrator};
use inbox_router::email::{DirectorySource, sample_expected_entities};
use inbox_router::error::LlmError;
use inbox_router::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};
use inbox_router::pipeline::{JsonLinesSink, PipelineController};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Stub LLM that answers the way a good model would for the sample fraud
/// report, and counts the calls it receives.
#[derive(Default)]
struct StubLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.last_user_content();
        let content = if prompt.starts_with("Classify") {
            if prompt.contains("unauthorized transaction") {
                "Fraud Report"
            } else {
                "Complaint"
            }
        } else if prompt.starts_with("Extract") {
            "Account Number: 1234567890\n\
             Transaction ID: N/A\n\
             Customer Name: John Smith\n\
             Phone Number: 555-123-4567\n\
             Email Address: customer@example.com\n\
             Date: 2024-07-24T10:00:00\n\
             Amount: $1000\n\
             Product Type: N/A"
        } else if prompt.contains("primary intent") {
            "Report a Problem"
        } else if prompt.starts_with("What is the sentiment") {
            "Negative"
        } else {
            "The customer reports an unauthorized $1000 transaction."
        };
        Ok(CompletionResponse::text(content))
    }
}

/// Stub LLM whose every call fails.
struct DownLlm;

#[async_trait]
impl LlmProvider for DownLlm {
    fn model_name(&self) -> &str {
        "down"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::RequestFailed {
            provider: "down".into(),
            reason: "connection refused".into(),
        })
    }
}

fn controller(llm: Arc<dyn LlmProvider>) -> PipelineController {
    let orchestrator = AnalysisOrchestrator::new(llm, AnalysisConfig::default());
    PipelineController::new(Arc::new(orchestrator))
}

fn lines(bytes: Vec<u8>) -> Vec<Value> {
    String::from_utf8(bytes)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn seeded_sample_is_routed_to_fraud_department() {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(StubLlm::default());
    let controller = controller(llm.clone()).with_reference(sample_expected_entities());
    let source = DirectorySource::new(dir.path().join("emails"));
    let sink = JsonLinesSink::new(Vec::new());

    let report = timeout(TEST_TIMEOUT, controller.run(&source, &sink))
        .await
        .expect("pipeline hung")
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 5);

    let out = lines(sink.into_inner());
    assert_eq!(out.len(), 1);
    let decision = &out[0];
    assert_eq!(decision["status"], "routed");
    assert_eq!(decision["id"], "sample_email.eml");
    assert_eq!(decision["metadata"]["sender"], "customer@example.com");
    assert_eq!(decision["metadata"]["subject"], "Urgent: Unauthorized Transaction");
    assert_eq!(decision["metadata"]["attachments"][0], "document.txt");
    assert_eq!(decision["analysis"]["category"], "Fraud Report");
    assert_eq!(decision["analysis"]["intent"], "Report a Problem");
    assert_eq!(decision["decision"]["destination"], "Fraud Department");
    assert_eq!(
        decision["decision"]["actions"]["create_ticket"],
        serde_json::json!({"system": "CRM", "priority": "High"})
    );
    assert_eq!(
        decision["decision"]["actions"]["send_acknowledgment"]["to"],
        "customer@example.com"
    );

    // "$1000" differs from the reference "1000"; the other seven match.
    let similarity = decision["similarity"].as_f64().unwrap();
    assert!((similarity - 7.0 / 8.0).abs() < 1e-9);
}

#[tokio::test]
async fn bad_messages_do_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("01-empty.eml"), "").unwrap();
    std::fs::write(
        dir.path().join("02-complaint.eml"),
        "From: Ann <ann@example.com>\r\nSubject: Still waiting\r\n\r\n\
         <p>I have called three times and nobody helps.</p>\r\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("03-html-only.eml"),
        "From: bob@example.com\r\n\
         Content-Type: multipart/alternative; boundary=\"x\"\r\n\r\n\
         --x\r\nContent-Type: text/html\r\n\r\n<b>hi</b>\r\n--x--\r\n",
    )
    .unwrap();

    let controller = controller(Arc::new(StubLlm::default()));
    let source = DirectorySource::new(dir.path());
    let sink = JsonLinesSink::new(Vec::new());

    let report = timeout(TEST_TIMEOUT, controller.run(&source, &sink))
        .await
        .expect("pipeline hung")
        .unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.failed(), 2);

    let out = lines(sink.into_inner());
    let statuses: Vec<&str> = out.iter().map(|v| v["status"].as_str().unwrap()).collect();
    assert_eq!(statuses, vec!["failed", "routed", "failed"]);
    assert_eq!(out[1]["metadata"]["sender"], "Ann <ann@example.com>");
    assert_eq!(out[1]["decision"]["destination"], "Customer Relations Department");
    assert_eq!(out[1]["decision"]["actions"]["escalate"], true);
    assert!(out[2]["error"].as_str().unwrap().contains("text/plain"));
}

#[tokio::test]
async fn unavailable_llm_routes_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let controller = controller(Arc::new(DownLlm));
    let source = DirectorySource::new(dir.path());
    let sink = JsonLinesSink::new(Vec::new());

    let report = timeout(TEST_TIMEOUT, controller.run(&source, &sink))
        .await
        .expect("pipeline hung")
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    let out = lines(sink.into_inner());
    let decision = &out[0];
    assert_eq!(decision["analysis"]["category"], "General Inquiry");
    assert_eq!(decision["analysis"]["intent"], "General Inquiry");
    assert_eq!(decision["analysis"]["sentiment"], "Neutral");
    assert_eq!(decision["analysis"]["summary"], "Summary not available.");
    assert_eq!(decision["analysis"]["entities"]["Account Number"], "N/A");
    assert_eq!(decision["analysis"]["degraded"].as_array().unwrap().len(), 5);
    assert_eq!(decision["decision"]["destination"], "Customer Service Department");
    assert_eq!(decision["decision"]["actions"], serde_json::json!({}));
}
