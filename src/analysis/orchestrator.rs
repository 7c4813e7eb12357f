//! Analysis orchestrator: five independent completion calls per email.
//!
//! Each call returns `Result<_, AnalysisCallError>`. `analyze()` issues all
//! five concurrently, joins them, and substitutes the per-field default for
//! any call that failed. Failures never reach the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::analysis::prompts;
use crate::analysis::types::{
    AnalysisField, AnalysisResult, Entities, SUMMARY_UNAVAILABLE, default_entities,
};
use crate::analysis::vocab::{Category, Intent, LabelMatching, Sentiment};
use crate::error::AnalysisCallError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Default timeout applied to every completion call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the analysis calls.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Upper bound on a single completion call; exceeding it is a failure.
    pub call_timeout: Duration,
    /// How label responses are matched against the vocabularies.
    pub label_matching: LabelMatching,
    /// Temperature for every call.
    pub temperature: f32,
    /// Max tokens for label and entity calls.
    pub max_tokens: u32,
    /// Max tokens for the summary call.
    pub summary_max_tokens: u32,
    /// Truncate the email text in prompts to this many characters.
    pub max_content_chars: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            label_matching: LabelMatching::Exact,
            temperature: 0.0,
            max_tokens: 256,
            summary_max_tokens: 512,
            max_content_chars: None,
        }
    }
}

/// Substitutes a default value for a failed analysis call.
pub trait Fallback<T> {
    /// The value on success; otherwise logs the failure, records the field as
    /// degraded, and returns `default()`.
    fn or_fallback(self, degraded: &mut Vec<AnalysisField>, default: impl FnOnce() -> T) -> T;
}

impl<T> Fallback<T> for Result<T, AnalysisCallError> {
    fn or_fallback(self, degraded: &mut Vec<AnalysisField>, default: impl FnOnce() -> T) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                warn!(field = %e.field(), error = %e, "Analysis call failed, using default");
                degraded.push(e.field());
                default()
            }
        }
    }
}

/// Runs the semantic analysis of cleaned email text.
pub struct AnalysisOrchestrator {
    llm: Arc<dyn LlmProvider>,
    config: AnalysisConfig,
}

impl AnalysisOrchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AnalysisConfig) -> Self {
        Self { llm, config }
    }

    /// Run all five analyses concurrently and assemble the result.
    pub async fn analyze(&self, content: &str) -> AnalysisResult {
        let (category, entities, intent, sentiment, summary) = tokio::join!(
            self.classify(content),
            self.extract_entities(content),
            self.recognize_intent(content),
            self.analyze_sentiment(content),
            self.summarize(content),
        );

        let mut degraded = Vec::new();
        let result = AnalysisResult {
            category: category.or_fallback(&mut degraded, Category::fallback),
            entities: entities.or_fallback(&mut degraded, default_entities),
            intent: intent.or_fallback(&mut degraded, Intent::fallback),
            sentiment: sentiment.or_fallback(&mut degraded, Sentiment::fallback),
            summary: summary.or_fallback(&mut degraded, || SUMMARY_UNAVAILABLE.to_string()),
            degraded,
        };

        debug!(
            category = %result.category,
            intent = %result.intent,
            sentiment = %result.sentiment,
            entities = result.entities.len(),
            degraded = result.degraded.len(),
            "Analysis complete"
        );
        result
    }

    /// Pick one of the nine categories.
    pub async fn classify(&self, content: &str) -> Result<Category, AnalysisCallError> {
        let prompt = prompts::classification_prompt(content, self.config.max_content_chars);
        let raw = self
            .call(AnalysisField::Category, prompt, self.config.max_tokens)
            .await?;
        Ok(self.label(AnalysisField::Category, Category::parse(&raw, self.config.label_matching)))
    }

    /// Extract entity values as `Key: value` lines.
    pub async fn extract_entities(&self, content: &str) -> Result<Entities, AnalysisCallError> {
        let prompt = prompts::entity_prompt(content, self.config.max_content_chars);
        let raw = self
            .call(AnalysisField::Entities, prompt, self.config.max_tokens)
            .await?;
        Ok(parse_entities(&raw))
    }

    /// Pick one of the five intents.
    pub async fn recognize_intent(&self, content: &str) -> Result<Intent, AnalysisCallError> {
        let prompt = prompts::intent_prompt(content, self.config.max_content_chars);
        let raw = self
            .call(AnalysisField::Intent, prompt, self.config.max_tokens)
            .await?;
        Ok(self.label(AnalysisField::Intent, Intent::parse(&raw, self.config.label_matching)))
    }

    /// Pick one of the three sentiments.
    pub async fn analyze_sentiment(&self, content: &str) -> Result<Sentiment, AnalysisCallError> {
        let prompt = prompts::sentiment_prompt(content, self.config.max_content_chars);
        let raw = self
            .call(AnalysisField::Sentiment, prompt, self.config.max_tokens)
            .await?;
        Ok(self.label(
            AnalysisField::Sentiment,
            Sentiment::parse(&raw, self.config.label_matching),
        ))
    }

    /// Summarize in three sentences or less.
    pub async fn summarize(&self, content: &str) -> Result<String, AnalysisCallError> {
        let prompt = prompts::summary_prompt(content, self.config.max_content_chars);
        self.call(AnalysisField::Summary, prompt, self.config.summary_max_tokens)
            .await
    }

    /// Warn about labels outside the vocabulary; they are passed through.
    fn label<L: Labelled>(&self, field: AnalysisField, value: L) -> L {
        if !value.recognized() {
            warn!(field = %field, response = %value.text(), "Response is not a known label");
        }
        value
    }

    /// One completion call with the configured timeout, trimmed.
    ///
    /// An empty answer is not a failure; only a provider error or a timeout is.
    async fn call(
        &self,
        field: AnalysisField,
        prompt: String,
        max_tokens: u32,
    ) -> Result<String, AnalysisCallError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(self.config.temperature)
            .with_max_tokens(max_tokens);

        let response = with_timeout(field, self.config.call_timeout, self.llm.complete(request))
            .await?
            .map_err(|source| AnalysisCallError::Llm { field, source })?;

        debug!(
            field = %field,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Completion received"
        );
        Ok(response.content.trim().to_string())
    }
}

/// Await `fut`, failing with `Timeout` when it takes longer than `after`.
async fn with_timeout<F: Future>(
    field: AnalysisField,
    after: Duration,
    fut: F,
) -> Result<F::Output, AnalysisCallError> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| AnalysisCallError::Timeout { field, after })
}

/// Parse `Key: value` lines into entities.
///
/// Any line boundary counts, including a lone `\r` and the Unicode line and
/// paragraph separators. Lines without a colon are dropped; the split is on the first colon; key
/// and value are trimmed; a repeated key keeps its last value. Keys outside
/// the known entity kinds are kept.
pub fn parse_entities(raw: &str) -> Entities {
    let mut entities = Entities::new();
    for line in raw.split(is_line_break) {
        if let Some((key, value)) = line.split_once(':') {
            entities.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    entities
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}'
            | '\u{2029}'
    )
}

/// Common view over the label enums for logging.
trait Labelled {
    fn recognized(&self) -> bool;
    fn text(&self) -> &str;
}

impl Labelled for Category {
    fn recognized(&self) -> bool {
        self.is_recognized()
    }
    fn text(&self) -> &str {
        self.as_str()
    }
}

impl Labelled for Intent {
    fn recognized(&self) -> bool {
        self.is_recognized()
    }
    fn text(&self) -> &str {
        self.as_str()
    }
}

impl Labelled for Sentiment {
    fn recognized(&self) -> bool {
        self.is_recognized()
    }
    fn text(&self) -> &str {
        self.as_str()
    }
}
