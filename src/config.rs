//! Configuration types.
//!
//! Everything is read from environment variables; see [`RouterConfig::from_env`].

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::analysis::types::Entities;
use crate::analysis::{AnalysisConfig, LabelMatching};
use crate::email::sample::sample_expected_entities;
use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::pipeline::controller::DEFAULT_MAX_CONCURRENT;

/// Directory scanned when `EMAIL_STORAGE_PATH` is unset.
pub const DEFAULT_STORAGE_PATH: &str = "emails";

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Directory holding `*.eml` files.
    pub storage_path: PathBuf,
    /// Seed an empty storage directory with the sample message.
    pub seed_sample: bool,
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    /// Messages processed at once.
    pub max_concurrent: usize,
    /// JSON object of expected entities; `None` means the sample reference.
    pub reference_entities: Option<PathBuf>,
    /// JSON-lines output; `None` means stdout.
    pub decisions_out: Option<PathBuf>,
}

impl RouterConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage_path = var("EMAIL_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH));

        let backend: LlmBackend = parse_or(
            var("ROUTER_LLM_BACKEND"),
            "ROUTER_LLM_BACKEND",
            LlmBackend::Anthropic,
        )?;
        let api_key = var(backend.api_key_var())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(backend.api_key_var().to_string()))?;
        let model = var("ROUTER_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let timeout_secs: u64 =
            parse_or(var("ROUTER_CALL_TIMEOUT_SECS"), "ROUTER_CALL_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(invalid("ROUTER_CALL_TIMEOUT_SECS", "must be greater than zero"));
        }

        let max_concurrent: usize = parse_or(
            var("ROUTER_MAX_CONCURRENT"),
            "ROUTER_MAX_CONCURRENT",
            DEFAULT_MAX_CONCURRENT,
        )?;
        if max_concurrent == 0 {
            return Err(invalid("ROUTER_MAX_CONCURRENT", "must be greater than zero"));
        }

        let label_matching = match var("ROUTER_LABEL_MATCHING") {
            Some(raw) => raw
                .parse::<LabelMatching>()
                .map_err(|message| invalid("ROUTER_LABEL_MATCHING", &message))?,
            None => LabelMatching::default(),
        };

        let max_content_chars = var("ROUTER_MAX_CONTENT_CHARS")
            .map(|raw| {
                raw.trim()
                    .parse::<usize>()
                    .map_err(|e| invalid("ROUTER_MAX_CONTENT_CHARS", &e.to_string()))
            })
            .transpose()?;

        let seed_sample = match var("ROUTER_SEED_SAMPLE") {
            Some(raw) => parse_bool("ROUTER_SEED_SAMPLE", &raw)?,
            None => true,
        };

        Ok(Self {
            storage_path,
            seed_sample,
            llm: LlmConfig {
                backend,
                api_key,
                model,
            },
            analysis: AnalysisConfig {
                call_timeout: Duration::from_secs(timeout_secs),
                label_matching,
                max_content_chars,
                ..AnalysisConfig::default()
            },
            max_concurrent,
            reference_entities: var("ROUTER_REFERENCE_ENTITIES").map(PathBuf::from),
            decisions_out: var("ROUTER_DECISIONS_OUT").map(PathBuf::from),
        })
    }

    /// Expected entities for similarity scoring.
    ///
    /// Reads the configured JSON file (an object of string values), or falls
    /// back to the entities of the built-in sample message.
    pub fn load_reference_entities(&self) -> Result<Entities, ConfigError> {
        let Some(path) = &self.reference_entities else {
            return Ok(sample_expected_entities());
        };
        let unreadable = |reason: String| ConfigError::Unreadable {
            path: path.clone(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| unreadable(e.to_string()))
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Parse `raw` if present, else use `default`.
fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, &e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(key, &format!("expected a boolean, got '{other}'"))),
    }
}
