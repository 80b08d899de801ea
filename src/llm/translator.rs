//! Generative fallback translator.
//!
//! [`FallbackTranslator`] is consulted only when the store has no answer.
//! One call runs: prompt → model (with retry and a per-attempt timeout) →
//! text extraction → cleaning → impossibility check → quality gate.
//!
//! Transport failures that survive every retry are returned as `Err`; all
//! other unsuccessful paths are an `Ok` [`FallbackOutcome`] so callers can
//! tell "the model said no" from "the model could not be reached".

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::LlmConfig;
use crate::llm::cleaning::{clean_response, is_impossible};
use crate::llm::client::{GenerationParams, GenerativeModel, LlmError};
use crate::llm::prompt::{PromptBuilder, IMPOSSIBLE_SENTINEL};
use crate::llm::retry::RetryPolicy;
use crate::llm::validate::{validate, RejectReason};

// ---------------------------------------------------------------------------
// FallbackOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// A cleaned translation that passed the quality gate.
    Translated(String),
    /// The model explicitly declined to translate.
    Untranslatable,
    /// The answer was missing or failed the quality gate.
    Rejected(RejectReason),
    /// No usable model is configured; nothing was attempted.
    Unavailable,
}

// ---------------------------------------------------------------------------
// FallbackTranslator
// ---------------------------------------------------------------------------

pub struct FallbackTranslator {
    model: Arc<dyn GenerativeModel>,
    params: GenerationParams,
    retry: RetryPolicy,
    attempt_timeout: Duration,
    /// Sampled once at construction.
    available: bool,
}

impl FallbackTranslator {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        params: GenerationParams,
        retry: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        let available = model.is_available();
        if available {
            log::info!("llm: generative fallback ready");
        } else {
            log::warn!("llm: no API key configured, generative fallback disabled");
        }
        Self {
            model,
            params,
            retry,
            attempt_timeout,
            available,
        }
    }

    /// Build with generation, retry and timeout settings from `config`.
    pub fn from_config(model: Arc<dyn GenerativeModel>, config: &LlmConfig) -> Self {
        Self::new(
            model,
            GenerationParams::from(config),
            RetryPolicy::from(config),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Translate French `text` into `target`.
    pub async fn translate(&self, text: &str, target: &str) -> Result<FallbackOutcome, LlmError> {
        if !self.available {
            log::debug!("llm: fallback unavailable, skipping {target}");
            return Ok(FallbackOutcome::Unavailable);
        }
        if text.trim().is_empty() {
            log::warn!("llm: empty text, model not called");
            return Ok(FallbackOutcome::Rejected(RejectReason::EmptyInput));
        }

        let prompt = PromptBuilder::new(target).build(text);
        log::debug!("llm: translating {:?} -> {target}", preview(text));

        let (model, params, limit) = (&self.model, &self.params, self.attempt_timeout);
        let prompt = prompt.as_str();
        let response = self
            .retry
            .run(move |_| async move {
                match tokio::time::timeout(limit, model.generate(prompt, params)).await {
                    Ok(result) => result,
                    Err(_) => Err(LlmError::Timeout),
                }
            })
            .await?;

        let Some(raw) = extract_text(&response) else {
            log::warn!("llm: no text in response for {:?}", preview(text));
            return Ok(FallbackOutcome::Rejected(RejectReason::NoContent));
        };

        // The label rules would eat the "TRADUCTION" half of the sentinel,
        // so the sentinel itself is matched on the raw answer.
        let cleaned = clean_response(&raw);
        if is_sentinel(&raw) || is_impossible(&cleaned) {
            log::info!("llm: model reports {:?} cannot be translated into {target}", preview(text));
            return Ok(FallbackOutcome::Untranslatable);
        }

        if let Err(reason) = validate(text, &cleaned) {
            log::warn!("llm: rejected answer for {:?} -> {target}: {reason}", preview(text));
            return Ok(FallbackOutcome::Rejected(reason));
        }

        log::info!("llm: translated {:?} -> {:?}", preview(text), preview(&cleaned));
        Ok(FallbackOutcome::Translated(cleaned))
    }
}

/// Concatenate `candidates[0].content.parts[*].text`.
///
/// Returns `None` when any level is missing or no part has text.
pub fn extract_text(response: &Value) -> Option<String> {
    let parts = response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();

    (!text.is_empty()).then_some(text)
}

/// Whether the raw answer is the bare sentinel, optionally quoted or
/// followed by punctuation.
fn is_sentinel(raw: &str) -> bool {
    let bare = raw.trim().trim_matches(['"', '\'', '`']).trim();
    bare.get(..IMPOSSIBLE_SENTINEL.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(IMPOSSIBLE_SENTINEL))
        && bare[IMPOSSIBLE_SENTINEL.len()..]
            .chars()
            .all(|c| c.is_ascii_punctuation() || c.is_whitespace())
}

/// First 30 characters, for log lines.
fn preview(text: &str) -> String {
    text.chars().take(30).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
