//! Core `GenerativeModel` trait and the Gemini REST implementation.
//!
//! [`GeminiModel`] calls `{base_url}/models/{model}:generateContent` and
//! hands back the raw JSON response; pulling the text out of the candidate
//! structure is left to the translator so a malformed answer is a rejected
//! translation rather than a transport error.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::LlmConfig;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur while calling the generative model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key is configured.
    #[error("generative model is not configured")]
    NotConfigured,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("LLM request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("LLM API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response body was not valid JSON.
    #[error("failed to parse LLM response: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Client errors other than rate limiting (bad key, bad request) and a
    /// missing configuration are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::NotConfigured => false,
            LlmError::Request(_) | LlmError::Timeout | LlmError::Parse(_) => true,
            LlmError::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationParams
// ---------------------------------------------------------------------------

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 200,
            temperature: 0.2,
            top_p: 0.8,
            top_k: 40,
        }
    }
}

impl From<&LlmConfig> for GenerationParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerativeModel trait
// ---------------------------------------------------------------------------

/// Async trait for text-generation backends.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn GenerativeModel>`.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Whether the model has what it needs (credentials) to be called.
    fn is_available(&self) -> bool;

    /// Run one generation and return the provider's structured response.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Value, LlmError>;
}

// ---------------------------------------------------------------------------
// GeminiModel
// ---------------------------------------------------------------------------

/// Google Gemini `generateContent` client.
///
/// All connection details (`base_url`, `api_key`, `model`) come from the
/// [`LlmConfig`] passed to [`GeminiModel::from_config`].
pub struct GeminiModel {
    client: reqwest::Client,
    config: LlmConfig,
}

impl GeminiModel {
    /// Build a `GeminiModel` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

/// Request body for one single-turn prompt.
fn request_body(prompt: &str, params: &GenerationParams) -> Value {
    serde_json::json!({
        "contents": [
            { "role": "user", "parts": [ { "text": prompt } ] }
        ],
        "generationConfig": {
            "maxOutputTokens": params.max_output_tokens,
            "temperature":     params.temperature,
            "topP":            params.top_p,
            "topK":            params.top_k
        }
    })
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    fn is_available(&self) -> bool {
        self.api_key().is_some()
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Value, LlmError> {
        let key = self.api_key().ok_or(LlmError::NotConfigured)?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&request_body(prompt, params))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(|s| s.to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn availability_follows_api_key() {
        assert!(!GeminiModel::from_config(&make_config(None)).is_available());
        assert!(!GeminiModel::from_config(&make_config(Some("  "))).is_available());
        assert!(GeminiModel::from_config(&make_config(Some("AIza-test"))).is_available());
    }

    #[test]
    fn endpoint_uses_configured_model() {
        let model = GeminiModel::from_config(&make_config(Some("k")));
        assert_eq!(
            model.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn request_body_carries_generation_config() {
        let body = request_body("Traduis", &GenerationParams::default());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Traduis");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 200);
        assert_eq!(body["generationConfig"]["topK"], 40);
    }

    #[test]
    fn params_from_config() {
        let mut config = make_config(None);
        config.max_output_tokens = 64;
        let params = GenerationParams::from(&config);
        assert_eq!(params.max_output_tokens, 64);
        assert_eq!(params.top_k, 40);
    }

    #[tokio::test]
    async fn generate_without_key_is_not_configured() {
        let model = GeminiModel::from_config(&make_config(None));
        let err = model
            .generate("bonjour", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }

    #[test]
    fn retryable_errors() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::Request("reset".into()).is_retryable());
        assert!(LlmError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(LlmError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(!LlmError::Status { status: 403, body: String::new() }.is_retryable());
        assert!(!LlmError::NotConfigured.is_retryable());
    }

    /// `GeminiModel` must be usable as `dyn GenerativeModel`.
    #[test]
    fn model_is_object_safe() {
        let _: Box<dyn GenerativeModel> = Box::new(GeminiModel::from_config(&make_config(None)));
    }
}
