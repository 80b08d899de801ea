//! Generative fallback translation.
//!
//! This module provides:
//! * [`GenerativeModel`]: async trait implemented by text-generation backends.
//! * [`GeminiModel`]: Google Gemini `generateContent` REST backend.
//! * [`FallbackTranslator`]: prompt, retry, clean and validate one translation.
//! * [`PromptBuilder`]: French → local-language prompts with few-shot examples.
//! * [`RetryPolicy`]: bounded exponential backoff.
//! * [`clean_response`] / [`validate`]: post-processing and the quality gate.
//! * [`LlmError`]: error variants for model calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use kumajala::config::AppConfig;
//! use kumajala::llm::{FallbackOutcome, FallbackTranslator, GeminiModel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let model = Arc::new(GeminiModel::from_config(&config.llm));
//!     let translator = FallbackTranslator::from_config(model, &config.llm);
//!
//!     match translator.translate("Bonne nuit", "mooré").await {
//!         Ok(FallbackOutcome::Translated(text)) => println!("{text}"),
//!         Ok(other) => println!("{other:?}"),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod cleaning;
pub mod client;
pub mod prompt;
pub mod retry;
pub mod translator;
pub mod validate;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use cleaning::{clean_response, is_impossible};
pub use client::{GeminiModel, GenerationParams, GenerativeModel, LlmError};
pub use prompt::{PromptBuilder, IMPOSSIBLE_SENTINEL};
pub use retry::RetryPolicy;
pub use translator::{extract_text, FallbackOutcome, FallbackTranslator};
pub use validate::{validate, RejectReason};
