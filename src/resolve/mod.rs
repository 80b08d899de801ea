//! Translation resolution.
//!
//! [`ResolutionOrchestrator`] answers "what is this French text in language
//! X?" by consulting, in order, its TTL cache, the [`TranslationStore`] and
//! the [`FallbackTranslator`], writing fallback answers back to the store.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use kumajala::config::AppConfig;
//! use kumajala::llm::{FallbackTranslator, GeminiModel};
//! use kumajala::resolve::ResolutionOrchestrator;
//! use kumajala::store::{LocalTableBackend, TranslationStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let store = TranslationStore::new(LocalTableBackend::in_memory_with_defaults());
//!     let model = Arc::new(GeminiModel::from_config(&config.llm));
//!     let fallback = FallbackTranslator::from_config(model, &config.llm);
//!     let orchestrator = ResolutionOrchestrator::new(store, fallback, Duration::from_secs(3600));
//!
//!     let result = orchestrator.resolve("Bonjour", "bété").await.unwrap();
//!     println!("{result:?}");
//! }
//! ```
//!
//! [`TranslationStore`]: crate::store::TranslationStore
//! [`FallbackTranslator`]: crate::llm::FallbackTranslator

pub mod orchestrator;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use orchestrator::{BatchItem, HealthReport, ResolutionOrchestrator, ResolveError};
pub use state::{Resolution, ResolutionStage, TranslationSource};
