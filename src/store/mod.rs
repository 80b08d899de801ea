//! Persistent translation store.
//!
//! This module provides:
//! * [`TranslationStore`]: the uniform get / save / manual-update interface
//!   used by the resolution orchestrator.
//! * [`TranslationBackend`]: async trait implemented by the two storage
//!   variants, chosen once at construction:
//!   * [`LocalTableBackend`]: in-memory table, optionally mirrored to a JSON
//!     file that is rewritten wholesale on every save.
//!   * [`DocumentBackend`]: one document per source phrase in a
//!     [`DocumentStore`] ([`FirestoreClient`] or [`InMemoryDocumentStore`]).
//! * [`StoreError`]: error variants for storage operations.
//!
//! # Quick start
//!
//! ```rust
//! use kumajala::store::{LocalTableBackend, TranslationStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = TranslationStore::new(LocalTableBackend::in_memory_with_defaults());
//! let hello = store.get_translation("Bonjour", "bété").await;
//! assert!(hello.is_some());
//! # }
//! ```

pub mod document;
pub mod firestore;
pub mod local;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::languages;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use document::{document_id, DocumentBackend, DocumentStore, InMemoryDocumentStore};
pub use firestore::FirestoreClient;
pub use local::LocalTableBackend;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the local table file failed.
    #[error("local table I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The table or a document could not be (de)serialised.
    #[error("serialisation failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// HTTP transport or connection error talking to the document store.
    #[error("document store request failed: {0}")]
    Request(String),

    /// The document store did not answer within the configured timeout.
    #[error("document store request timed out")]
    Timeout,

    /// The document store answered with a non-success status.
    #[error("document store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A document had an unexpected wire shape.
    #[error("malformed document: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// StoreMode / StoredTranslation
// ---------------------------------------------------------------------------

/// Which kind of backend a store runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    Local,
    Document,
}

impl StoreMode {
    pub fn label(&self) -> &'static str {
        match self {
            StoreMode::Local => "local",
            StoreMode::Document => "document",
        }
    }
}

/// One stored (source phrase, translation) pair for a given language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredTranslation {
    /// Lower-cased French source text.
    pub source_text: String,
    pub target_language: String,
    pub translation: String,
}

// ---------------------------------------------------------------------------
// TranslationBackend trait
// ---------------------------------------------------------------------------

/// Storage capability behind [`TranslationStore`].
///
/// `source` is always already lower-cased and `target` already validated
/// against the supported-language registry.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    fn mode(&self) -> StoreMode;

    async fn get(&self, source: &str, target: &str) -> Result<Option<String>, StoreError>;

    /// Write `translation`, overwriting any existing value for the pair and
    /// leaving other languages of the same phrase untouched.
    async fn put(&self, source: &str, target: &str, translation: &str) -> Result<(), StoreError>;

    /// All stored translations into `target`.
    async fn list(&self, target: &str) -> Result<Vec<StoredTranslation>, StoreError>;
}

// ---------------------------------------------------------------------------
// TranslationStore
// ---------------------------------------------------------------------------

/// Uniform lookup/write interface over a [`TranslationBackend`].
///
/// Invalid input (empty text, unsupported language) and backend failures
/// are logged and reported as `None` / `false`, never as errors: the caller
/// decides what a missing translation means.
pub struct TranslationStore {
    backend: Box<dyn TranslationBackend>,
}

impl TranslationStore {
    pub fn new<B: TranslationBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn from_boxed(backend: Box<dyn TranslationBackend>) -> Self {
        Self { backend }
    }

    pub fn mode(&self) -> StoreMode {
        self.backend.mode()
    }

    /// Look up the translation of `text` into `target`, matching the source
    /// text case-insensitively.
    pub async fn get_translation(&self, text: &str, target: &str) -> Option<String> {
        if text.trim().is_empty() {
            log::warn!("store: empty text passed to get_translation");
            return None;
        }
        if !languages::is_supported(target) {
            log::warn!("store: unsupported language {target:?}");
            return None;
        }

        match self.backend.get(&text.to_lowercase(), target).await {
            Ok(found) => found,
            Err(e) => {
                log::error!("store: lookup failed for {target}: {e}");
                None
            }
        }
    }

    /// Persist `translation` for (`text`, `target`).  Returns `true` on success.
    pub async fn save_translation(&self, text: &str, target: &str, translation: &str) -> bool {
        if text.trim().is_empty() || translation.trim().is_empty() {
            log::warn!("store: empty text or translation, nothing saved");
            return false;
        }
        if !languages::is_supported(target) {
            log::warn!("store: unsupported language {target:?}, nothing saved");
            return false;
        }

        let source = text.to_lowercase();
        match self.backend.put(&source, target, translation).await {
            Ok(()) => {
                log::info!(
                    "store: saved {:?} -> {target} ({})",
                    source,
                    self.mode().label()
                );
                true
            }
            Err(e) => {
                log::error!("store: save failed for {source:?} -> {target}: {e}");
                false
            }
        }
    }

    /// Operator-driven correction; always overwrites the stored value.
    pub async fn update_translation_manual(
        &self,
        text: &str,
        target: &str,
        translation: &str,
    ) -> bool {
        if text.trim().is_empty() || translation.trim().is_empty() {
            log::warn!("store: empty text or translation in manual update");
            return false;
        }
        if !languages::is_supported(target) {
            log::warn!("store: unsupported language {target:?} in manual update");
            return false;
        }

        log::info!("store: manual update {text:?} in {target} = {translation:?}");
        self.save_translation(text, target, translation).await
    }

    /// Every stored translation into `target`; empty when unsupported.
    pub async fn list_translations(&self, target: &str) -> Vec<StoredTranslation> {
        if !languages::is_supported(target) {
            log::warn!("store: unsupported language {target:?} in listing");
            return Vec::new();
        }
        match self.backend.list(target).await {
            Ok(list) => list,
            Err(e) => {
                log::error!("store: listing {target} failed: {e}");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
