//! Document-store backend.
//!
//! Each French source phrase owns one document in the `translations`
//! collection.  Writes merge into the existing document so translations
//! into different languages accumulate:
//!
//! ```json
//! {
//!   "source": "fr",
//!   "text": "bonjour",
//!   "languages": { "bété": "Akwaba", "agni": "Agni oh" },
//!   "metadata": { "updatedAt": "2024-05-01T10:00:00+00:00", "version": 1 }
//! }
//! ```
//!
//! Older documents stored the translations flat at the top level
//! (`{ "bété": "Akwaba" }`); reads still understand that shape.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{StoreError, StoreMode, StoredTranslation, TranslationBackend};
use crate::languages::SOURCE_LANGUAGE;

/// A document is a JSON object.
pub type Document = Map<String, Value>;

/// Document identifiers longer than this are always hashed.
const MAX_PLAIN_ID_CHARS: usize = 100;

/// Derive the document id for a lower-cased source text.
///
/// Short texts made only of letters and digits (ignoring spaces and hyphens)
/// are used directly with spaces replaced by `_`; anything else becomes the
/// hex MD5 of its UTF-8 bytes.
pub fn document_id(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| *c != ' ' && *c != '-').collect();
    let plain = text.chars().count() <= MAX_PLAIN_ID_CHARS
        && !stripped.is_empty()
        && stripped.chars().all(char::is_alphanumeric);

    if plain {
        text.to_lowercase().replace(' ', "_")
    } else {
        format!("{:x}", md5::compute(text.as_bytes()))
    }
}

// ---------------------------------------------------------------------------
// DocumentStore trait
// ---------------------------------------------------------------------------

/// Minimal key-value document store: one document per (collection, id).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Write `doc`.  With `merge` set, nested objects are merged field by
    /// field into the existing document instead of replacing it.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        merge: bool,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// InMemoryDocumentStore
// ---------------------------------------------------------------------------

/// Process-local [`DocumentStore`] for development and tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    docs: Mutex<HashMap<(String, String), Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.get(&(collection.to_string(), id.to_string())).cloned())
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: Document,
        merge: bool,
    ) -> Result<(), StoreError> {
        let mut docs = self.docs.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (collection.to_string(), id.to_string());
        match docs.get_mut(&key) {
            Some(existing) if merge => merge_into(existing, doc),
            _ => {
                docs.insert(key, doc);
            }
        }
        Ok(())
    }
}

/// Recursively merge `src` into `dst`: objects merge key by key, any other
/// value replaces what was there.
pub(crate) fn merge_into(dst: &mut Document, src: Document) {
    for (key, value) in src {
        match (dst.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            (_, value) => {
                dst.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentBackend
// ---------------------------------------------------------------------------

/// [`TranslationBackend`] storing one document per source phrase.
pub struct DocumentBackend<D> {
    store: D,
    collection: String,
}

impl<D: DocumentStore> DocumentBackend<D> {
    pub fn new(store: D, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn store(&self) -> &D {
        &self.store
    }
}

/// Pull the translation for `target` out of a document of either shape.
fn read_translation(doc: &Document, target: &str) -> Option<String> {
    match doc.get("languages") {
        Some(Value::Object(languages)) => languages.get(target)?.as_str().map(str::to_owned),
        _ => doc.get(target)?.as_str().map(str::to_owned),
    }
}

fn translation_document(source: &str, target: &str, translation: &str) -> Document {
    let mut doc = Document::new();
    doc.insert("source".into(), json!(SOURCE_LANGUAGE));
    doc.insert("text".into(), json!(source));
    doc.insert("languages".into(), json!({ target: translation }));
    doc.insert(
        "metadata".into(),
        json!({
            "updatedAt": chrono::Utc::now().to_rfc3339(),
            "version": 1,
        }),
    );
    doc
}

#[async_trait]
impl<D: DocumentStore> TranslationBackend for DocumentBackend<D> {
    fn mode(&self) -> StoreMode {
        StoreMode::Document
    }

    async fn get(&self, source: &str, target: &str) -> Result<Option<String>, StoreError> {
        let id = document_id(source);
        let doc = self.store.get(&self.collection, &id).await?;
        Ok(doc.as_ref().and_then(|d| read_translation(d, target)))
    }

    async fn put(&self, source: &str, target: &str, translation: &str) -> Result<(), StoreError> {
        let id = document_id(source);
        let doc = translation_document(source, target, translation);
        self.store.set(&self.collection, &id, doc, true).await
    }

    async fn list(&self, target: &str) -> Result<Vec<StoredTranslation>, StoreError> {
        log::warn!("store: listing {target} is not supported by the document backend");
        Ok(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
