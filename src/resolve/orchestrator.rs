//! Resolution orchestrator: cache → store → generative fallback → write-back.
//!
//! [`ResolutionOrchestrator`] exclusively owns the translation cache and the
//! store; every read and write of either goes through it, which is what
//! keeps the cache consistent with the store.
//!
//! # Flow
//!
//! ```text
//! resolve(text, lang)
//!   └─▶ normalise + validate input               [InputInvalid → Err]
//!   └─▶ cache.get                                 [hit → Found(cache)]
//!   └─▶ store.get_translation                     [hit → cache.put, Found(store)]
//!   └─▶ fallback.translate
//!         ├─ Translated   → store.save, cache.invalidate, Found(fallback)
//!         ├─ Untranslatable → Untranslatable (nothing written)
//!         ├─ Rejected / Unavailable → NotFound
//!         └─ Err (retries exhausted) → Err(Fallback)
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::cache::{translation_key, TtlCache, TtlCacheStats};
use crate::languages::{self, SupportedLanguage};
use crate::llm::{FallbackOutcome, FallbackTranslator, LlmError};
use crate::store::{StoreMode, StoredTranslation, TranslationStore};
use crate::tts::SpeechService;

use super::state::{Resolution, ResolutionStage, TranslationSource};

// ---------------------------------------------------------------------------
// ResolveError
// ---------------------------------------------------------------------------

/// Failures surfaced to callers of the orchestrator.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("translation must not be empty")]
    EmptyTranslation,

    #[error("target language is missing")]
    MissingLanguage,

    #[error("unsupported language {code:?}; available: {available}")]
    UnsupportedLanguage { code: String, available: String },

    /// The generative fallback failed after every retry.
    #[error("fallback translation failed: {0}")]
    Fallback(#[from] LlmError),

    #[error("the translation could not be stored")]
    StoreWrite,
}

impl ResolveError {
    /// Whether the request itself was at fault.
    pub fn is_input_invalid(&self) -> bool {
        matches!(
            self,
            ResolveError::EmptyText
                | ResolveError::EmptyTranslation
                | ResolveError::MissingLanguage
                | ResolveError::UnsupportedLanguage { .. }
        )
    }

    /// HTTP-equivalent status: 400 for bad input, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.is_input_invalid() {
            400
        } else {
            500
        }
    }
}

// ---------------------------------------------------------------------------
// BatchItem / HealthReport
// ---------------------------------------------------------------------------

/// Result for one text of a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub text: String,
    pub result: Result<Resolution, ResolveError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub store_mode: StoreMode,
    pub fallback_available: bool,
    /// `None` when no speech service is wired in.
    pub tts_enabled: Option<bool>,
    pub translation_cache: TtlCacheStats,
    /// RFC 3339.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// ResolutionOrchestrator
// ---------------------------------------------------------------------------

pub struct ResolutionOrchestrator {
    cache: TtlCache<String>,
    store: TranslationStore,
    fallback: FallbackTranslator,
}

impl ResolutionOrchestrator {
    /// Create an orchestrator whose cache keeps entries for `cache_ttl`.
    pub fn new(store: TranslationStore, fallback: FallbackTranslator, cache_ttl: Duration) -> Self {
        log::info!(
            "resolve: store={} fallback={} cache ttl={}s",
            store.mode().label(),
            if fallback.is_available() { "on" } else { "off" },
            cache_ttl.as_secs()
        );
        Self {
            cache: TtlCache::new(cache_ttl),
            store,
            fallback,
        }
    }

    // -----------------------------------------------------------------------
    // Input validation
    // -----------------------------------------------------------------------

    /// Trim and lower-case `target`, then check it against the registry.
    fn normalise_target(target: &str) -> Result<String, ResolveError> {
        let code = target.trim().to_lowercase();
        if code.is_empty() {
            return Err(ResolveError::MissingLanguage);
        }
        if !languages::is_supported(&code) {
            return Err(ResolveError::UnsupportedLanguage {
                code,
                available: languages::codes_list(),
            });
        }
        Ok(code)
    }

    fn normalise_text(text: &str) -> Result<&str, ResolveError> {
        let text = text.trim();
        if text.is_empty() {
            Err(ResolveError::EmptyText)
        } else {
            Ok(text)
        }
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve the translation of French `text` into `target`.
    pub async fn resolve(&self, text: &str, target: &str) -> Result<Resolution, ResolveError> {
        let text = Self::normalise_text(text)?;
        let target = Self::normalise_target(target)?;
        self.resolve_normalised(text, &target).await
    }

    async fn resolve_normalised(&self, text: &str, target: &str) -> Result<Resolution, ResolveError> {
        let key = translation_key(text, target);

        stage(ResolutionStage::CheckCache, text, target);
        if let Some(translation) = self.cache.get(&key) {
            return Ok(found(translation, TranslationSource::Cache));
        }

        stage(ResolutionStage::CheckStore, text, target);
        if let Some(translation) = self.store.get_translation(text, target).await {
            stage(ResolutionStage::PopulateCache, text, target);
            let purged = self.cache.purge_expired();
            if purged > 0 {
                log::debug!("resolve: purged {purged} expired cache entries");
            }
            self.cache.put(key, translation.clone());
            return Ok(found(translation, TranslationSource::Store));
        }

        stage(ResolutionStage::CheckFallback, text, target);
        if !self.fallback.is_available() {
            return Ok(Resolution::NotFound);
        }

        stage(ResolutionStage::CallFallback, text, target);
        match self.fallback.translate(text, target).await? {
            FallbackOutcome::Translated(translation) => {
                stage(ResolutionStage::WriteBack, text, target);
                if !self.store.save_translation(text, target, &translation).await {
                    log::warn!("resolve: write-back failed, returning translation anyway");
                }
                self.cache.invalidate(&key);
                Ok(found(translation, TranslationSource::Fallback))
            }
            FallbackOutcome::Untranslatable => Ok(Resolution::Untranslatable),
            FallbackOutcome::Rejected(reason) => {
                log::info!("resolve: fallback answer rejected ({reason})");
                Ok(Resolution::NotFound)
            }
            FallbackOutcome::Unavailable => Ok(Resolution::NotFound),
        }
    }

    /// Resolve several texts into one language.
    ///
    /// The language is validated once for the whole batch; empty texts are
    /// skipped.  A failing item carries its error without aborting the rest.
    pub async fn resolve_batch<I, S>(&self, texts: I, target: &str) -> Result<Vec<BatchItem>, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = Self::normalise_target(target)?;

        let mut items = Vec::new();
        for text in texts {
            let Ok(text) = Self::normalise_text(text.as_ref()) else {
                continue;
            };
            let result = self.resolve_normalised(text, &target).await;
            if let Err(e) = &result {
                log::error!("resolve: batch item {text:?} failed: {e}");
            }
            items.push(BatchItem {
                text: text.to_string(),
                result,
            });
        }
        log::info!("resolve: batch of {} item(s) into {target}", items.len());
        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Store `translation` and drop any cached value for the pair.
    pub async fn save(&self, text: &str, target: &str, translation: &str) -> Result<(), ResolveError> {
        let (text, target, translation) = Self::normalise_write(text, target, translation)?;
        let saved = self.store.save_translation(text, &target, translation).await;
        self.cache.invalidate(&translation_key(text, &target));
        if saved {
            Ok(())
        } else {
            Err(ResolveError::StoreWrite)
        }
    }

    /// Operator correction; overwrites whatever was stored.
    pub async fn update_manual(
        &self,
        text: &str,
        target: &str,
        translation: &str,
    ) -> Result<(), ResolveError> {
        let (text, target, translation) = Self::normalise_write(text, target, translation)?;
        let saved = self
            .store
            .update_translation_manual(text, &target, translation)
            .await;
        self.cache.invalidate(&translation_key(text, &target));
        if saved {
            Ok(())
        } else {
            Err(ResolveError::StoreWrite)
        }
    }

    fn normalise_write<'a>(
        text: &'a str,
        target: &str,
        translation: &'a str,
    ) -> Result<(&'a str, String, &'a str), ResolveError> {
        let text = Self::normalise_text(text)?;
        let target = Self::normalise_target(target)?;
        let translation = translation.trim();
        if translation.is_empty() {
            return Err(ResolveError::EmptyTranslation);
        }
        Ok((text, target, translation))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every stored translation into `target`.
    pub async fn translations_for(&self, target: &str) -> Result<Vec<StoredTranslation>, ResolveError> {
        let target = Self::normalise_target(target)?;
        Ok(self.store.list_translations(&target).await)
    }

    pub fn supported_languages(&self) -> Vec<SupportedLanguage> {
        languages::sorted_by_name()
    }

    pub fn cache_stats(&self) -> TtlCacheStats {
        self.cache.stats()
    }

    /// Drop every cached translation.  Returns how many were removed.
    pub fn clear_cache(&self) -> usize {
        let count = self.cache.clear();
        log::info!("resolve: translation cache cleared ({count} entries)");
        count
    }

    pub fn fallback_available(&self) -> bool {
        self.fallback.is_available()
    }

    pub fn store_mode(&self) -> StoreMode {
        self.store.mode()
    }

    pub fn health(&self, speech: Option<&SpeechService>) -> HealthReport {
        HealthReport {
            status: "healthy",
            store_mode: self.store.mode(),
            fallback_available: self.fallback.is_available(),
            tts_enabled: speech.map(SpeechService::is_enabled),
            translation_cache: self.cache.stats(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

fn found(translation: String, source: TranslationSource) -> Resolution {
    Resolution::Found {
        translation,
        source,
    }
}

fn stage(stage: ResolutionStage, text: &str, target: &str) {
    log::debug!("resolve: [{}] {text:?} -> {target}", stage.label());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use crate::llm::{GenerationParams, GenerativeModel, RetryPolicy};
    use crate::store::local::Table;
    use crate::store::{LocalTableBackend, StoreError, TranslationBackend};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Answers every prompt with the same raw text, or fails every call.
    struct CannedModel {
        available: bool,
        answer: Option<String>,
        calls: AtomicU32,
    }

    impl CannedModel {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                available: true,
                answer: Some(text.to_string()),
                calls: AtomicU32::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                available: true,
                answer: None,
                calls: AtomicU32::new(0),
            })
        }

        fn unavailable() -> Arc<Self> {
            Arc::new(Self {
                available: false,
                answer: None,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeModel for CannedModel {
        fn is_available(&self) -> bool {
            self.available
        }

        async fn generate(&self, _: &str, _: &GenerationParams) -> Result<Value, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Some(text) => Ok(json!({
                    "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
                })),
                None => Err(LlmError::Request("connection refused".into())),
            }
        }
    }

    /// Local table whose writes always fail.
    struct ReadOnlyBackend(LocalTableBackend);

    #[async_trait]
    impl TranslationBackend for ReadOnlyBackend {
        fn mode(&self) -> StoreMode {
            StoreMode::Local
        }

        async fn get(&self, source: &str, target: &str) -> Result<Option<String>, StoreError> {
            self.0.get(source, target).await
        }

        async fn put(&self, _: &str, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }

        async fn list(&self, target: &str) -> Result<Vec<StoredTranslation>, StoreError> {
            self.0.list(target).await
        }
    }

    fn table(rows: &[(&str, &str, &str)]) -> Table {
        let mut table = Table::new();
        for (text, lang, tr) in rows {
            table
                .entry(text.to_string())
                .or_default()
                .insert(lang.to_string(), tr.to_string());
        }
        table
    }

    fn orchestrator_with(backend: impl TranslationBackend + 'static, model: Arc<CannedModel>) -> ResolutionOrchestrator {
        let fallback = FallbackTranslator::new(
            model,
            GenerationParams::default(),
            RetryPolicy::immediate(3),
            Duration::from_secs(5),
        );
        ResolutionOrchestrator::new(TranslationStore::new(backend), fallback, Duration::from_secs(3600))
    }

    fn orchestrator(rows: &[(&str, &str, &str)], model: Arc<CannedModel>) -> ResolutionOrchestrator {
        orchestrator_with(LocalTableBackend::in_memory(table(rows)), model)
    }

    fn found_store(tr: &str) -> Resolution {
        Resolution::Found {
            translation: tr.into(),
            source: TranslationSource::Store,
        }
    }

    // -----------------------------------------------------------------------
    // Lookup path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_store_without_fallback_is_not_found() {
        let orch = orchestrator(&[], CannedModel::unavailable());
        let result = orch.resolve("merci", "agni").await.unwrap();
        assert_eq!(result, Resolution::NotFound);
        assert_eq!(result.status_code(), 404);
    }

    #[tokio::test]
    async fn store_match_is_case_insensitive() {
        let model = CannedModel::answering("unused");
        let orch = orchestrator(&[("bonjour", "bété", "Akwaba")], model.clone());
        assert_eq!(orch.resolve("Bonjour", "bété").await.unwrap(), found_store("Akwaba"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn store_hits_never_call_fallback() {
        let model = CannedModel::answering("unused");
        let orch = orchestrator(
            &[("merci", "bété", "Akpé"), ("merci", "mooré", "Barika"), ("oui", "agni", "Aoo")],
            model.clone(),
        );
        for (text, lang, expected) in [("merci", "bété", "Akpé"), ("MERCI", "mooré", "Barika"), ("oui", "agni", "Aoo")] {
            let result = orch.resolve(text, lang).await.unwrap();
            assert_eq!(result.translation(), Some(expected));
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn second_lookup_comes_from_cache() {
        let orch = orchestrator(&[("oui", "baoulé", "Yoo")], CannedModel::unavailable());
        assert_eq!(orch.resolve("oui", "baoulé").await.unwrap().source(), Some(TranslationSource::Store));
        assert_eq!(orch.resolve("Oui", "baoulé").await.unwrap().source(), Some(TranslationSource::Cache));
        assert_eq!(orch.cache_stats().valid_entries, 1);
    }

    #[tokio::test]
    async fn input_is_normalised_before_validation() {
        let orch = orchestrator(&[("merci", "mooré", "Barika")], CannedModel::unavailable());
        let result = orch.resolve("  merci ", " MOORÉ ").await.unwrap();
        assert_eq!(result.translation(), Some("Barika"));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let orch = orchestrator(&[], CannedModel::answering("x"));
        let err = orch.resolve("   ", "bété").await.unwrap_err();
        assert!(matches!(err, ResolveError::EmptyText));
        assert_eq!(err.status_code(), 400);

        assert!(matches!(orch.resolve("merci", "").await, Err(ResolveError::MissingLanguage)));

        let err = orch.resolve("merci", "klingon").await.unwrap_err();
        match &err {
            ResolveError::UnsupportedLanguage { code, available } => {
                assert_eq!(code, "klingon");
                assert!(available.contains("bété"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.is_input_invalid());
    }

    // -----------------------------------------------------------------------
    // Fallback path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fallback_answer_is_cleaned_and_written_back() {
        let model = CannedModel::answering("Traduction: Akpé.");
        let orch = orchestrator(&[], model.clone());

        let result = orch.resolve("merci", "bété").await.unwrap();
        assert_eq!(
            result,
            Resolution::Found {
                translation: "Akpé".into(),
                source: TranslationSource::Fallback,
            }
        );

        // Now served from the store, with no second model call.
        assert_eq!(orch.resolve("merci", "bété").await.unwrap(), found_store("Akpé"));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let model = CannedModel::answering("Akwaba");
        let orch = orchestrator(&[], model.clone());
        let first = orch.resolve("bonjour", "bété").await.unwrap();
        let second = orch.resolve("bonjour", "bété").await.unwrap();
        assert_eq!(first.translation(), second.translation());
        assert!(model.calls() <= 1);
    }

    #[tokio::test]
    async fn sentinel_is_untranslatable_and_not_stored() {
        let orch = orchestrator(&[], CannedModel::answering("TRADUCTION_IMPOSSIBLE"));
        let result = orch.resolve("photosynthèse", "agni").await.unwrap();
        assert_eq!(result, Resolution::Untranslatable);
        assert_eq!(result.status_code(), 422);
        assert!(orch.translations_for("agni").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_answer_is_not_found() {
        let orch = orchestrator(&[], CannedModel::answering("Non"));
        assert_eq!(orch.resolve("non", "mooré").await.unwrap(), Resolution::NotFound);
        assert!(orch.translations_for("mooré").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhausted_retries_are_an_error() {
        let model = CannedModel::failing();
        let orch = orchestrator(&[], model.clone());
        let err = orch.resolve("merci", "agni").await.unwrap_err();
        assert!(matches!(err, ResolveError::Fallback(LlmError::Request(_))));
        assert_eq!(err.status_code(), 500);
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn failed_write_back_still_returns_translation() {
        let backend = ReadOnlyBackend(LocalTableBackend::in_memory(Table::new()));
        let orch = orchestrator_with(backend, CannedModel::answering("Barika"));
        let result = orch.resolve("merci", "mooré").await.unwrap();
        assert_eq!(result.translation(), Some("Barika"));
    }

    // -----------------------------------------------------------------------
    // Writes and cache consistency
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn save_invalidates_cached_value() {
        let orch = orchestrator(&[("merci", "agni", "Akpé")], CannedModel::unavailable());
        orch.resolve("merci", "agni").await.unwrap();
        assert_eq!(orch.cache_stats().total_entries, 1);

        orch.save("Merci", "agni", "Mo").await.unwrap();

        assert_eq!(orch.resolve("merci", "agni").await.unwrap(), found_store("Mo"));
    }

    #[tokio::test]
    async fn manual_update_overwrites_and_invalidates() {
        let orch = orchestrator(&[("oui", "mooré", "Yãa")], CannedModel::unavailable());
        orch.resolve("oui", "mooré").await.unwrap();
        orch.update_manual("oui", "mooré", "Ẽẽ").await.unwrap();
        assert_eq!(orch.resolve("oui", "mooré").await.unwrap(), found_store("Ẽẽ"));
    }

    #[tokio::test]
    async fn write_validation_and_failures() {
        let orch = orchestrator(&[], CannedModel::unavailable());
        assert!(matches!(orch.save("merci", "agni", "  ").await, Err(ResolveError::EmptyTranslation)));
        assert!(matches!(orch.save("merci", "xx", "Mo").await, Err(ResolveError::UnsupportedLanguage { .. })));

        let backend = ReadOnlyBackend(LocalTableBackend::in_memory(Table::new()));
        let orch = orchestrator_with(backend, CannedModel::unavailable());
        let err = orch.update_manual("merci", "agni", "Mo").await.unwrap_err();
        assert!(matches!(err, ResolveError::StoreWrite));
        assert_eq!(err.status_code(), 500);
    }

    // -----------------------------------------------------------------------
    // Batch, queries, health
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn batch_skips_blanks_and_reports_per_item() {
        let orch = orchestrator(&[("oui", "bété", "Yoo")], CannedModel::unavailable());
        let items = orch
            .resolve_batch(["oui", "  ", "chat", ""], "Bété")
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "oui");
        assert_eq!(items[0].result.as_ref().unwrap().translation(), Some("Yoo"));
        assert_eq!(items[1].result.as_ref().unwrap(), &Resolution::NotFound);
    }

    #[tokio::test]
    async fn batch_item_errors_do_not_abort() {
        let orch = orchestrator(&[("oui", "agni", "Aoo")], CannedModel::failing());
        let items = orch.resolve_batch(vec!["chat".to_string(), "oui".to_string()], "agni").await.unwrap();
        assert!(matches!(items[0].result, Err(ResolveError::Fallback(_))));
        assert_eq!(items[1].result.as_ref().unwrap().translation(), Some("Aoo"));
    }

    #[tokio::test]
    async fn batch_rejects_bad_language_up_front() {
        let orch = orchestrator(&[], CannedModel::unavailable());
        assert!(orch.resolve_batch(["oui"], "zz").await.is_err());
    }

    #[tokio::test]
    async fn clear_cache_and_stats() {
        let orch = orchestrator(&[("oui", "bété", "Yoo"), ("non", "bété", "Kou")], CannedModel::unavailable());
        orch.resolve("oui", "bété").await.unwrap();
        orch.resolve("non", "bété").await.unwrap();
        assert_eq!(orch.cache_stats().valid_entries, 2);
        assert_eq!(orch.clear_cache(), 2);
        assert_eq!(orch.cache_stats().total_entries, 0);
    }

    #[tokio::test]
    async fn expired_entries_are_purged_on_populate() {
        let store = TranslationStore::new(LocalTableBackend::in_memory(table(&[
            ("oui", "bété", "Yoo"),
            ("non", "bété", "Kou"),
        ])));
        let fallback = FallbackTranslator::new(
            CannedModel::unavailable(),
            GenerationParams::default(),
            RetryPolicy::immediate(1),
            Duration::from_secs(5),
        );
        let orch = ResolutionOrchestrator::new(store, fallback, Duration::ZERO);

        orch.resolve("oui", "bété").await.unwrap();
        orch.resolve("non", "bété").await.unwrap();

        let stats = orch.cache_stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.valid_entries, 0);
    }

    #[tokio::test]
    async fn health_reports_components() {
        let orch = orchestrator(&[], CannedModel::unavailable());
        let report = orch.health(None);
        assert_eq!(report.status, "healthy");
        assert_eq!(report.store_mode, StoreMode::Local);
        assert!(!report.fallback_available);
        assert_eq!(report.tts_enabled, None);
        assert_eq!(orch.supported_languages().len(), languages::LANGUAGES.len());
    }
}
