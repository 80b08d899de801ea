//! Speech service: request validation, voice selection and audio caching.
//!
//! None of the local target languages has a voice of its own.  A request in
//! one of them is rendered with the language's fallback voice (French) and
//! the output carries a warning saying so.

use std::sync::Arc;

use serde::Serialize;

use super::renderer::AudioRenderer;
use super::TtsError;
use crate::cache::{audio_key, BoundedCache, BoundedCacheStats};
use crate::config::{CacheConfig, TtsConfig};
use crate::languages;

pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Result of one synthesis request.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechOutput {
    #[serde(skip)]
    pub audio: Vec<u8>,
    pub content_type: &'static str,
    pub text: String,
    /// Language code as requested.
    pub requested_language: String,
    /// Voice actually used.
    pub actual_language: String,
    pub cached: bool,
    pub size_bytes: usize,
    /// Set when the requested language had no voice of its own.
    pub warning: Option<String>,
}

pub struct SpeechService {
    renderer: Arc<dyn AudioRenderer>,
    cache: BoundedCache<Vec<u8>>,
    max_text_chars: usize,
    enabled: bool,
}

/// `"fr-FR"` → `"fr"`.
fn simplify_code(code: &str) -> String {
    code.trim()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

impl SpeechService {
    pub fn new(
        renderer: Arc<dyn AudioRenderer>,
        max_cache_entries: usize,
        max_text_chars: usize,
    ) -> Self {
        Self {
            renderer,
            cache: BoundedCache::new(max_cache_entries.max(1)),
            max_text_chars,
            enabled: true,
        }
    }

    pub fn from_config(renderer: Arc<dyn AudioRenderer>, tts: &TtsConfig, cache: &CacheConfig) -> Self {
        let mut service = Self::new(renderer, cache.audio_max_entries, tts.max_text_chars);
        service.enabled = tts.enabled;
        service
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the renderer has a voice for `language_code`.
    pub fn is_language_supported(&self, language_code: &str) -> bool {
        self.renderer.supports(&simplify_code(language_code))
    }

    /// Render `text` in `language_code`.
    ///
    /// With `use_cache` unset the cache is neither read nor written.
    pub async fn synthesize(
        &self,
        text: &str,
        language_code: &str,
        use_cache: bool,
    ) -> Result<SpeechOutput, TtsError> {
        if !self.enabled {
            return Err(TtsError::Disabled);
        }
        if text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }
        let len = text.chars().count();
        if len > self.max_text_chars {
            return Err(TtsError::TextTooLong {
                len,
                max: self.max_text_chars,
            });
        }

        let requested = simplify_code(language_code);
        let (voice, warning) = if self.renderer.supports(&requested) {
            (requested, None)
        } else {
            match languages::find(&requested) {
                Some(lang) if self.renderer.supports(lang.tts_code) => {
                    log::warn!(
                        "tts: no voice for {}, speaking with {} voice",
                        lang.name,
                        lang.tts_code
                    );
                    let warning = format!(
                        "{} has no voice of its own; rendered with the '{}' voice, pronunciation is not authentic",
                        lang.name, lang.tts_code
                    );
                    (lang.tts_code.to_string(), Some(warning))
                }
                _ => return Err(TtsError::UnsupportedLanguage(requested)),
            }
        };

        let key = audio_key(text, &voice);
        if use_cache {
            if let Some(audio) = self.cache.get(&key) {
                log::debug!("tts: cache hit for {:?}", text.chars().take(30).collect::<String>());
                return Ok(self.output(text, language_code, voice, audio, true, warning));
            }
        }

        let audio = self.renderer.render(text, &voice).await?;
        if audio.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        log::info!("tts: rendered {} bytes in {voice}", audio.len());

        if use_cache {
            self.cache.put(key, audio.clone());
        }
        Ok(self.output(text, language_code, voice, audio, false, warning))
    }

    fn output(
        &self,
        text: &str,
        requested: &str,
        voice: String,
        audio: Vec<u8>,
        cached: bool,
        warning: Option<String>,
    ) -> SpeechOutput {
        SpeechOutput {
            size_bytes: audio.len(),
            audio,
            content_type: AUDIO_CONTENT_TYPE,
            text: text.to_string(),
            requested_language: requested.to_string(),
            actual_language: voice,
            cached,
            warning,
        }
    }

    pub fn cache_stats(&self) -> BoundedCacheStats {
        self.cache.stats()
    }

    /// Drop every cached clip.  Returns how many were removed.
    pub fn clear_cache(&self) -> usize {
        let count = self.cache.clear();
        log::info!("tts: audio cache cleared ({count} entries)");
        count
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
