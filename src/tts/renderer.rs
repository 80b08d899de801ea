//! Audio renderers.
//!
//! [`GoogleTtsRenderer`] uses the public Google Translate speech endpoint,
//! which only accepts short inputs: text is split at whitespace into chunks
//! of at most [`MAX_CHUNK_CHARS`] characters and the MP3 fragments are
//! concatenated (MP3 frames can be appended without re-encoding).

use std::time::Duration;

use async_trait::async_trait;

use super::TtsError;
use crate::config::TtsConfig;

/// Longest text the endpoint accepts per request.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Voices offered by the Google Translate endpoint.
const GOOGLE_VOICES: &[&str] = &[
    "af", "ar", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el", "en", "es", "et", "fi", "fr",
    "gu", "hi", "hr", "hu", "id", "is", "it", "iw", "ja", "jw", "km", "kn", "ko", "la", "lv", "ml",
    "mr", "ms", "my", "ne", "nl", "no", "pl", "pt", "ro", "ru", "si", "sk", "sq", "sr", "su", "sv",
    "sw", "ta", "te", "th", "tl", "tr", "uk", "ur", "vi", "zh",
];

// ---------------------------------------------------------------------------
// AudioRenderer trait
// ---------------------------------------------------------------------------

/// Turns text into encoded audio.
///
/// `render` returns MP3 bytes for the whole text; any provider length
/// limit is the implementor's problem.
#[async_trait]
pub trait AudioRenderer: Send + Sync {
    /// Whether there is a voice for `language_code` (already simplified,
    /// e.g. `"fr"` not `"fr-FR"`).
    fn supports(&self, language_code: &str) -> bool;

    async fn render(&self, text: &str, language_code: &str) -> Result<Vec<u8>, TtsError>;
}

// ---------------------------------------------------------------------------
// GoogleTtsRenderer
// ---------------------------------------------------------------------------

pub struct GoogleTtsRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTtsRenderer {
    pub fn from_config(config: &TtsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language_code: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, TtsError> {
        let url = format!("{}/translate_tts", self.base_url);
        let query = [
            ("ie", "UTF-8".to_string()),
            ("client", "tw-ob".to_string()),
            ("tl", language_code.to_string()),
            ("q", chunk.to_string()),
            ("total", total.to_string()),
            ("idx", idx.to_string()),
            ("textlen", chunk.chars().count().to_string()),
        ];

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl AudioRenderer for GoogleTtsRenderer {
    fn supports(&self, language_code: &str) -> bool {
        GOOGLE_VOICES.contains(&language_code)
    }

    async fn render(&self, text: &str, language_code: &str) -> Result<Vec<u8>, TtsError> {
        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        let total = chunks.len();
        log::debug!("tts: rendering {total} chunk(s) in {language_code}");

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(chunk, language_code, idx, total).await?);
        }
        Ok(audio)
    }
}

/// Split `text` into pieces of at most `max_chars` characters, breaking at
/// whitespace.  A single word longer than `max_chars` is cut hard.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
