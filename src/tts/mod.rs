//! Speech synthesis for translated text.
//!
//! This module provides:
//! * [`SpeechService`]: validates requests, picks the effective voice and
//!   caches rendered audio in a [`BoundedCache`](crate::cache::BoundedCache).
//! * [`AudioRenderer`]: async trait for audio back-ends.
//! * [`GoogleTtsRenderer`]: Google Translate speech endpoint renderer.
//! * [`TtsError`]: error variants for synthesis.

pub mod renderer;
pub mod service;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use renderer::{split_chunks, AudioRenderer, GoogleTtsRenderer, MAX_CHUNK_CHARS};
pub use service::{SpeechOutput, SpeechService, AUDIO_CONTENT_TYPE};

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TtsError {
    #[error("speech synthesis is disabled")]
    Disabled,

    #[error("text to synthesise is empty")]
    EmptyText,

    #[error("text is too long ({len} characters, max {max})")]
    TextTooLong { len: usize, max: usize },

    #[error("language {0:?} is not supported for speech")]
    UnsupportedLanguage(String),

    #[error("renderer produced no audio")]
    EmptyAudio,

    /// HTTP transport or connection error.
    #[error("TTS request failed: {0}")]
    Request(String),

    #[error("TTS request timed out")]
    Timeout,

    #[error("TTS endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl TtsError {
    /// Whether the caller sent a bad request, as opposed to a render failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TtsError::EmptyText | TtsError::TextTooLong { .. } | TtsError::UnsupportedLanguage(_)
        )
    }
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TtsError::Timeout
        } else {
            TtsError::Request(e.to_string())
        }
    }
}
