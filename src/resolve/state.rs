//! Resolution outcomes and the per-request state machine.
//!
//! [`ResolutionStage`] names the steps a request walks through; the
//! orchestrator logs every transition.  [`Resolution`] is the terminal
//! result handed back to callers.

use serde::Serialize;

// ---------------------------------------------------------------------------
// ResolutionStage
// ---------------------------------------------------------------------------

/// Steps of one resolution.  Each transition is logged; the request
/// returns from the stage that settles it.
///
/// ```text
/// CheckCache ──hit──▶ return Found(cache)
///            ──miss─▶ CheckStore ──hit──▶ PopulateCache ──▶ return Found(store)
///                                ──miss─▶ CheckFallback ──unavailable──▶ return NotFound
///                                                       ──available────▶ CallFallback
///                                                                         ──translated──▶ WriteBack ──▶ return Found(fallback)
///                                                                         ──sentinel────▶ return Untranslatable
///                                                                         ──rejected────▶ return NotFound
///                                                                         ──error───────▶ return Err
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStage {
    CheckCache,
    CheckStore,
    PopulateCache,
    CheckFallback,
    CallFallback,
    WriteBack,
}

impl ResolutionStage {
    /// Short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionStage::CheckCache => "check-cache",
            ResolutionStage::CheckStore => "check-store",
            ResolutionStage::PopulateCache => "populate-cache",
            ResolutionStage::CheckFallback => "check-fallback",
            ResolutionStage::CallFallback => "call-fallback",
            ResolutionStage::WriteBack => "write-back",
        }
    }
}

// ---------------------------------------------------------------------------
// TranslationSource
// ---------------------------------------------------------------------------

/// Where a returned translation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationSource {
    Cache,
    Store,
    Fallback,
}

impl TranslationSource {
    pub fn label(&self) -> &'static str {
        match self {
            TranslationSource::Cache => "cache",
            TranslationSource::Store => "store",
            TranslationSource::Fallback => "fallback",
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Terminal result of resolving one (text, language) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Found {
        translation: String,
        source: TranslationSource,
    },
    /// No translation is known and none could be produced.
    NotFound,
    /// The fallback model reported the text cannot be expressed in the
    /// target language.
    Untranslatable,
}

impl Resolution {
    /// HTTP-equivalent status: 200, 404 or 422.
    pub fn status_code(&self) -> u16 {
        match self {
            Resolution::Found { .. } => 200,
            Resolution::NotFound => 404,
            Resolution::Untranslatable => 422,
        }
    }

    pub fn translation(&self) -> Option<&str> {
        match self {
            Resolution::Found { translation, .. } => Some(translation),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<TranslationSource> {
        match self {
            Resolution::Found { source, .. } => Some(*source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
