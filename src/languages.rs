//! Registry of supported target languages.
//!
//! [`SupportedLanguage`] records are static and immutable: every target
//! language passed to the store, the fallback translator or the speech
//! service is validated against [`LANGUAGES`] before any lookup happens.

use serde::Serialize;

// ---------------------------------------------------------------------------
// SupportedLanguage
// ---------------------------------------------------------------------------

/// A language the service can translate into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SupportedLanguage {
    /// Lower-case identifier used in requests and storage keys (e.g. `"bété"`).
    pub code: &'static str,
    /// Human-readable display name.
    pub name: &'static str,
    /// Main region where the language is spoken.
    pub region: &'static str,
    /// Language identifier handed to the audio renderer.
    ///
    /// None of the local languages has a renderer voice, so they are spoken
    /// with the French voice.
    pub tts_code: &'static str,
}

/// Source language of every stored phrase.
pub const SOURCE_LANGUAGE: &str = "fr";

// ---------------------------------------------------------------------------
// Static table
// ---------------------------------------------------------------------------

pub static LANGUAGES: &[SupportedLanguage] = &[
    SupportedLanguage {
        code: "bété",
        name: "Bété",
        region: "Côte d'Ivoire",
        tts_code: "fr",
    },
    SupportedLanguage {
        code: "baoulé",
        name: "Baoulé",
        region: "Côte d'Ivoire",
        tts_code: "fr",
    },
    SupportedLanguage {
        code: "mooré",
        name: "Mooré",
        region: "Burkina Faso",
        tts_code: "fr",
    },
    SupportedLanguage {
        code: "agni",
        name: "Agni",
        region: "Côte d'Ivoire",
        tts_code: "fr",
    },
    SupportedLanguage {
        code: "fr",
        name: "Français",
        region: "Global",
        tts_code: "fr",
    },
];

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Find a language by its exact code.
pub fn find(code: &str) -> Option<&'static SupportedLanguage> {
    LANGUAGES.iter().find(|lang| lang.code == code)
}

/// Returns `true` when `code` names a supported language.
pub fn is_supported(code: &str) -> bool {
    find(code).is_some()
}

/// All supported languages, sorted by display name.
pub fn sorted_by_name() -> Vec<SupportedLanguage> {
    let mut langs = LANGUAGES.to_vec();
    langs.sort_by(|a, b| a.name.cmp(b.name));
    langs
}

/// Comma-separated list of codes, for user-facing error messages.
pub fn codes_list() -> String {
    sorted_by_name()
        .iter()
        .map(|lang| lang.code)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_local_languages() {
        assert_eq!(find("bété").map(|l| l.name), Some("Bété"));
        assert_eq!(find("mooré").map(|l| l.region), Some("Burkina Faso"));
        assert!(is_supported("agni"));
        assert!(is_supported("fr"));
    }

    #[test]
    fn rejects_unknown_and_non_normalized_codes() {
        assert!(!is_supported("klingon"));
        assert!(!is_supported("Bété"));
        assert!(!is_supported(""));
    }

    #[test]
    fn sorted_by_display_name() {
        let names: Vec<_> = sorted_by_name().iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Agni", "Baoulé", "Bété", "Français", "Mooré"]);
    }

    #[test]
    fn local_languages_speak_with_french_voice() {
        for lang in LANGUAGES {
            assert_eq!(lang.tts_code, "fr", "{} tts code", lang.code);
        }
    }
}
