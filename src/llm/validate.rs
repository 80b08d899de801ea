//! Quality gate for cleaned model answers.
//!
//! A translation is accepted only when every check passes; the first
//! failing check is reported as a [`RejectReason`].

use serde::Serialize;

/// Common French function words; a "translation" made mostly of these is
/// French left untranslated.
const FRENCH_STOP_WORDS: &[&str] = &[
    "le", "la", "les", "un", "une", "des", "et", "ou", "de", "du", "au", "aux", "est", "sont",
    "avec", "pour", "dans", "sur",
];

/// Phrases that show up when the model answers with an apology or error.
const ERROR_MARKERS: &[&str] = &[
    "erreur",
    "error",
    "impossible",
    "cannot",
    "unable",
    "je ne peux pas",
    "i cannot",
    "désolé",
    "sorry",
    "traduction non disponible",
    "translation unavailable",
];

/// Punctuation that does not count as "special".
const ORDINARY_PUNCTUATION: &[char] = &[' ', '.', ',', '!', '?', '-', '\''];

const MIN_LENGTH_RATIO: f64 = 0.2;
const MAX_LENGTH_RATIO: f64 = 5.0;
const MAX_FRENCH_RATIO: f64 = 0.3;
const MAX_SPECIAL_RATIO: f64 = 0.3;
/// The stop-word check only applies to answers longer than this.
const FRENCH_CHECK_MIN_WORDS: usize = 3;

// ---------------------------------------------------------------------------
// RejectReason
// ---------------------------------------------------------------------------

/// Why a fallback answer was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The source text was empty; the model was not called.
    EmptyInput,
    /// The response carried no candidate text.
    NoContent,
    /// Nothing was left after cleaning.
    Empty,
    SameAsSource,
    LengthRatio,
    TooMuchFrench,
    ErrorMarker,
    TooManySpecialChars,
}

impl RejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::EmptyInput => "empty input",
            RejectReason::NoContent => "no content in response",
            RejectReason::Empty => "empty translation",
            RejectReason::SameAsSource => "identical to source",
            RejectReason::LengthRatio => "suspicious length ratio",
            RejectReason::TooMuchFrench => "too many French words",
            RejectReason::ErrorMarker => "error marker in answer",
            RejectReason::TooManySpecialChars => "too many special characters",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check a cleaned `translation` of `source`.
pub fn validate(source: &str, translation: &str) -> Result<(), RejectReason> {
    let source = source.trim();
    let trimmed = translation.trim();

    if trimmed.is_empty() {
        return Err(RejectReason::Empty);
    }
    if source.is_empty() {
        return Err(RejectReason::EmptyInput);
    }

    if trimmed.to_lowercase() == source.to_lowercase() {
        return Err(RejectReason::SameAsSource);
    }

    let ratio = trimmed.chars().count() as f64 / source.chars().count() as f64;
    if !(MIN_LENGTH_RATIO..=MAX_LENGTH_RATIO).contains(&ratio) {
        log::debug!("validate: length ratio {ratio:.2}");
        return Err(RejectReason::LengthRatio);
    }

    let lower = translation.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.len() > FRENCH_CHECK_MIN_WORDS {
        let french = words.iter().filter(|w| FRENCH_STOP_WORDS.contains(*w)).count();
        let french_ratio = french as f64 / words.len() as f64;
        if french_ratio > MAX_FRENCH_RATIO {
            log::debug!("validate: {:.0}% French stop-words", french_ratio * 100.0);
            return Err(RejectReason::TooMuchFrench);
        }
    }

    if ERROR_MARKERS.iter().any(|m| lower.contains(m)) {
        return Err(RejectReason::ErrorMarker);
    }

    let total = translation.chars().count();
    let special = translation
        .chars()
        .filter(|c| !c.is_alphanumeric() && !ORDINARY_PUNCTUATION.contains(c))
        .count();
    if special as f64 / total as f64 > MAX_SPECIAL_RATIO {
        return Err(RejectReason::TooManySpecialChars);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
