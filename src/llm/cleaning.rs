//! Post-processing of raw model answers.
//!
//! Models often wrap the translation in quotes, prefix it with a label
//! ("Traduction : …", "Baoulé: …") or append an explanation in brackets.
//! [`clean_response`] strips all of that with an ordered list of rules.

use std::sync::OnceLock;

use regex::Regex;

/// Label and preamble patterns removed from the start of an answer, applied
/// in order with a trim after each.
const PREFIX_PATTERNS: &[&str] = &[
    r"^traduction\s*:?\s*",
    r"^translation\s*:?\s*",
    r"^réponse\s*:?\s*",
    r"^response\s*:?\s*",
    r"^en\s+\w+\s*:?\s*",
    r"^le texte traduit est\s*:?\s*",
    r"^voici la traduction\s+(?:en\s+\w+)?\s*:?\s*",
    r"^la traduction est\s*:?\s*",
    r"^traduction en\s+\w+\s*:?\s*",
    r"^la traduction de\s+.*?en\s+\w+\s+est\s*:?\s*",
    r"^\w+\s*:\s*",
];

/// Anything from the first bracketed or parenthesised aside onwards.
const EXPLANATION_PATTERN: &str = r"\s*[\(\[].*?[\)\]]";

/// Phrases meaning the model declined to translate.
const IMPOSSIBILITY_MARKERS: &[&str] = &[
    "traduction_impossible",
    "cannot translate",
    "unable to translate",
    "impossible de traduire",
];

struct Rules {
    prefixes: Vec<Regex>,
    explanation: Option<Regex>,
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("(?i){pattern}")) {
        Ok(re) => Some(re),
        Err(e) => {
            log::error!("cleaning: invalid pattern {pattern:?}: {e}");
            None
        }
    }
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        prefixes: PREFIX_PATTERNS.iter().filter_map(|p| compile(p)).collect(),
        explanation: compile(EXPLANATION_PATTERN),
    })
}

/// Strip one pair of matching surrounding quotes.
fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return text[1..text.len() - 1].trim();
        }
    }
    text
}

/// Reduce a raw model answer to the bare translation.
///
/// Steps, in order: trim; strip one pair of surrounding quotes; remove label
/// prefixes; cut any bracketed explanation; drop a single trailing `.`
/// (an ellipsis is kept).
pub fn clean_response(raw: &str) -> String {
    let rules = rules();
    let mut text = strip_quotes(raw.trim()).to_string();

    for prefix in &rules.prefixes {
        text = prefix.replace(&text, "").trim().to_string();
    }

    if let Some(m) = rules.explanation.as_ref().and_then(|re| re.find(&text)) {
        text = text[..m.start()].trim().to_string();
    }

    if text.ends_with('.') && !text.ends_with("...") {
        text.pop();
        text = text.trim().to_string();
    }
    text
}

/// Whether a cleaned answer says the text cannot be translated.
pub fn is_impossible(cleaned: &str) -> bool {
    let lower = cleaned.to_lowercase();
    IMPOSSIBILITY_MARKERS.iter().any(|m| lower.contains(m))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
