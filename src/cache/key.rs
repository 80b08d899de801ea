//! Deterministic cache-key fingerprints.

/// Key for a cached translation: lower-cased source text and target code.
///
/// Only case is folded; whitespace and accents are kept as-is, so
/// `"merci "` and `"merci"` are distinct keys.
pub fn translation_key(text: &str, target_language: &str) -> String {
    format!("{}:{}", text.to_lowercase(), target_language)
}

/// Key for a cached audio clip: hex MD5 of `"<text>:<language>"`.
pub fn audio_key(text: &str, language_code: &str) -> String {
    let digest = md5::compute(format!("{text}:{language_code}").as_bytes());
    format!("{:x}", digest)
}
