//! Prompt builder for French → local-language translation.
//!
//! Each supported target language has a curated linguistic description,
//! a handful of French → target few-shot examples and a short note on its
//! orthography.  Targets without curated data get a generic description and
//! no examples.  Every prompt ends with the instruction to answer either with
//! the bare translation or with [`IMPOSSIBLE_SENTINEL`].

/// Exact answer the model is told to give when it cannot translate.
pub const IMPOSSIBLE_SENTINEL: &str = "TRADUCTION_IMPOSSIBLE";

// ---------------------------------------------------------------------------
// Language contexts
// ---------------------------------------------------------------------------

/// Curated prompt material for one target language.
#[derive(Debug)]
pub struct LanguageContext {
    pub code: &'static str,
    pub description: &'static str,
    /// `(french, target)` pairs.
    pub examples: &'static [(&'static str, &'static str)],
    pub notes: &'static str,
}

static CONTEXTS: &[LanguageContext] = &[
    LanguageContext {
        code: "bété",
        description: "langue Kru parlée principalement en Côte d'Ivoire, dans les régions de Gagnoa et Daloa",
        examples: &[
            ("Bonjour", "Akwaba"),
            ("Merci", "Akpé"),
            ("Au revoir", "Kan na"),
            ("Oui", "Yoo"),
            ("Non", "Kou"),
            ("Comment allez-vous?", "Bi ye né?"),
            ("Ça va", "Bi dè"),
            ("Eau", "Nyɛ"),
        ],
        notes: "Le Bété utilise des tons et des nasales. Respecte les accents et les caractères spéciaux.",
    },
    LanguageContext {
        code: "baoulé",
        description: "langue akan parlée en Côte d'Ivoire, principalement dans la région du centre (Yamoussoukro, Bouaké)",
        examples: &[
            ("Bonjour", "Mo ho"),
            ("Merci", "Mo"),
            ("Au revoir", "Kan na"),
            ("Oui", "Yoo"),
            ("Non", "Kou"),
            ("Comment allez-vous?", "Wo ho tè n?"),
            ("Je m'appelle", "Man yi tɔ"),
            ("Maison", "Kpè"),
        ],
        notes: "Le Baoulé est une langue tonale avec des voyelles nasales.",
    },
    LanguageContext {
        code: "mooré",
        description: "langue Gur parlée principalement au Burkina Faso par le peuple Mossi, également parlée au Ghana et au Togo",
        examples: &[
            ("Bonjour", "Ne y windga"),
            ("Merci", "Barika"),
            ("Au revoir", "Nan kã pãalem"),
            ("Oui", "Yãa"),
            ("Non", "Ayi"),
            ("Comment allez-vous?", "Fo laafi?"),
            ("Bonne nuit", "Sẽn-doogo"),
            ("Eau", "Koom"),
        ],
        notes: "Le Mooré utilise des nasales marquées par des tildes (~).",
    },
    LanguageContext {
        code: "agni",
        description: "langue akan parlée principalement en Côte d'Ivoire dans la région Est (Abengourou, Agnibilékrou)",
        examples: &[
            ("Bonjour", "Agni oh"),
            ("Merci", "Akpé"),
            ("Au revoir", "Aka na"),
            ("Oui", "Aoo"),
            ("Non", "N'an"),
            ("Comment allez-vous?", "Aka kye?"),
            ("Maison", "Aso"),
            ("Eau", "Nsu"),
        ],
        notes: "L'Agni est proche du Baoulé mais avec des variations dialectales.",
    },
];

/// Curated context for `code`, if any.
pub fn context_for(code: &str) -> Option<&'static LanguageContext> {
    CONTEXTS.iter().find(|c| c.code == code)
}

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds translation prompts for one target language.
///
/// # Example
/// ```rust
/// use kumajala::llm::PromptBuilder;
///
/// let prompt = PromptBuilder::new("baoulé").build("Bonne nuit");
/// assert!(prompt.contains("Merci → Mo"));
/// assert!(prompt.contains("TRADUCTION_IMPOSSIBLE"));
/// ```
pub struct PromptBuilder {
    target: String,
}

impl PromptBuilder {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
        }
    }

    /// Build the full prompt for `text`.
    ///
    /// Structure (in order):
    /// 1. Role and target language with its description
    /// 2. Few-shot examples
    /// 3. Orthography notes
    /// 4. The quoted source text
    /// 5. Strict answer-format instructions and a "TRADUCTION:" cue
    pub fn build(&self, text: &str) -> String {
        let target = self.target.as_str();
        let generic_description = format!("langue africaine locale: {target}");
        let (description, examples, notes) = match context_for(target) {
            Some(ctx) => (ctx.description, ctx.examples, ctx.notes),
            None => (generic_description.as_str(), &[][..], ""),
        };

        let mut prompt = String::with_capacity(2048);
        prompt.push_str("Tu es un expert linguiste spécialisé dans les langues africaines locales.\n\n");
        prompt.push_str(&format!("LANGUE CIBLE: {target}\nDescription: {description}\n\n"));

        prompt.push_str(&format!(
            "EXEMPLES DE TRADUCTIONS FRANÇAISES → {}:\n",
            target.to_uppercase()
        ));
        for (french, translated) in examples {
            prompt.push_str(&format!("  - {french} → {translated}\n"));
        }

        prompt.push_str(&format!("\nNOTES IMPORTANTES:\n- {notes}\n\n"));
        prompt.push_str(&format!("TEXTE À TRADUIRE:\n\"{text}\"\n\n"));

        prompt.push_str(&format!(
            "INSTRUCTIONS STRICTES:\n\
             1. Traduis le texte français ci-dessus en {target}\n\
             2. Fournis UNIQUEMENT la traduction, sans aucun préfixe, explication ou commentaire\n\
             3. Ne mets pas de guillemets autour de ta réponse\n\
             4. Respecte strictement la grammaire et les tons du {target}\n\
             5. Utilise les caractères spéciaux appropriés (accents, tildes, etc.)\n\
             6. Si la traduction est impossible ou que tu n'es pas sûr, réponds exactement: {IMPOSSIBLE_SENTINEL}\n\n\
             TRADUCTION:"
        ));
        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_curated_language_has_enough_examples() {
        for ctx in CONTEXTS {
            assert!(
                (3..=8).contains(&ctx.examples.len()),
                "{} has {} examples",
                ctx.code,
                ctx.examples.len()
            );
            assert!(crate::languages::is_supported(ctx.code));
        }
    }

    #[test]
    fn curated_prompt_contains_context() {
        let prompt = PromptBuilder::new("mooré").build("Bonjour");
        assert!(prompt.contains("LANGUE CIBLE: mooré"));
        assert!(prompt.contains("Burkina Faso"));
        assert!(prompt.contains("  - Merci → Barika"));
        assert!(prompt.contains("FRANÇAISES → MOORÉ"));
        assert!(prompt.contains("tildes"));
    }

    #[test]
    fn source_text_is_quoted() {
        let prompt = PromptBuilder::new("bété").build("Il pleut");
        assert!(prompt.contains("TEXTE À TRADUIRE:\n\"Il pleut\""));
        assert!(prompt.trim_end().ends_with("TRADUCTION:"));
    }

    #[test]
    fn unknown_target_gets_generic_description() {
        let prompt = PromptBuilder::new("dioula").build("Bonjour");
        assert!(prompt.contains("Description: langue africaine locale: dioula"));
        assert!(!prompt.contains("  - "));
        assert!(prompt.contains(IMPOSSIBLE_SENTINEL));
    }

    #[test]
    fn context_lookup() {
        assert!(context_for("agni").is_some());
        assert!(context_for("fr").is_none());
    }
}
