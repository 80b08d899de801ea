//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Secrets are normally not written to `settings.toml`; they arrive through
//! environment variables applied by [`AppConfig::apply_env`].

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

/// Settings for the generative fallback translator (Gemini REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key: `None` (or empty) disables the fallback translator.
    pub api_key: Option<String>,
    /// Base URL of the generative-language API.
    pub base_url: String,
    /// Model identifier, e.g. `"gemini-2.0-flash-exp"`.
    pub model: String,
    pub max_output_tokens: u32,
    /// Sampling temperature.  Kept low so translations are deterministic.
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Per-attempt timeout, independent of the retry backoff.
    pub timeout_secs: u64,
    /// Total attempts per translation, including the first.
    pub max_attempts: u32,
    /// First backoff delay; doubles on each retry.
    pub backoff_initial_secs: u64,
    /// Upper bound for a single backoff delay.
    pub backoff_max_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.0-flash-exp".into(),
            max_output_tokens: 200,
            temperature: 0.2,
            top_p: 0.8,
            top_k: 40,
            timeout_secs: 30,
            max_attempts: 3,
            backoff_initial_secs: 2,
            backoff_max_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Which backend holds the authoritative translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file rewritten on every save.
    Local,
    /// Cloud Firestore document store.
    Firestore,
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::Local
    }
}

/// Settings for the translation store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Path of the local JSON table.  `None` → `AppPaths::translations_file`.
    pub local_path: Option<PathBuf>,
    /// Document collection holding translations.
    pub collection: String,
    pub firestore_base_url: String,
    pub firestore_project_id: Option<String>,
    pub firestore_database: String,
    /// OAuth bearer token for the Firestore REST API.
    pub firestore_access_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            local_path: None,
            collection: "translations".into(),
            firestore_base_url: "https://firestore.googleapis.com/v1".into(),
            firestore_project_id: None,
            firestore_database: "(default)".into(),
            firestore_access_token: None,
            timeout_secs: 10,
        }
    }
}

impl StoreConfig {
    /// The local table path, resolving the platform default when unset.
    pub fn resolved_local_path(&self) -> PathBuf {
        self.local_path
            .clone()
            .unwrap_or_else(|| AppPaths::new().translations_file)
    }

    /// Returns `true` when both a project id and an access token are set.
    pub fn has_firestore_credentials(&self) -> bool {
        let non_empty = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        non_empty(&self.firestore_project_id) && non_empty(&self.firestore_access_token)
    }
}

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

/// Sizing for the in-memory caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cached translation.
    pub translation_ttl_secs: u64,
    /// Entry ceiling of the audio cache.
    pub audio_max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            translation_ttl_secs: 3600,
            audio_max_entries: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// TtsConfig
// ---------------------------------------------------------------------------

/// Settings for speech synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub enabled: bool,
    /// Base URL of the translate-tts endpoint.
    pub base_url: String,
    /// Longest text accepted for synthesis, in characters.
    pub max_text_chars: usize,
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://translate.google.com".into(),
            max_text_chars: 5000,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use kumajala::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let mut config = AppConfig::load().unwrap();
/// config.apply_env();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Generative fallback settings.
    pub llm: LlmConfig,
    /// Translation store settings.
    pub store: StoreConfig,
    /// Cache sizing.
    pub cache: CacheConfig,
    /// Speech synthesis settings.
    pub tts: TtsConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply credential and path overrides from the process environment.
    ///
    /// | Variable                 | Field                           |
    /// |--------------------------|---------------------------------|
    /// | `GEMINI_API_KEY`         | `llm.api_key`                   |
    /// | `KUMAJALA_STORE_PATH`    | `store.local_path`              |
    /// | `FIRESTORE_PROJECT_ID`   | `store.firestore_project_id`    |
    /// | `FIRESTORE_ACCESS_TOKEN` | `store.firestore_access_token`  |
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) with an explicit lookup.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(path) = get("KUMAJALA_STORE_PATH") {
            self.store.local_path = Some(PathBuf::from(path));
        }
        if let Some(project) = get("FIRESTORE_PROJECT_ID") {
            self.store.firestore_project_id = Some(project);
        }
        if let Some(token) = get("FIRESTORE_ACCESS_TOKEN") {
            self.store.firestore_access_token = Some(token);
        }
    }

    /// Human-readable configuration warnings, logged at startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.llm.api_key.as_deref().map_or(true, str::is_empty) {
            warnings.push("GEMINI_API_KEY not set - generative fallback disabled".to_string());
        }
        if self.store.backend == StoreBackend::Firestore && !self.store.has_firestore_credentials()
        {
            warnings.push(
                "Firestore selected without project id / access token - using local data"
                    .to_string(),
            );
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
