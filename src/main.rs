//! Command-line entry point: kumajala.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG` overrides the `info` default).
//! 2. Load [`AppConfig`] from disk, or from `--config`, then apply
//!    environment overrides.
//! 3. Open the translation store (Firestore when configured, local JSON
//!    table otherwise).
//! 4. Build the generative fallback, the resolution orchestrator and the
//!    speech service.
//! 5. Run the requested subcommand and print its result as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use kumajala::{
    config::{AppConfig, StoreBackend},
    llm::{FallbackTranslator, GeminiModel},
    resolve::{ResolutionOrchestrator, ResolveError},
    store::{DocumentBackend, FirestoreClient, LocalTableBackend, TranslationBackend, TranslationStore},
    tts::{GoogleTtsRenderer, SpeechService},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "kumajala")]
#[command(author, version, about = "Translate French into Ivorian and Burkinabè languages", long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate one French text
    Translate {
        text: String,

        /// Target language code, e.g. "bété"
        #[arg(short, long)]
        lang: String,
    },

    /// Translate several texts into one language
    Batch {
        /// Texts to translate
        texts: Vec<String>,

        /// Read additional texts from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[arg(short, long)]
        lang: String,
    },

    /// Store a translation
    Manage {
        text: String,

        #[arg(short, long)]
        lang: String,

        /// Translation to store
        #[arg(short, long)]
        translation: String,

        /// Record as an operator correction
        #[arg(long)]
        manual: bool,
    },

    /// List supported languages
    Languages,

    /// List stored translations for a language
    Translations {
        #[arg(short, long)]
        lang: String,
    },

    /// Render text to an MP3 file
    Speak {
        text: String,

        #[arg(short, long)]
        lang: String,

        /// Output file
        #[arg(short, long, default_value = "speech.mp3")]
        output: PathBuf,

        /// Bypass the audio cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show cache statistics
    CacheStats {
        /// Clear both caches afterwards
        #[arg(long)]
        clear: bool,
    },

    /// Report component status
    Health,
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

fn load_config(path: Option<&PathBuf>) -> AppConfig {
    let loaded = match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    config.apply_env();
    for warning in config.warnings() {
        log::warn!("{warning}");
    }
    config
}

fn open_store(config: &AppConfig) -> TranslationStore {
    let firestore = if config.store.backend == StoreBackend::Firestore
        && config.store.has_firestore_credentials()
    {
        FirestoreClient::from_config(&config.store)
    } else {
        None
    };

    let backend: Box<dyn TranslationBackend> = match firestore {
        Some(client) => {
            log::info!("store: Firestore collection {:?}", config.store.collection);
            Box::new(DocumentBackend::new(client, config.store.collection.clone()))
        }
        None => {
            let path = config.store.resolved_local_path();
            log::info!("store: local table {}", path.display());
            Box::new(LocalTableBackend::open(path))
        }
    };
    TranslationStore::from_boxed(backend)
}

struct Services {
    orchestrator: ResolutionOrchestrator,
    speech: SpeechService,
}

fn build_services(config: &AppConfig) -> Services {
    let model = Arc::new(GeminiModel::from_config(&config.llm));
    let fallback = FallbackTranslator::from_config(model, &config.llm);
    let orchestrator = ResolutionOrchestrator::new(
        open_store(config),
        fallback,
        Duration::from_secs(config.cache.translation_ttl_secs),
    );

    let renderer = Arc::new(GoogleTtsRenderer::from_config(&config.tts));
    let speech = SpeechService::from_config(renderer, &config.tts, &config.cache);

    Services {
        orchestrator,
        speech,
    }
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(status: u16) -> ExitCode {
    if status == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn error_json(e: &ResolveError) -> serde_json::Value {
    json!({ "error": e.to_string(), "status_code": e.status_code() })
}

/// Print a write result; `Ok` when stored.
fn report_write(result: Result<(), ResolveError>, text: &str, lang: &str) -> Result<ExitCode> {
    match result {
        Ok(()) => {
            print_json(&json!({ "saved": true, "text": text, "language": lang }))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            print_json(&error_json(&e))?;
            Ok(exit_code(e.status_code()))
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    let Services {
        orchestrator,
        speech,
    } = build_services(&config);

    match cli.command {
        Commands::Translate { text, lang } => match orchestrator.resolve(&text, &lang).await {
            Ok(resolution) => {
                let mut value = serde_json::to_value(&resolution)?;
                value["text"] = json!(text.trim());
                value["language"] = json!(lang.trim().to_lowercase());
                value["status_code"] = json!(resolution.status_code());
                print_json(&value)?;
                Ok(exit_code(resolution.status_code()))
            }
            Err(e) => {
                print_json(&error_json(&e))?;
                Ok(exit_code(e.status_code()))
            }
        },

        Commands::Batch { mut texts, file, lang } => {
            if let Some(path) = file {
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                texts.extend(content.lines().map(str::to_string));
            }
            let items = match orchestrator.resolve_batch(&texts, &lang).await {
                Ok(items) => items,
                Err(e) => {
                    print_json(&error_json(&e))?;
                    return Ok(exit_code(e.status_code()));
                }
            };

            let results: Vec<serde_json::Value> = items
                .iter()
                .map(|item| match &item.result {
                    Ok(resolution) => {
                        json!({ "text": item.text, "result": resolution, "status_code": resolution.status_code() })
                    }
                    Err(e) => json!({ "text": item.text, "error": e.to_string(), "status_code": e.status_code() }),
                })
                .collect();
            let found = items
                .iter()
                .filter(|item| matches!(&item.result, Ok(r) if r.translation().is_some()))
                .count();
            print_json(&json!({
                "language": lang.trim().to_lowercase(),
                "total": results.len(),
                "found": found,
                "results": results,
            }))?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Manage {
            text,
            lang,
            translation,
            manual,
        } => {
            let result = if manual {
                orchestrator.update_manual(&text, &lang, &translation).await
            } else {
                orchestrator.save(&text, &lang, &translation).await
            };
            report_write(result, &text, &lang)
        }

        Commands::Languages => {
            print_json(&json!({ "languages": orchestrator.supported_languages() }))?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::Translations { lang } => match orchestrator.translations_for(&lang).await {
            Ok(translations) => {
                print_json(&json!({
                    "language": lang.trim().to_lowercase(),
                    "count": translations.len(),
                    "translations": translations,
                }))?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                print_json(&error_json(&e))?;
                Ok(exit_code(e.status_code()))
            }
        },

        Commands::Speak {
            text,
            lang,
            output,
            no_cache,
        } => match speech.synthesize(&text, &lang, !no_cache).await {
            Ok(speech_output) => {
                tokio::fs::write(&output, &speech_output.audio)
                    .await
                    .with_context(|| format!("writing {}", output.display()))?;
                let mut value = serde_json::to_value(&speech_output)?;
                value["file"] = json!(output.display().to_string());
                print_json(&value)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                let status = if e.is_client_error() { 400 } else { 500 };
                print_json(&json!({ "error": e.to_string(), "status_code": status }))?;
                Ok(exit_code(status))
            }
        },

        Commands::CacheStats { clear } => {
            print_json(&json!({
                "translation_cache": orchestrator.cache_stats(),
                "audio_cache": speech.cache_stats(),
            }))?;
            if clear {
                orchestrator.clear_cache();
                speech.clear_cache();
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Health => {
            print_json(&json!({
                "service": orchestrator.health(Some(&speech)),
                "audio_cache": speech.cache_stats(),
            }))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
