//! kumajala: French to Ivorian and Burkinabè language translation service.
//!
//! Translations are resolved from a cache, then a persistent store, then a
//! generative model whose answers are cleaned, validated and written back.
//! Translated text can be rendered to speech.

pub mod cache;
pub mod config;
pub mod languages;
pub mod llm;
pub mod resolve;
pub mod store;
pub mod tts;
