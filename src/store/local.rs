//! Local translation table.
//!
//! [`LocalTableBackend`] keeps every translation in memory and, when opened
//! on a file, mirrors the whole table to JSON after each write.  On-disk
//! shape (the French source text is the outer key, always lower-cased):
//!
//! ```json
//! { "fr": { "bonjour": { "bété": "Akwaba", "baoulé": "Mo ho" } } }
//! ```
//!
//! Loading is forgiving: a missing file is seeded with the default table
//! (and written back), while unreadable or malformed content falls back to
//! the defaults without touching the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{StoreError, StoreMode, StoredTranslation, TranslationBackend};
use crate::languages::SOURCE_LANGUAGE;

/// source text (lower-cased) → language code → translation.
pub type Table = BTreeMap<String, BTreeMap<String, String>>;

/// Seed content used when no usable table file exists.
const DEFAULT_TABLE: &[(&str, [(&str, &str); 4])] = &[
    (
        "bonjour",
        [("bété", "Akwaba"), ("baoulé", "Mo ho"), ("mooré", "Ne y windga"), ("agni", "Agni oh")],
    ),
    (
        "comment allez-vous?",
        [("bété", "Bi ye né?"), ("baoulé", "Wo ho tè n?"), ("mooré", "Fo laafi?"), ("agni", "Aka kye?")],
    ),
    (
        "merci",
        [("bété", "Akpé"), ("baoulé", "Mo"), ("mooré", "Barika"), ("agni", "Akpé")],
    ),
    (
        "au revoir",
        [("bété", "Kan na"), ("baoulé", "Kan na"), ("mooré", "Nan kã pãalem"), ("agni", "Aka na")],
    ),
    (
        "oui",
        [("bété", "Yoo"), ("baoulé", "Yoo"), ("mooré", "Yãa"), ("agni", "Aoo")],
    ),
    (
        "non",
        [("bété", "Kou"), ("baoulé", "Kou"), ("mooré", "Ayi"), ("agni", "N'an")],
    ),
];

pub fn default_table() -> Table {
    DEFAULT_TABLE
        .iter()
        .map(|(text, row)| {
            let row = row
                .iter()
                .map(|(lang, tr)| (lang.to_string(), tr.to_string()))
                .collect();
            (text.to_string(), row)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// LocalTableBackend
// ---------------------------------------------------------------------------

pub struct LocalTableBackend {
    table: Mutex<Table>,
    /// `None` for a purely in-memory table.
    path: Option<PathBuf>,
}

impl LocalTableBackend {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Open the table file at `path`, seeding it with the default table when
    /// it does not exist yet.
    pub fn open(path: PathBuf) -> Self {
        let table = match std::fs::read_to_string(&path) {
            Ok(data) => parse_table(&data).unwrap_or_else(default_table),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("store: {} not found, creating default table", path.display());
                let table = default_table();
                if let Err(e) = write_table(&path, &table) {
                    log::error!("store: could not write default table: {e}");
                }
                table
            }
            Err(e) => {
                log::error!("store: could not read {}: {e}", path.display());
                default_table()
            }
        };

        log::info!(
            "store: local table loaded from {} ({} entries)",
            path.display(),
            table.len()
        );
        Self {
            table: Mutex::new(table),
            path: Some(path),
        }
    }

    /// In-memory table with the given content and no backing file.
    pub fn in_memory(table: Table) -> Self {
        Self {
            table: Mutex::new(table),
            path: None,
        }
    }

    pub fn in_memory_with_defaults() -> Self {
        Self::in_memory(default_table())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current table.
    pub async fn snapshot(&self) -> Table {
        self.table.lock().await.clone()
    }
}

#[async_trait]
impl TranslationBackend for LocalTableBackend {
    fn mode(&self) -> StoreMode {
        StoreMode::Local
    }

    async fn get(&self, source: &str, target: &str) -> Result<Option<String>, StoreError> {
        let table = self.table.lock().await;
        Ok(table.get(source).and_then(|row| row.get(target)).cloned())
    }

    async fn put(&self, source: &str, target: &str, translation: &str) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        table
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string(), translation.to_string());

        // The lock is held across the write so files land in update order.
        if let Some(path) = &self.path {
            let data = serde_json::to_string_pretty(&wrap(&table))?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, data).await?;
        }
        Ok(())
    }

    async fn list(&self, target: &str) -> Result<Vec<StoredTranslation>, StoreError> {
        let table = self.table.lock().await;
        Ok(table
            .iter()
            .filter_map(|(source, row)| {
                row.get(target).map(|tr| StoredTranslation {
                    source_text: source.clone(),
                    target_language: target.to_string(),
                    translation: tr.clone(),
                })
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Persistence helpers
// ---------------------------------------------------------------------------

fn wrap(table: &Table) -> BTreeMap<&'static str, &Table> {
    BTreeMap::from([(SOURCE_LANGUAGE, table)])
}

fn write_table(path: &Path, table: &Table) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&wrap(table))?)?;
    Ok(())
}

/// Parse table file content.  `None` means "use the defaults".
///
/// A top-level object without a `"fr"` key is taken to be the source map
/// itself.  Keys are lower-cased; rows and translations that are not of the
/// expected shape are skipped.
fn parse_table(data: &str) -> Option<Table> {
    let raw: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            log::error!("store: table file is not valid JSON: {e}");
            return None;
        }
    };

    let Value::Object(mut top) = raw else {
        log::error!("store: table file must hold a JSON object");
        return None;
    };

    let source_map = match top.remove(SOURCE_LANGUAGE) {
        Some(Value::Object(map)) => map,
        Some(_) => {
            log::error!("store: \"{SOURCE_LANGUAGE}\" entry must be an object");
            return None;
        }
        None => {
            log::warn!("store: no \"{SOURCE_LANGUAGE}\" key, treating file as the source map");
            top
        }
    };

    let mut table = Table::new();
    for (text, row) in source_map {
        let Value::Object(row) = row else {
            log::warn!("store: skipping invalid entry {text:?}");
            continue;
        };
        let row: BTreeMap<String, String> = row
            .into_iter()
            .filter_map(|(lang, tr)| match tr {
                Value::String(s) => Some((lang, s)),
                _ => None,
            })
            .collect();
        table.entry(text.to_lowercase()).or_default().extend(row);
    }
    Some(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_seeded_and_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("language.json");

        let backend = LocalTableBackend::open(path.clone());
        assert!(path.exists());

        let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["fr"]["merci"]["mooré"], "Barika");
        assert_eq!(backend.path(), Some(path.as_path()));
    }

    #[test]
    fn malformed_json_falls_back_without_overwriting() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("language.json");
        std::fs::write(&path, "{ not json").unwrap();

        let backend = LocalTableBackend::open(path.clone());
        let table = backend.table.try_lock().unwrap();
        assert!(table.contains_key("bonjour"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn non_object_top_level_uses_defaults() {
        assert!(parse_table("[1, 2, 3]").is_none());
        assert!(parse_table(r#"{"fr": "oops"}"#).is_none());
    }

    #[test]
    fn keys_are_lowercased_and_bad_rows_skipped() {
        let table = parse_table(
            r#"{"fr": {"Bonne Nuit": {"bété": "Yi"}, "cassé": "pas un objet", "chat": {"agni": 3}}}"#,
        )
        .unwrap();
        assert_eq!(table["bonne nuit"]["bété"], "Yi");
        assert!(!table.contains_key("cassé"));
        assert!(table["chat"].is_empty());
    }

    #[test]
    fn file_without_fr_key_is_treated_as_source_map() {
        let table = parse_table(r#"{"soleil": {"baoulé": "Wia"}}"#).unwrap();
        assert_eq!(table["soleil"]["baoulé"], "Wia");
    }

    #[tokio::test]
    async fn put_rewrites_file_and_keeps_siblings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("language.json");
        let backend = LocalTableBackend::open(path.clone());

        backend.put("merci", "bété", "Ayoo").await.unwrap();
        backend.put("maison", "agni", "Awuro").await.unwrap();

        let reopened = LocalTableBackend::open(path);
        assert_eq!(reopened.get("merci", "bété").await.unwrap().as_deref(), Some("Ayoo"));
        assert_eq!(reopened.get("merci", "baoulé").await.unwrap().as_deref(), Some("Mo"));
        assert_eq!(reopened.get("maison", "agni").await.unwrap().as_deref(), Some("Awuro"));
    }

    #[tokio::test]
    async fn list_filters_by_language() {
        let backend = LocalTableBackend::in_memory_with_defaults();
        backend.put("soleil", "baoulé", "Wia").await.unwrap();

        let baoule = backend.list("baoulé").await.unwrap();
        assert_eq!(baoule.len(), 7);
        assert!(baoule
            .iter()
            .any(|t| t.source_text == "soleil" && t.translation == "Wia"));

        let agni = backend.list("agni").await.unwrap();
        assert_eq!(agni.len(), 6);
    }

    #[tokio::test]
    async fn in_memory_put_does_not_touch_disk() {
        let backend = LocalTableBackend::in_memory(Table::new());
        backend.put("eau", "mooré", "Koom").await.unwrap();
        assert!(backend.path().is_none());
        assert_eq!(backend.snapshot().await["eau"]["mooré"], "Koom");
    }
}
