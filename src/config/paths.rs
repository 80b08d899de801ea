//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\kumajala\
//!   macOS:   ~/Library/Application Support/kumajala/
//!   Linux:   ~/.config/kumajala/
//!
//! Data dir (local translation table):
//!   Windows: %LOCALAPPDATA%\kumajala\
//!   macOS:   ~/Library/Application Support/kumajala/
//!   Linux:   ~/.local/share/kumajala/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory for persisted data.
    pub data_dir: PathBuf,
    /// Full path to the local translation table, `language.json`.
    pub translations_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "kumajala";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let translations_file = data_dir.join("language.json");

        Self {
            config_dir,
            settings_file,
            data_dir,
            translations_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths.data_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .translations_file
            .file_name()
            .is_some_and(|n| n == "language.json"));
    }
}
