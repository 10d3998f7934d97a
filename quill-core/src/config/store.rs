//! Durable configuration storage
//!
//! The store is the sole durable owner of servers, agents, selections and
//! per-document history. Loading never fails: a missing or malformed
//! document yields the built-in defaults.

use crate::config::constants::paths;
use crate::config::types::AssistantConfig;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Key/value document holding the assistant configuration
pub trait ConfigStore: Send + Sync {
    /// Read the current document, falling back to defaults
    fn load(&self) -> AssistantConfig;

    /// Write the document; returns whether it was committed
    fn save(&self, config: &AssistantConfig) -> bool;

    /// Directory holding the application's own files, exempt from edit checks
    fn private_dir(&self) -> Option<PathBuf> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Configuration document on disk, JSON or TOML by file extension
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$QUILL_CONFIG`, else in the user's configuration directory
    pub fn from_env_or_default() -> Self {
        match std::env::var(paths::CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::new(path),
            _ => Self::new(Self::default_path()),
        }
    }

    /// `<config dir>/quill/ai_config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(paths::APP_DIR))
            .or_else(|| dirs::home_dir().map(|home| home.join(paths::FALLBACK_DIR)))
            .unwrap_or_else(|| PathBuf::from(paths::FALLBACK_DIR))
            .join(paths::CONFIG_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> ConfigFormat {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }

    fn read(&self) -> Result<AssistantConfig> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config file: {}", self.path.display()))?;

        let config = match self.format() {
            ConfigFormat::Json => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", self.path.display()))?,
            ConfigFormat::Toml => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", self.path.display()))?,
        };
        Ok(config)
    }

    fn write(&self, config: &AssistantConfig) -> Result<()> {
        let content = match self.format() {
            ConfigFormat::Json => serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration")?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).context("Failed to serialize configuration")?
            }
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))?;
        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> AssistantConfig {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no config file, using defaults");
            return AssistantConfig::default();
        }
        match self.read() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "falling back to default configuration");
                AssistantConfig::default()
            }
        }
    }

    fn save(&self, config: &AssistantConfig) -> bool {
        match self.write(config) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to save configuration");
                false
            }
        }
    }

    /// Absolute parent of the configuration file
    fn private_dir(&self) -> Option<PathBuf> {
        let path = match std::path::absolute(&self.path) {
            Ok(path) => path,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "cannot resolve configuration directory"
                );
                return None;
            }
        };
        path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

/// In-memory store, used by tests and by embedders without persistence
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: Mutex<AssistantConfig>,
    saves: AtomicUsize,
    private_dir: Option<PathBuf>,
}

impl MemoryConfigStore {
    pub fn new(config: AssistantConfig) -> Self {
        Self {
            config: Mutex::new(config),
            saves: AtomicUsize::new(0),
            private_dir: None,
        }
    }

    pub fn with_private_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.private_dir = Some(dir.into());
        self
    }

    /// Number of successful `save` calls
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> AssistantConfig {
        self.config.lock().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> AssistantConfig {
        self.config.lock().clone()
    }

    fn save(&self, config: &AssistantConfig) -> bool {
        *self.config.lock() = config.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn private_dir(&self) -> Option<PathBuf> {
        self.private_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::Message;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = tempdir().unwrap();
        let store = FileConfigStore::new(temp.path().join("absent.json"));
        assert_eq!(store.load(), AssistantConfig::default());
    }

    #[test]
    fn malformed_file_loads_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("ai_config.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FileConfigStore::new(&path);
        assert_eq!(store.load(), AssistantConfig::default());
    }

    #[test]
    fn json_round_trip_creates_parent_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("ai_config.json");
        let store = FileConfigStore::new(&path);

        let mut config = AssistantConfig::default();
        config.active_agent = "architect".to_string();
        config
            .histories
            .insert("/tmp/a.rs".to_string(), vec![Message::user("hello")]);
        assert!(store.save(&config));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"activeAgent\": \"architect\""));
        assert_eq!(store.load(), config);
        assert_eq!(store.private_dir(), Some(temp.path().join("nested")));
    }

    #[test]
    fn relative_config_path_has_absolute_private_dir() {
        for path in ["./ai_config.json", "ai_config.json"] {
            let store = FileConfigStore::new(path);
            let dir = store.private_dir().unwrap();
            assert!(dir.is_absolute(), "{path}: {}", dir.display());
            assert_eq!(dir, std::env::current_dir().unwrap());
        }
    }

    #[test]
    fn toml_extension_selects_toml_format() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("quill.toml");
        let store = FileConfigStore::new(&path);

        let mut config = AssistantConfig::default();
        config.allowed_project_dir = Some("/work/project".to_string());
        config.histories.insert(
            "/work/project/main.rs".to_string(),
            vec![Message::user("q"), Message::assistant("a")],
        );
        assert!(store.save(&config));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("activeServer = \"gemini\""));
        assert_eq!(store.load(), config);
    }

    #[test]
    fn memory_store_counts_saves() {
        let store = MemoryConfigStore::new(AssistantConfig::default());
        let mut config = store.load();
        config.use_caching = true;
        assert!(store.save(&config));
        assert_eq!(store.save_count(), 1);
        assert!(store.load().use_caching);
    }
}
