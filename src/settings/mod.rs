//! Settings persistence for the zeropamine timer.
//!
//! Settings live in a single JSON document under a fixed storage key, the
//! same document the web client keeps in localStorage. Loading never fails
//! hard: malformed or partial data is merged field-by-field over defaults,
//! and a missing document simply yields the defaults. Saving is best-effort
//! and fire-and-forget; a failed write is logged and the in-memory settings
//! stay authoritative.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{PomodoroSettings, SettingsPatch};

/// Fixed storage key for the settings document.
///
/// Matches the web client's localStorage key so a document written by
/// either side is readable by the other.
pub const STORAGE_KEY: &str = "zeropamine-settings";

// ============================================================================
// SettingsError
// ============================================================================

/// Errors that can occur while persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No writable configuration directory on this host.
    #[error("設定ディレクトリが見つかりません")]
    NoConfigDir,

    /// Filesystem error while reading or writing the document.
    #[error("設定ファイルの入出力に失敗しました: {0}")]
    Io(#[from] std::io::Error),

    /// The settings could not be serialized.
    #[error("設定のシリアライズに失敗しました: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Best-effort persistence side channel for serialized settings.
///
/// `load` returns the raw document or None when absent or unreadable;
/// `save` writes it. Neither is required to complete before the next tick.
pub trait SettingsStore: Send {
    /// Loads the serialized document stored under `key`, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Stores the serialized document under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn save(&self, key: &str, document: &str) -> Result<(), SettingsError>;
}

/// Shared stores work too; tests keep a handle to what the runtime owns.
impl<S> SettingsStore for std::sync::Arc<S>
where
    S: SettingsStore + Send + Sync,
{
    fn load(&self, key: &str) -> Option<String> {
        (**self).load(key)
    }

    fn save(&self, key: &str, document: &str) -> Result<(), SettingsError> {
        (**self).save(key, document)
    }
}

// ============================================================================
// FileSettingsStore
// ============================================================================

/// Stores each key as a JSON file under the user's configuration directory.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    base_dir: PathBuf,
}

impl FileSettingsStore {
    /// Creates a store rooted at `<config_dir>/zeropamine/`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::NoConfigDir` if the platform exposes no
    /// configuration directory.
    pub fn new() -> Result<Self, SettingsError> {
        let base_dir = dirs::config_dir()
            .ok_or(SettingsError::NoConfigDir)?
            .join("zeropamine");
        Ok(Self { base_dir })
    }

    /// Creates a store rooted at an explicit directory (used by tests).
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(document) => Some(document),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("設定ファイルを読み込めません ({}): {}", path.display(), e);
                None
            }
        }
    }

    fn save(&self, key: &str, document: &str) -> Result<(), SettingsError> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.path_for(key);
        fs::write(&path, document)?;
        debug!("Settings saved to {}", path.display());
        Ok(())
    }
}

// ============================================================================
// MemorySettingsStore
// ============================================================================

/// In-memory store for tests and environments without a filesystem.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    documents: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates a document, as if a previous session had saved it.
    pub fn seed(&self, key: &str, document: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), document.to_string());
    }

    /// Returns the number of saved documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Returns true if nothing has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.lock().unwrap().is_empty()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self, key: &str) -> Option<String> {
        self.documents.lock().unwrap().get(key).cloned()
    }

    fn save(&self, key: &str, document: &str) -> Result<(), SettingsError> {
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), document.to_string());
        Ok(())
    }
}

// ============================================================================
// Load / persist helpers
// ============================================================================

/// Loads settings from the store, merging whatever is valid over defaults.
///
/// A missing document yields the defaults; a corrupt one contributes only
/// its recognizable fields. Never fails.
pub fn load_settings(store: &dyn SettingsStore) -> PomodoroSettings {
    let mut settings = PomodoroSettings::default();
    if let Some(document) = store.load(STORAGE_KEY) {
        let patch = SettingsPatch::from_json(&document);
        if patch.is_empty() {
            debug!("Persisted settings contributed nothing, using defaults");
        }
        settings.apply(&patch);
    }
    settings
}

/// Writes settings to the store, logging instead of propagating failures.
pub fn persist_settings(store: &dyn SettingsStore, settings: &PomodoroSettings) {
    let document = match serde_json::to_string(settings) {
        Ok(document) => document,
        Err(e) => {
            warn!("設定をシリアライズできません: {}", e);
            return;
        }
    };
    if let Err(e) = store.save(STORAGE_KEY, &document) {
        warn!("設定を保存できません: {}", e);
    }
}

// ============================================================================
// Tests
// ============================================================================
