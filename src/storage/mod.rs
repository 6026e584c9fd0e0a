//! Client-local key/value storage.
//!
//! Plays the role of browser `localStorage`: string keys, string values,
//! and operations that may fail. Callers that treat persistence as
//! best-effort simply ignore the `Err`.
//!
//! - [`FileStorage`] keeps a flat JSON object on disk
//!   (`~/.medform/storage.json` by default).
//! - [`MemoryStorage`] lives in-process and can be told to fail.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Minimal `localStorage`-shaped interface.
pub trait LocalStorage: Send {
    /// Read a key. `Ok(None)` means the key is not set.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a key, replacing any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// File-backed storage
// ---------------------------------------------------------------------------

/// JSON-file storage. Every call re-reads the file so separate `medform`
/// processes observe each other's writes.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at the configured path, or `~/.medform/storage.json` when the
    /// configured path is empty.
    pub fn from_config(config: &crate::config::StorageConfig) -> Result<Self> {
        if !config.path.is_empty() {
            return Ok(Self::at(&config.path));
        }
        default_storage_path()
            .map(Self::at)
            .context("could not determine home directory for local storage")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("malformed storage file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e)
                .with_context(|| format!("failed to read storage file {}", self.path.display())),
        }
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create storage directory")?;
        }
        let json = serde_json::to_string_pretty(&items).context("failed to serialize storage")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write storage file {}", self.path.display()))
    }
}

/// Open the configured storage.
///
/// When no path can be resolved the returned store fails every call, which
/// callers already treat as "storage unavailable".
pub fn open(config: &crate::config::MedformConfig) -> Box<dyn LocalStorage> {
    match FileStorage::from_config(&config.storage) {
        Ok(storage) => Box::new(storage),
        Err(e) => {
            crate::analytics::logger::log_diagnostic(
                &config.logging,
                &format!("local storage unavailable: {e:#}"),
            );
            Box::new(MemoryStorage::unavailable())
        }
    }
}

/// Default storage location: `~/.medform/storage.json`.
pub fn default_storage_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".medform").join("storage.json"))
}

// ---------------------------------------------------------------------------
// In-memory storage
// ---------------------------------------------------------------------------

/// In-process storage, optionally failing every read and/or write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage where every read and write errors.
    pub fn unavailable() -> Self {
        Self {
            fail_reads: true,
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Storage that reads fine but rejects writes (e.g. quota exceeded).
    pub fn read_only() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads {
            anyhow::bail!("storage unavailable");
        }
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("storage is read-only");
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
