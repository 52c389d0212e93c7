//! Key-value persistence.
//!
//! Stores never talk to the filesystem directly; they are built from a
//! [`StorageContext`] holding a persistent (`local`) and a session-scoped
//! backend. Reads are corruption-tolerant: a value that fails to parse is
//! logged and treated as absent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Prefix shared by every persisted key
pub const KEY_PREFIX: &str = "lingq_";

/// Lesson collection (local)
pub const ARTICLES_KEY: &str = "lingq_articles";
/// Word -> status record (local)
pub const VOCABULARY_KEY: &str = "lingq_vocabulary";
/// Word translation cache (local)
pub const TRANSLATION_CACHE_KEY: &str = "lingq_translation_cache";
/// Sentence translation cache (session)
pub const SENTENCE_CACHE_KEY: &str = "lingq_translation_cache_sentences";
/// Settings record (local)
pub const SETTINGS_KEY: &str = "lingq_settings";
/// Lesson id -> completed sentences (local)
pub const PROGRESS_KEY: &str = "lingq_article_progress";
/// "lang::sentence" -> text fast path (session)
pub const SENTENCE_FAST_CACHE_KEY: &str = "lingq_sentence_translation_cache";

/// A string key-value store
pub trait StorageBackend: Send + Sync {
    /// Read the raw value for a key, if present
    fn load(&self, key: &str) -> Option<String>;

    /// Write a raw value
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process backend, used for the session scope and in tests
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // A poisoned lock still holds usable data; single writer per process.
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory, written atomically
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a storage directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(FileBackend { dir })
    }

    /// Get the storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write_atomic(&self, key: &str, value: &str) -> io::Result<()> {
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(value.as_bytes())?;
        temp.flush()?;
        temp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn load(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(key, error = %e, "failed to read storage key");
                None
            }
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write_atomic(key, value).map_err(|source| StorageError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// The two storage scopes every store is built from
#[derive(Clone)]
pub struct StorageContext {
    /// Survives restarts
    pub local: Arc<dyn StorageBackend>,
    /// Cleared when the process (browsing session) ends
    pub session: Arc<dyn StorageBackend>,
}

impl StorageContext {
    pub fn new(local: Arc<dyn StorageBackend>, session: Arc<dyn StorageBackend>) -> Self {
        StorageContext { local, session }
    }

    /// Both scopes in memory
    pub fn in_memory() -> Self {
        StorageContext::new(Arc::new(MemoryBackend::new()), Arc::new(MemoryBackend::new()))
    }

    /// Files under `dir` for the local scope, memory for the session scope
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let local = FileBackend::open(dir)?;
        Ok(StorageContext::new(Arc::new(local), Arc::new(MemoryBackend::new())))
    }
}

/// Read and parse a JSON value; absent or corrupt data yields `None`
pub fn load_json<T: DeserializeOwned>(backend: &dyn StorageBackend, key: &str) -> Option<T> {
    let raw = backend.load(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "corrupt persisted state, falling back to default");
            None
        }
    }
}

/// Like [`load_json`], falling back to `T::default()`
pub fn load_json_or_default<T: DeserializeOwned + Default>(
    backend: &dyn StorageBackend,
    key: &str,
) -> T {
    load_json(backend, key).unwrap_or_default()
}

/// Serialize and write a JSON value
pub fn save_json<T: Serialize + ?Sized>(
    backend: &dyn StorageBackend,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    debug!(key, bytes = raw.len(), "persisting");
    backend.save(key, &raw)
}
