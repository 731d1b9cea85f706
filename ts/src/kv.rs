//! Durable key-value backends
//!
//! A `KvStore` maps short string keys to whole string values. Writes replace
//! the previous value entirely; there is no incremental update.

use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Origin-scoped key-value storage
pub trait KvStore: Send {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

fn validate_key(key: &str) -> Result<(), PersistenceError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}

// Keys may not start with '.', so this never collides with a key's lock file
const SESSION_LOCK_FILE: &str = ".session.lock";

/// Exclusive hold on a `FileKvStore` directory, released on drop
#[derive(Debug)]
pub struct SessionLock {
    file: File,
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("SessionLock released");
    }
}

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileKvStore {
    base_path: PathBuf,
}

impl FileKvStore {
    /// Open or create a store rooted at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        debug!(?base_path, "Opened key-value store");
        Ok(Self { base_path })
    }

    /// Take an exclusive lock on the whole store until the guard is dropped
    ///
    /// Per-key locks only cover one read or one write. A caller that loads,
    /// mutates and saves holds this for the whole sequence so two processes
    /// cannot interleave and drop each other's changes. Blocks until any
    /// other holder releases it.
    pub fn lock_session(&self) -> Result<SessionLock, PersistenceError> {
        fs::create_dir_all(&self.base_path)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(SESSION_LOCK_FILE))?;
        FileExt::lock_exclusive(&file)?;
        debug!(base_path = ?self.base_path, "lock_session: acquired");
        Ok(SessionLock { file })
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    fn lock_file(&self, key: &str) -> Result<File, PersistenceError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(format!("{}.lock", key)))?;
        Ok(file)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        validate_key(key)?;
        let path = self.value_path(key);
        if !path.exists() {
            debug!(%key, "get: no stored value");
            return Ok(None);
        }

        let lock = self.lock_file(key)?;
        FileExt::lock_shared(&lock)?;
        let result = fs::read_to_string(&path);
        FileExt::unlock(&lock)?;

        match result {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        validate_key(key)?;
        // The directory may have been removed since open
        fs::create_dir_all(&self.base_path)?;

        let lock = self.lock_file(key)?;
        FileExt::lock_exclusive(&lock)?;

        let tmp_path = self.base_path.join(format!("{}.json.tmp", key));
        let result = (|| -> Result<(), PersistenceError> {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(value.as_bytes())?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, self.value_path(key))?;
            Ok(())
        })();

        FileExt::unlock(&lock)?;
        if result.is_ok() {
            debug!(%key, bytes = value.len(), "set: value written");
        }
        result
    }
}

/// In-process map, lost when the process exits
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    values: HashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        info!("Using in-memory key-value store; data will not survive restart");
        Self::default()
    }

    /// Seed a value, e.g. to simulate data left by an earlier session
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        validate_key(key)?;
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        validate_key(key)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
