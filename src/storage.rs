//! Key-value slot storage for taskmate
//!
//! Persisted state is two independent slots, each holding one JSON document:
//!
//! ```text
//! <data dir>/
//!   taskmate.toml               # Optional configuration
//!   TASKMATE_TASKS.json         # JSON array of tasks
//!   TASKMATE_TASKS.lock         # Lock held by lifecycle operations
//!   TASKMATE_CATEGORIES.json    # JSON array of categories
//!   TASKMATE_CATEGORIES.lock
//! ```
//!
//! `FileStore` is the on-disk medium; `MemoryStore` keeps slots in process
//! memory and can simulate a failing medium.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Extension of slot data files
const SLOT_EXTENSION: &str = "json";

/// Extension of slot lock files
const LOCK_EXTENSION: &str = "lock";

/// Guard returned by [`KeyValueStore::lock`]; the slot is released on drop
#[derive(Debug)]
pub enum SlotGuard<'a> {
    File(FileLock),
    Memory(MutexGuard<'a, ()>),
}

/// A medium holding string values under string keys
pub trait KeyValueStore: Send + Sync {
    /// Read a slot; `None` when nothing was ever written or it was removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the slot's value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the slot; deleting an absent slot succeeds
    fn remove(&self, key: &str) -> Result<()>;

    /// Take the exclusive lock serializing read-modify-write cycles on `key`
    fn lock(&self, key: &str) -> Result<SlotGuard<'_>>;
}

/// Directory-backed store: one JSON file per slot
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Directory holding the slot files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the data file for a slot
    pub fn slot_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{SLOT_EXTENSION}")))
    }

    /// Path of the lock file for a slot
    pub fn lock_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{LOCK_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        lock::write_atomic(&path, value.as_bytes())?;
        tracing::debug!(path = %path.display(), bytes = value.len(), "slot written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "slot removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn lock(&self, key: &str) -> Result<SlotGuard<'_>> {
        let path = self.lock_path(key)?;
        let guard = FileLock::acquire(&path, self.lock_timeout_ms)?;
        Ok(SlotGuard::File(guard))
    }
}

/// In-process store
///
/// Read and write failures can be switched on to simulate a broken medium.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    cycle: Mutex<()>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get` fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` and `remove` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw slot contents, bypassing failure simulation
    pub fn raw(&self, key: &str) -> Option<String> {
        self.values().get(key).cloned()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn simulated(op: &str, key: &str) -> Error {
        Error::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("simulated {op} failure for slot {key}"),
        ))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::simulated("read", key));
        }
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::simulated("write", key));
        }
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::simulated("remove", key));
        }
        self.values().remove(key);
        Ok(())
    }

    fn lock(&self, _key: &str) -> Result<SlotGuard<'_>> {
        let guard = self
            .cycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(SlotGuard::Memory(guard))
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid slot key '{key}'")))
    }
}
