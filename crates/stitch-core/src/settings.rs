// crates/stitch-core/src/settings.rs
//
// Key-value persistence injected into the workflow. Two keys are used:
// the directory access token and the cached timeline. Values are opaque
// bytes; each writer owns its own encoding.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

pub const DIRECTORY_TOKEN_KEY: &str = "directory_token";
pub const TIMELINE_KEY:        &str = "timeline";

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<u8>>;
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), WorkflowError>;
    fn remove(&self, key: &str) -> Result<(), WorkflowError>;
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), WorkflowError> {
        self.values.lock().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), WorkflowError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

// ── JsonFileStore ─────────────────────────────────────────────────────────────

#[derive(Default, Serialize, Deserialize)]
struct SettingsFile {
    values: BTreeMap<String, Vec<u8>>,
}

/// A single JSON file holding every key. Each write replaces the file
/// atomically (temp file in the same directory, then rename), so a crash
/// mid-write leaves the previous contents intact.
pub struct JsonFileStore {
    path:   PathBuf,
    values: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<SettingsFile>(&bytes) {
                Ok(file) => file.values,
                Err(e) => {
                    tracing::warn!("[settings] {} is unreadable, starting empty: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("[settings] could not read {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, values: Mutex::new(values) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `values` to disk and hands them back once they are durable.
    fn flush(&self, values: BTreeMap<String, Vec<u8>>) -> Result<BTreeMap<String, Vec<u8>>, WorkflowError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| WorkflowError::fs(dir, e))?;

        let file = SettingsFile { values };
        let body = serde_json::to_vec(&file)
            .map_err(|e| WorkflowError::Store(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| WorkflowError::fs(dir, e))?;
        tmp.write_all(&body).map_err(|e| WorkflowError::fs(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| WorkflowError::fs(&self.path, e.error))?;
        Ok(file.values)
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.values.lock().get(key).cloned()
    }

    // Memory only changes after the file write succeeds, so a failed write
    // leaves get() agreeing with what is on disk.
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), WorkflowError> {
        let mut values = self.values.lock();
        let mut next = values.clone();
        next.insert(key.to_owned(), value);
        *values = self.flush(next)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), WorkflowError> {
        let mut values = self.values.lock();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        *values = self.flush(next)?;
        Ok(())
    }
}
