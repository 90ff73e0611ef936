// crates/stitch-media/src/directory.rs
//
// Directory resolution: restore the folder the user picked on a previous run,
// or ask for one and remember it.
//
// A DirectoryHandle is only a path plus an access scope. Every stage that
// touches the folder brackets its work with begin_access(), which re-checks
// that the folder is still there and writable and hands back an RAII guard.
// Scopes nest and can be opened any number of times.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use stitch_core::latch::{CancelToken, Readiness};
use stitch_core::settings::{SettingsStore, DIRECTORY_TOKEN_KEY};
use stitch_core::WorkflowError;

const TOKEN_VERSION: u32 = 1;

// ── Handle + access scope ─────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct DirectoryHandle {
    path:   PathBuf,
    scopes: Arc<AtomicUsize>,
}

/// Live access to a directory. Dropping it ends the access.
pub struct AccessScope<'a> {
    handle: &'a DirectoryHandle,
}

impl Drop for AccessScope<'_> {
    fn drop(&mut self) {
        self.handle.scopes.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AccessScope<'_> {
    pub fn path(&self) -> &Path {
        &self.handle.path
    }
}

#[derive(Serialize, Deserialize)]
struct DirectoryToken {
    version: u32,
    path:    PathBuf,
}

impl DirectoryHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), scopes: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of scopes currently open on this handle (and its clones).
    pub fn open_scopes(&self) -> usize {
        self.scopes.load(Ordering::SeqCst)
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        let denied = |reason: &str| WorkflowError::Permission {
            path:   self.path.clone(),
            reason: reason.into(),
        };
        let meta = std::fs::metadata(&self.path).map_err(|e| denied(&e.to_string()))?;
        if !meta.is_dir() {
            return Err(denied("not a directory"));
        }
        // The read-only attribute says nothing reliable about whether we can
        // create files here, so try it. The scratch file is removed on drop.
        tempfile::NamedTempFile::new_in(&self.path)
            .map_err(|e| denied(&format!("not writable: {e}")))?;
        Ok(())
    }

    pub fn begin_access(&self) -> Result<AccessScope<'_>, WorkflowError> {
        self.validate()?;
        self.scopes.fetch_add(1, Ordering::SeqCst);
        Ok(AccessScope { handle: self })
    }

    pub fn token_bytes(&self) -> Result<Vec<u8>, WorkflowError> {
        serde_json::to_vec(&DirectoryToken { version: TOKEN_VERSION, path: self.path.clone() })
            .map_err(|e| WorkflowError::Store(e.to_string()))
    }

    /// Rebuilds a handle from a persisted token. Fails with `Permission` when
    /// the token is unreadable or the folder it names is gone.
    pub fn restore(bytes: &[u8]) -> Result<Self, WorkflowError> {
        let token: DirectoryToken = serde_json::from_slice(bytes).map_err(|e| {
            WorkflowError::Permission { path: PathBuf::new(), reason: format!("bad token: {e}") }
        })?;
        if token.version != TOKEN_VERSION {
            return Err(WorkflowError::Permission {
                path:   token.path,
                reason: format!("token version {}", token.version),
            });
        }
        let handle = Self::new(token.path);
        handle.validate()?;
        Ok(handle)
    }
}

// ── Picker ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    Chosen(PathBuf),
    /// Closed without a selection. The resolver asks again.
    Dismissed,
    /// The workflow was cancelled while the picker was up.
    Cancelled,
}

/// Asks the user for a folder. Implementations must return
/// `PickOutcome::Cancelled` promptly once `cancel` fires.
pub trait FolderPicker: Send + Sync {
    fn pick(&self, cancel: &CancelToken) -> PickOutcome;
}

// ── Resolver ──────────────────────────────────────────────────────────────────

pub fn resolve_directory(
    store:     &dyn SettingsStore,
    picker:    &dyn FolderPicker,
    readiness: &Readiness,
    cancel:    &CancelToken,
) -> Result<DirectoryHandle, WorkflowError> {
    readiness.wait(cancel)?;

    if let Some(bytes) = store.get(DIRECTORY_TOKEN_KEY) {
        match DirectoryHandle::restore(&bytes) {
            Ok(handle) => {
                tracing::info!("[dir] restored {}", handle.path().display());
                return Ok(handle);
            }
            Err(e) => {
                tracing::warn!("[dir] stored directory is stale, asking again: {e}");
                store.remove(DIRECTORY_TOKEN_KEY)?;
            }
        }
    }

    loop {
        cancel.check()?;
        match picker.pick(cancel) {
            PickOutcome::Cancelled => return Err(WorkflowError::Cancelled),
            PickOutcome::Dismissed => {
                tracing::info!("[dir] picker dismissed without a folder, asking again");
            }
            PickOutcome::Chosen(path) => {
                let handle = DirectoryHandle::new(path);
                if let Err(e) = handle.validate() {
                    tracing::warn!("[dir] unusable selection: {e}");
                    continue;
                }
                store.set(DIRECTORY_TOKEN_KEY, handle.token_bytes()?)?;
                tracing::info!("[dir] selected {}", handle.path().display());
                return Ok(handle);
            }
        }
    }
}
