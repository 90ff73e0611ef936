// crates/stitch-core/src/error.rs
//
// Every stage of the workflow fails with a WorkflowError. The workflow runner
// maps it to a FailureNotice (user-visible) or to a silent cancellation.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::state::FailureNotice;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Stale, denied, or otherwise unusable directory access.
    #[error("no access to {}: {reason}", .path.display())]
    Permission { path: PathBuf, reason: String },

    #[error("filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not load media from {}: {reason}", .path.display())]
    MediaLoad { path: PathBuf, reason: String },

    #[error("settings store: {0}")]
    Store(String),

    #[error("cached timeline is unreadable: {0}")]
    CacheCorrupt(String),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Permission,
    Filesystem,
    Media,
    Storage,
    Cancelled,
}

impl WorkflowError {
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Permission { .. }  => ErrorKind::Permission,
            Self::Filesystem { .. }  => ErrorKind::Filesystem,
            Self::MediaLoad { .. }   => ErrorKind::Media,
            Self::Store(_)
            | Self::CacheCorrupt(_)  => ErrorKind::Storage,
            Self::Cancelled          => ErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The user-facing form of this error. `None` for cancellation, which
    /// ends the workflow without any visible error.
    pub fn notice(&self) -> Option<FailureNotice> {
        let kind = self.kind();
        let can_retry = match kind {
            // A different folder is the only fix the user can make from here.
            ErrorKind::Permission | ErrorKind::Filesystem | ErrorKind::Media => true,
            ErrorKind::Storage   => false,
            ErrorKind::Cancelled => return None,
        };
        Some(FailureNotice { kind, message: self.to_string(), can_retry })
    }
}
