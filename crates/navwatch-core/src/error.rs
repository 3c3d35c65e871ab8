//! Error taxonomy for navwatch.
//!
//! The watcher itself never fails: unknown events are ignored and a source
//! that closes early simply disposes the registration. Errors come from the
//! edges around it.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum NavWatchError {
    #[error("event source is closed")]
    SourceClosed,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watcher action panicked")]
    ActionPanicked,

    #[error("watcher task was cancelled")]
    Cancelled,
}

impl NavWatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for navwatch operations.
pub type Result<T> = std::result::Result<T, NavWatchError>;
