//! Error types for the store crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Store error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested object does not exist.
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    /// An object with the same identity already exists.
    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: &'static str, key: String },

    /// The write was based on a stale copy of the object.
    #[error(
        "conflict updating '{key}': resource version {expected} is stale, current is {actual}"
    )]
    Conflict {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// The backend cannot serve requests.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A watch subscriber fell behind and missed events.
    #[error("watch lagged behind by {missed} events")]
    WatchLagged { missed: u64 },

    /// The watch channel has no sender left.
    #[error("watch channel closed")]
    WatchClosed,

    /// A manifest could not be parsed.
    #[error("invalid manifest: {reason}")]
    InvalidManifest { reason: String },

    /// A file could not be read.
    #[error("failed to read '{path}': {reason}")]
    Io { path: PathBuf, reason: String },
}

impl Error {
    /// Create a not found error.
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    /// Create an already exists error.
    pub fn already_exists(kind: &'static str, key: impl ToString) -> Self {
        Self::AlreadyExists {
            kind,
            key: key.to_string(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(key: impl ToString, expected: u64, actual: u64) -> Self {
        Self::Conflict {
            key: key.to_string(),
            expected,
            actual,
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create an invalid manifest error.
    pub fn invalid_manifest(reason: impl Into<String>) -> Self {
        Self::InvalidManifest {
            reason: reason.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error reports a missing object.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the error reports a stale write.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
