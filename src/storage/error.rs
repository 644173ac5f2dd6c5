//! Storage error types.

use std::io;
use thiserror::Error;

/// Errors raised by a [`super::KeyValueStore`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Home directory not found while resolving the default store path.
    #[error("failed to get home directory")]
    HomeDirectoryNotFound,

    /// Failed to read the store file.
    #[error("failed to read store: {0}")]
    Read(#[source] io::Error),

    /// Failed to write the store file or create its directory.
    #[error("failed to write store: {0}")]
    Write(#[source] io::Error),

    /// Failed to serialize store contents.
    #[error("failed to serialize store: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The backend refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns true if the error came from the filesystem.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_))
    }

    /// Returns true if a write was lost.
    ///
    /// In-memory state stays authoritative either way; the next successful
    /// write reconciles.
    #[must_use]
    pub fn is_write_error(&self) -> bool {
        matches!(self, Self::Write(_) | Self::Serialize(_) | Self::Unavailable(_))
    }
}
