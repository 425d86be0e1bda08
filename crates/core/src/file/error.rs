//! File metadata store errors.

use thiserror::Error;
use uuid::Uuid;

/// Errors from the file metadata store.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// No Active file at the requested identity.
    #[error("file not found: {0}")]
    NotFound(Uuid),

    /// A row already exists at the (tenant, folder, name, visibility)
    /// identity.
    #[error("duplicate file identity: {0}")]
    DuplicateIdentity(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl FileStoreError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
