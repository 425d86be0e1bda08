//! Deletion error types.

use thiserror::Error;

use crate::file::FileStoreError;
use crate::quota::QuotaError;
use crate::remote::RemoteStoreError;

/// Errors from queueing or executing deletions.
#[derive(Debug, Error)]
pub enum DeletionError {
    /// The task queue store failed.
    #[error("deletion queue error: {0}")]
    Repository(String),

    /// The remote store failed during a purge.
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),

    /// File metadata access failed.
    #[error(transparent)]
    Files(#[from] FileStoreError),

    /// Returning the storage share failed.
    #[error(transparent)]
    Quota(#[from] QuotaError),
}

impl DeletionError {
    /// Wrap a queue-store failure message.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
