//! Reference error types.

use thiserror::Error;

use crate::remote::RemoteStoreError;

/// Errors from issuing or renewing signed references.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The reference store failed.
    #[error("reference repository error: {0}")]
    Repository(String),

    /// The remote store refused to mint an authorization.
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
}

impl ReferenceError {
    /// Wrap a storage-layer failure message.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
