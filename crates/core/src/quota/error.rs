//! Quota accounting errors.

use thiserror::Error;

/// Errors raised by quota accounting.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// The charge would push storage usage past the plan cap.
    #[error(
        "storage limit exceeded: {used_bytes} + {requested_bytes} would pass {limit_bytes} bytes"
    )]
    StorageExceeded {
        /// Bytes in use before the rejected charge.
        used_bytes: i64,
        /// Bytes the caller tried to add.
        requested_bytes: i64,
        /// The plan's storage cap.
        limit_bytes: i64,
    },

    /// The rolling-window request allowance is spent.
    #[error("request limit exceeded: {count} of {limit} in the current window")]
    RequestsExhausted {
        /// Requests recorded in the current window.
        count: i64,
        /// The plan's window allowance.
        limit: i64,
    },

    /// The underlying counter store failed.
    #[error("quota repository error: {0}")]
    Repository(String),
}

impl QuotaError {
    /// Wrap a storage-layer failure message.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
