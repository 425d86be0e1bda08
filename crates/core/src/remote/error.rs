//! Remote store error types.

use thiserror::Error;

/// Errors from remote store operations.
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// The object or version does not exist remotely.
    #[error("remote object not found: {0}")]
    NotFound(String),

    /// The session token was rejected even after a refresh.
    #[error("remote session expired")]
    SessionExpired,

    /// The request timed out before a response arrived.
    #[error("remote store timed out")]
    Timeout,

    /// The store answered with an error payload.
    #[error("remote store error {status}: {message}")]
    Api {
        /// HTTP status the store returned.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Transport-level failure before any response.
    #[error("remote store transport error: {0}")]
    Transport(String),
}

impl RemoteStoreError {
    /// Whether the error means the object is already gone. Purge paths
    /// treat this as success.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for RemoteStoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}
