//! Plan store errors.

use thiserror::Error;

/// Errors from the plan store. These never reach an API caller; the
/// catalog degrades to defaults instead.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl PlanError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
