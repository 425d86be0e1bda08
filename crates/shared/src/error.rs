//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed (missing, unknown, or inactive API key).
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// A plan limit was exceeded (file size or storage cap).
    #[error("Plan limit exceeded: {0}")]
    PlanLimit(String),

    /// The per-day request allowance is exhausted.
    #[error("Request limit exceeded: {0}")]
    RateLimited(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored name already exists at the requested identity.
    #[error("Name conflict: {0}")]
    Conflict(String),

    /// The storage backend failed or timed out; safe to retry.
    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::PlanLimit(_) => 413,
            Self::RateLimited(_) => 429,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::BackendUnavailable(_) => 503,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::PlanLimit(_) => "PLAN_LIMIT_EXCEEDED",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "NAME_CONFLICT",
            Self::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when retrying the same request could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(AppError::PlanLimit(String::new()).status_code(), 413);
        assert_eq!(AppError::RateLimited(String::new()).status_code(), 429);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 409);
        assert_eq!(
            AppError::BackendUnavailable(String::new()).status_code(),
            503
        );
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthorized(String::new()).error_code(),
            "UNAUTHORIZED"
        );
        assert_eq!(
            AppError::PlanLimit(String::new()).error_code(),
            "PLAN_LIMIT_EXCEEDED"
        );
        assert_eq!(
            AppError::RateLimited(String::new()).error_code(),
            "RATE_LIMITED"
        );
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            AppError::Conflict(String::new()).error_code(),
            "NAME_CONFLICT"
        );
        assert_eq!(
            AppError::BackendUnavailable(String::new()).error_code(),
            "BACKEND_UNAVAILABLE"
        );
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "DATABASE_ERROR"
        );
        assert_eq!(
            AppError::Internal(String::new()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_only_backend_errors_are_retryable() {
        assert!(AppError::BackendUnavailable(String::new()).is_retryable());
        assert!(!AppError::PlanLimit(String::new()).is_retryable());
        assert!(!AppError::RateLimited(String::new()).is_retryable());
        assert!(!AppError::Unauthorized(String::new()).is_retryable());
        assert!(!AppError::Database(String::new()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Unauthorized("msg".into()).to_string(),
            "Authentication failed: msg"
        );
        assert_eq!(
            AppError::PlanLimit("msg".into()).to_string(),
            "Plan limit exceeded: msg"
        );
        assert_eq!(
            AppError::RateLimited("msg".into()).to_string(),
            "Request limit exceeded: msg"
        );
        assert_eq!(
            AppError::Conflict("msg".into()).to_string(),
            "Name conflict: msg"
        );
        assert_eq!(
            AppError::BackendUnavailable("msg".into()).to_string(),
            "Storage backend unavailable: msg"
        );
    }
}
