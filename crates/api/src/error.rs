//! HTTP rendering of the shared error taxonomy.
//!
//! Every error body a handler or middleware sends goes through
//! [`ApiError`], so the status and `error` code always come from
//! [`AppError::status_code`] and [`AppError::error_code`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use vaulta_shared::AppError;

/// An [`AppError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

impl ApiError {
    /// 401 for a missing, unknown, or revoked API key.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Response {
        Self(AppError::Unauthorized(message.into())).into_response()
    }

    /// 404 for a file lookup that resolved nothing.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Response {
        Self(AppError::NotFound(message.into())).into_response()
    }

    /// 400 for a request the handler could not parse or accept.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Response {
        Self(AppError::Validation(message.into())).into_response()
    }

    /// 503 for a failed or timed-out storage backend call.
    #[must_use]
    pub fn backend_unavailable(message: impl Into<String>) -> Response {
        Self(AppError::BackendUnavailable(message.into())).into_response()
    }

    /// 500 with a generic body; the cause belongs in the log, not the
    /// response.
    #[must_use]
    pub fn internal() -> Response {
        Self(AppError::Internal("An error occurred".to_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;

    use super::*;

    async fn parts(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_taxonomy_drives_status_and_code() {
        let cases = [
            (AppError::Unauthorized("no key".into()), 401, "UNAUTHORIZED"),
            (
                AppError::PlanLimit("too big".into()),
                413,
                "PLAN_LIMIT_EXCEEDED",
            ),
            (AppError::RateLimited("spent".into()), 429, "RATE_LIMITED"),
            (AppError::NotFound("no file".into()), 404, "NOT_FOUND"),
            (
                AppError::Validation("bad form".into()),
                400,
                "VALIDATION_ERROR",
            ),
            (AppError::Conflict("taken".into()), 409, "NAME_CONFLICT"),
            (
                AppError::BackendUnavailable("timeout".into()),
                503,
                "BACKEND_UNAVAILABLE",
            ),
            (AppError::Internal("oops".into()), 500, "INTERNAL_ERROR"),
        ];

        for (error, status, code) in cases {
            let (got_status, body) = parts(ApiError(error).into_response()).await;
            assert_eq!(got_status.as_u16(), status);
            assert_eq!(body["error"], code);
        }
    }

    #[tokio::test]
    async fn test_message_carries_the_display_form() {
        let (_, body) =
            parts(ApiError(AppError::RateLimited("490 of 500".into())).into_response()).await;
        assert_eq!(body["message"], "Request limit exceeded: 490 of 500");
    }

    #[tokio::test]
    async fn test_internal_body_stays_generic() {
        let (status, body) = parts(ApiError::internal()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal error: An error occurred");
    }
}
