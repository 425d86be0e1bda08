//! File upload endpoint.
//!
//! Accepts a multipart batch, runs it through the upload pipeline, and
//! reports per-file outcomes. Only auth, an empty batch, an oversized
//! file, or an exhausted quota fail the request as a whole.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use vaulta_core::file::Visibility;
use vaulta_core::placement::CollisionPolicy;
use vaulta_core::quota::QuotaError;
use vaulta_core::upload::{IncomingFile, UploadError, UploadOptions, UploadOutcome};
use vaulta_shared::AppError;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::auth::AuthTenant;

/// Upper bound on a whole multipart request body.
const MAX_REQUEST_BYTES: usize = 256 * 1024 * 1024;

/// Creates upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters accepted by the upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Replace an existing file at the same identity.
    #[serde(rename = "override")]
    pub override_existing: Option<bool>,
    /// Collision handling; `reject` refuses taken names outright.
    pub on_conflict: Option<String>,
}

/// Response body for a processed upload batch.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Whether the batch passed the request-level gates.
    pub success: bool,
    /// Number of files stored.
    pub uploaded: usize,
    /// Per-file results, in request order.
    pub files: Vec<UploadEntry>,
    /// Wall-clock processing time in milliseconds.
    pub took_ms: u64,
}

/// One file's result within an upload batch.
#[derive(Debug, Serialize)]
pub struct UploadEntry {
    /// Stored filename, or the sent one when the file failed.
    pub filename: String,
    /// Folder path the file was stored under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Stored size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Whether the file is private.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    /// Download URL, tokened for private files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Failure reason when the file was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Form fields collected from a multipart request.
#[derive(Debug, Default)]
struct UploadForm {
    folder: String,
    private: bool,
    provided_name: Option<String>,
    expire_delete_secs: Option<i64>,
    token_ttl_secs: Option<i64>,
    files: Vec<IncomingFile>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parses a lenient boolean form value.
fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "yes")
}

/// Resolves the collision policy from query parameters.
///
/// An explicit `on_conflict` wins over `override=true`; unknown values
/// are ignored.
fn collision_policy(query: &UploadQuery) -> CollisionPolicy {
    if let Some(policy) = query.on_conflict.as_deref().and_then(CollisionPolicy::parse) {
        return policy;
    }
    if query.override_existing.unwrap_or(false) {
        return CollisionPolicy::Overwrite;
    }
    CollisionPolicy::AutoSuffix
}

fn entry_for(outcome: UploadOutcome) -> UploadEntry {
    match outcome {
        UploadOutcome::Uploaded(done) => UploadEntry {
            filename: done.file.file_name,
            path: Some(done.file.folder_path),
            size: Some(done.file.size_bytes),
            private: Some(done.file.visibility.is_private()),
            url: Some(done.locator.url),
            error: None,
        },
        UploadOutcome::Failed {
            original_name,
            reason,
        } => UploadEntry {
            filename: original_name,
            path: None,
            size: None,
            private: None,
            url: None,
            error: Some(reason),
        },
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn malformed_multipart(detail: &str) -> Response {
    ApiError::validation(format!("Failed to parse multipart form: {detail}"))
}

/// Drains the multipart stream into settings and file payloads.
///
/// Parts with a filename become payloads; everything else is a text
/// setting. Unknown settings and unparsable numbers are ignored.
async fn collect_form(multipart: &mut Multipart) -> Result<UploadForm, Response> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(malformed_multipart(&e.to_string())),
        };

        if let Some(file_name) = field.file_name() {
            let original_name = file_name.to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            match field.bytes().await {
                Ok(payload) => form.files.push(IncomingFile {
                    original_name,
                    content_type,
                    payload,
                }),
                Err(e) => return Err(malformed_multipart(&e.to_string())),
            }
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = match field.text().await {
            Ok(value) => value,
            Err(e) => return Err(malformed_multipart(&e.to_string())),
        };
        match name.as_str() {
            "path" => form.folder = value,
            "private" => form.private = parse_flag(&value),
            "filename" => form.provided_name = Some(value),
            "expire_delete" => form.expire_delete_secs = value.trim().parse().ok(),
            "expire_token_seconds" => form.token_ttl_secs = value.trim().parse().ok(),
            _ => {}
        }
    }

    Ok(form)
}

fn upload_error_response(error: &UploadError) -> Response {
    match error {
        UploadError::FileTooLarge {
            name,
            size_bytes,
            max_bytes,
        } => ApiError(AppError::PlanLimit(format!(
            "file {name} is {size_bytes} bytes, the plan allows {max_bytes}"
        )))
        .into_response(),
        UploadError::Quota(QuotaError::StorageExceeded {
            used_bytes,
            requested_bytes,
            limit_bytes,
        }) => ApiError(AppError::PlanLimit(format!(
            "storing {requested_bytes} more bytes would exceed the plan's \
             {limit_bytes}-byte cap ({used_bytes} in use)"
        )))
        .into_response(),
        UploadError::Quota(QuotaError::RequestsExhausted { count, limit }) => {
            ApiError(AppError::RateLimited(format!(
                "{count} of {limit} requests in the current window"
            )))
            .into_response()
        }
        e => {
            error!(error = %e, "Failed to process upload batch");
            ApiError::internal()
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/upload` - Store one or more files under the tenant's quota.
async fn upload(
    State(state): State<AppState>,
    auth: AuthTenant,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let started = Instant::now();

    let form = match collect_form(&mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    if form.files.is_empty() {
        return ApiError::validation("No files uploaded");
    }

    let options = UploadOptions {
        folder: form.folder,
        visibility: Visibility::from_private_flag(form.private),
        provided_name: form.provided_name,
        expire_delete_secs: form.expire_delete_secs,
        token_ttl_secs: form.token_ttl_secs,
        collision: collision_policy(&query),
        origin: auth.origin,
    };

    match state
        .uploads
        .handle_upload(&auth.tenant, form.files, options)
        .await
    {
        Ok(report) => {
            info!(
                tenant_id = %auth.tenant.id,
                uploaded = report.uploaded(),
                failed = report.failed(),
                "Upload batch processed"
            );
            let response = UploadResponse {
                success: true,
                uploaded: report.uploaded(),
                files: report.outcomes.into_iter().map(entry_for).collect(),
                took_ms: elapsed_ms(started),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => upload_error_response(&e),
    }
}
