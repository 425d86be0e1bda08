//! File listing, deletion, and download-reference endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use vaulta_core::file::{FileIdentity, FileObject, FileQuery, FileRepository, Visibility};
use vaulta_core::placement::{sanitize_file_name, sanitize_folder};
use vaulta_core::reference::ReferenceError;
use vaulta_shared::types::{PageRequest, PageResponse};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::auth::AuthTenant;

/// Creates file management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(list_files).delete(delete_file))
        .route("/files/reference", get(file_reference))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing files.
#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    /// Substring filter on the stored filename.
    pub q: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// One file in a listing response.
#[derive(Debug, Serialize)]
pub struct FileSummary {
    /// File id.
    pub id: Uuid,
    /// Stored filename.
    pub filename: String,
    /// Folder path relative to the tenant root.
    pub path: String,
    /// Size in bytes.
    pub size: i64,
    /// Whether the file is private.
    pub private: bool,
    /// MIME type.
    pub content_type: String,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
    /// Scheduled removal time, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_delete_at: Option<DateTime<Utc>>,
    /// Stable download URL, public files only. Private files get their
    /// tokened URL from the reference endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Request body for deleting a file.
#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    /// Folder path the file lives under.
    #[serde(default)]
    pub path: String,
    /// Stored filename.
    pub filename: String,
    /// Whether the file is private.
    #[serde(default)]
    pub private: bool,
}

/// Query parameters for requesting a download reference.
#[derive(Debug, Deserialize)]
pub struct ReferenceQuery {
    /// Folder path the file lives under.
    #[serde(default)]
    pub path: String,
    /// Stored filename.
    pub filename: String,
    /// Whether the file is private.
    #[serde(default)]
    pub private: bool,
    /// Requested token lifetime in seconds, private files only.
    pub expire_token_seconds: Option<i64>,
}

/// Response body for a download reference.
#[derive(Debug, Serialize)]
pub struct ReferenceResponse {
    /// Download URL, tokened for private files.
    pub url: String,
    /// Whether the file is private.
    pub private: bool,
    /// Granted token lifetime in seconds, private files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Token expiry timestamp, private files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Rebuilds the stored identity a client-supplied path and name map to.
///
/// The same sanitizer runs at upload time, so a lookup for exactly what
/// the client sent lands on the row the upload created.
fn identity_for(tenant_id: Uuid, path: &str, filename: &str, private: bool) -> FileIdentity {
    FileIdentity {
        tenant_id,
        folder_path: sanitize_folder(path),
        file_name: sanitize_file_name(filename),
        visibility: Visibility::from_private_flag(private),
    }
}

fn summarize(state: &AppState, file: FileObject, custom_domain: Option<&str>) -> FileSummary {
    let url = (file.visibility == Visibility::Public)
        .then(|| state.references.public_url(&file.object_key, custom_domain));
    FileSummary {
        id: file.id,
        filename: file.file_name,
        path: file.folder_path,
        size: file.size_bytes,
        private: file.visibility.is_private(),
        content_type: file.content_type,
        created_at: file.created_at,
        scheduled_delete_at: file.scheduled_delete_at,
        url,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/files` - List the tenant's files, newest first.
async fn list_files(
    State(state): State<AppState>,
    auth: AuthTenant,
    Query(query): Query<ListFilesQuery>,
) -> impl IntoResponse {
    let request = PageRequest {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(20),
    };
    let filter = FileQuery {
        name_contains: query.q.filter(|q| !q.is_empty()),
        offset: request.offset(),
        limit: request.limit(),
    };

    match state.files.list(auth.tenant.id, &filter).await {
        Ok((files, total)) => {
            let custom_domain = auth.tenant.custom_domain.as_deref();
            let data: Vec<FileSummary> = files
                .into_iter()
                .map(|file| summarize(&state, file, custom_domain))
                .collect();
            (
                StatusCode::OK,
                Json(PageResponse::new(data, &request, total)),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list files");
            ApiError::internal()
        }
    }
}

/// DELETE `/files` - Queue a file for deletion and release its storage.
async fn delete_file(
    State(state): State<AppState>,
    auth: AuthTenant,
    Json(payload): Json<DeleteFileRequest>,
) -> impl IntoResponse {
    let identity = identity_for(auth.tenant.id, &payload.path, &payload.filename, payload.private);

    let file = match state.files.find_active(&identity).await {
        Ok(Some(file)) => file,
        Ok(None) => return ApiError::not_found("No such file"),
        Err(e) => {
            error!(error = %e, "Failed to look up file");
            return ApiError::internal();
        }
    };

    match state.deletions.retire_file(&file, None).await {
        Ok(true) => {
            info!(
                tenant_id = %auth.tenant.id,
                object_key = %file.object_key,
                "File queued for deletion"
            );
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "File queued for deletion"
                })),
            )
                .into_response()
        }
        // The row vanished between lookup and retire; someone else
        // deleted it first.
        Ok(false) => ApiError::not_found("No such file"),
        Err(e) => {
            error!(error = %e, "Failed to queue file deletion");
            ApiError::internal()
        }
    }
}

/// GET `/files/reference` - Issue or refresh a download locator.
async fn file_reference(
    State(state): State<AppState>,
    auth: AuthTenant,
    Query(query): Query<ReferenceQuery>,
) -> impl IntoResponse {
    let identity = identity_for(auth.tenant.id, &query.path, &query.filename, query.private);

    let file = match state.files.find_active(&identity).await {
        Ok(Some(file)) => file,
        Ok(None) => return ApiError::not_found("No such file"),
        Err(e) => {
            error!(error = %e, "Failed to look up file");
            return ApiError::internal();
        }
    };

    let limits = state.plans.effective_limits(&auth.tenant).await;
    match state
        .references
        .locator_for(
            &file,
            auth.tenant.custom_domain.as_deref(),
            query.expire_token_seconds,
            &limits,
        )
        .await
    {
        Ok(locator) => (
            StatusCode::OK,
            Json(ReferenceResponse {
                url: locator.url,
                private: file.visibility.is_private(),
                expires_in: locator.granted_ttl_secs,
                expires_at: locator.expires_at,
            }),
        )
            .into_response(),
        Err(ReferenceError::Remote(e)) => {
            error!(error = %e, "Backend refused the download authorization");
            ApiError::backend_unavailable("The storage backend is unavailable, try again")
        }
        Err(e) => {
            error!(error = %e, "Failed to issue download reference");
            ApiError::internal()
        }
    }
}
