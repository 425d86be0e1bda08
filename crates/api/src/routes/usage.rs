//! Tenant usage endpoint.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;
use tracing::error;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::auth::AuthTenant;

/// Creates usage routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/usage", get(usage))
}

/// Current usage and the limits the tenant's plan grants.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Resolved plan name.
    pub plan: String,
    /// Human-readable plan label.
    pub price_label: String,
    /// Bytes currently in use.
    pub storage_used_bytes: i64,
    /// Storage cap in bytes; absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_limit_bytes: Option<i64>,
    /// Largest single file accepted.
    pub max_file_size_bytes: i64,
    /// Requests allowed per rolling day; absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests_per_day: Option<i64>,
    /// Longest reference validity grantable, in seconds.
    pub max_reference_ttl_secs: i64,
}

/// GET `/usage` - Current storage usage and effective plan limits.
async fn usage(State(state): State<AppState>, auth: AuthTenant) -> impl IntoResponse {
    let storage_used_bytes = match state.quota.storage_used(auth.tenant.id).await {
        Ok(used) => used,
        Err(e) => {
            error!(error = %e, "Failed to read storage usage");
            return ApiError::internal();
        }
    };

    let limits = state.plans.effective_limits(&auth.tenant).await;
    (
        StatusCode::OK,
        Json(UsageResponse {
            plan: limits.plan_name,
            price_label: limits.price_label,
            storage_used_bytes,
            storage_limit_bytes: limits.storage_limit_bytes,
            max_file_size_bytes: limits.max_file_size_bytes,
            max_requests_per_day: limits.max_requests_per_day,
            max_reference_ttl_secs: limits.max_reference_ttl_secs,
        }),
    )
        .into_response()
}
