//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap,
        header::{AUTHORIZATION, ORIGIN},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use tracing::error;

use vaulta_core::quota::RequestOrigin;
use vaulta_core::tenant::Tenant;

use crate::AppState;
use crate::error::ApiError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Pulls the API key from `x-api-key` or an Authorization bearer value.
fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(key);
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
}

/// Classifies the caller for request accounting.
///
/// Calls carrying `x-internal-call: true`, or whose `Origin` header
/// matches a configured trusted origin, are checked against the
/// request window but not counted into it.
fn detect_origin(headers: &HeaderMap, trusted_origins: &[String]) -> RequestOrigin {
    let internal = headers
        .get("x-internal-call")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    if internal {
        return RequestOrigin::Trusted;
    }

    match headers.get(ORIGIN).and_then(|v| v.to_str().ok()) {
        Some(origin) if trusted_origins.iter().any(|trusted| trusted == origin) => {
            RequestOrigin::Trusted
        }
        _ => RequestOrigin::External,
    }
}

/// Authentication middleware that resolves tenants from API keys.
///
/// Resolution is fail-closed: a missing key, an unknown or revoked
/// key, a suspended tenant, and a failed lookup all yield 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(key) = extract_api_key(request.headers()).map(str::to_owned) else {
        return ApiError::unauthorized(
            "x-api-key header or Authorization bearer key is required",
        );
    };

    match state.tenants.find_by_api_key(&key).await {
        Ok(Some(tenant)) if tenant.is_active => {
            let origin = detect_origin(request.headers(), &state.trusted_origins);
            request.extensions_mut().insert(origin);
            request.extensions_mut().insert(tenant);
            next.run(request).await
        }
        Ok(Some(_)) => ApiError::unauthorized("This account is suspended"),
        Ok(None) => ApiError::unauthorized("Invalid API key"),
        Err(e) => {
            error!(error = %e, "Failed to resolve API key");
            ApiError::unauthorized("Could not verify API key")
        }
    }
}

/// Extractor for the authenticated tenant.
///
/// Use this in handlers behind [`auth_middleware`]:
///
/// ```ignore
/// async fn handler(auth: AuthTenant) -> impl IntoResponse {
///     let tenant_id = auth.tenant.id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthTenant {
    /// The resolved tenant.
    pub tenant: Tenant,
    /// How the call is classified for request accounting.
    pub origin: RequestOrigin,
}

impl<S> FromRequestParts<S> for AuthTenant
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let origin = parts
            .extensions
            .get::<RequestOrigin>()
            .copied()
            .unwrap_or_default();
        parts
            .extensions
            .get::<Tenant>()
            .cloned()
            .map(|tenant| Self { tenant, origin })
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
