//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - API-key authentication middleware
//! - Request extractors
//! - Response types

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use vaulta_core::deletion::DeletionReconciler;
use vaulta_core::plan::PlanCatalog;
use vaulta_core::quota::QuotaLedger;
use vaulta_core::reference::ReferenceIssuer;
use vaulta_core::remote::HttpRemoteStore;
use vaulta_core::upload::UploadService;
use vaulta_db::{
    PgDeletionQueueRepository, PgFileRepository, PgPlanRepository, PgQuotaRepository,
    PgSignedReferenceRepository, TenantRepository,
};

/// Plan resolution over the Postgres repository.
pub type PlanService = PlanCatalog<PgPlanRepository>;

/// Storage and request-window accounting over the Postgres repository.
pub type QuotaService = QuotaLedger<PgQuotaRepository>;

/// Locator issuance over Postgres and the HTTP remote store.
pub type ReferenceService = ReferenceIssuer<PgSignedReferenceRepository, HttpRemoteStore>;

/// Deferred deletion over Postgres and the HTTP remote store.
pub type DeletionService = DeletionReconciler<
    PgDeletionQueueRepository,
    PgFileRepository,
    PgQuotaRepository,
    HttpRemoteStore,
>;

/// The full upload pipeline over the Postgres repositories.
pub type UploadPipeline = UploadService<
    PgDeletionQueueRepository,
    PgFileRepository,
    PgPlanRepository,
    PgQuotaRepository,
    PgSignedReferenceRepository,
    HttpRemoteStore,
>;

/// Application state shared across handlers.
///
/// Services are built once at boot. The plan cache and the remote
/// session cache live inside them and survive across requests.
#[derive(Clone)]
pub struct AppState {
    /// API-key to tenant resolution.
    pub tenants: TenantRepository,
    /// File metadata lookups and listings.
    pub files: Arc<PgFileRepository>,
    /// Cached plan resolution.
    pub plans: PlanService,
    /// Storage and request-window accounting.
    pub quota: QuotaService,
    /// Download locator issuance.
    pub references: ReferenceService,
    /// Deferred deletion pipeline.
    pub deletions: DeletionService,
    /// Upload orchestration.
    pub uploads: UploadPipeline,
    /// Origins whose calls are checked against the request window but
    /// not counted into it.
    pub trusted_origins: Arc<Vec<String>>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
