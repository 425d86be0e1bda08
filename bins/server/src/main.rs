//! Vaulta API Server
//!
//! Main entry point for the Vaulta file-hosting backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vaulta_api::{AppState, create_router};
use vaulta_core::deletion::DeletionReconciler;
use vaulta_core::placement::ObjectPlacer;
use vaulta_core::plan::PlanCatalog;
use vaulta_core::quota::QuotaLedger;
use vaulta_core::reference::ReferenceIssuer;
use vaulta_core::remote::{Bucket, BucketMap, HttpRemoteStore, RemoteConfig};
use vaulta_core::upload::UploadService;
use vaulta_db::{
    PgDeletionQueueRepository, PgFileRepository, PgPlanRepository, PgQuotaRepository,
    PgSignedReferenceRepository, TenantRepository, connect_pool,
};
use vaulta_shared::AppConfig;

mod jobs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaulta=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    // Configure the remote object store
    let remote = &config.remote_store;
    let store = Arc::new(HttpRemoteStore::new(
        RemoteConfig::new(&remote.api_url, &remote.key_id, &remote.application_key)
            .with_session_ttl(Duration::from_secs(remote.session_ttl_secs))
            .with_timeout(Duration::from_secs(remote.timeout_secs)),
    )?);
    let buckets = BucketMap {
        public: Bucket {
            id: remote.public_bucket.id.clone(),
            name: remote.public_bucket.name.clone(),
        },
        private: Bucket {
            id: remote.private_bucket.id.clone(),
            name: remote.private_bucket.name.clone(),
        },
    };
    info!(
        public_bucket = %buckets.public.name,
        private_bucket = %buckets.private.name,
        "Remote store configured"
    );

    // Build the lifecycle services
    let lifecycle = &config.lifecycle;
    let files = Arc::new(PgFileRepository::new(db.clone()));
    let plans = PlanCatalog::new(
        Arc::new(PgPlanRepository::new(db.clone())),
        Duration::from_secs(lifecycle.plan_cache_ttl_secs),
    );
    let quota = QuotaLedger::new(Arc::new(PgQuotaRepository::new(db.clone())));
    #[allow(clippy::cast_possible_wrap)]
    let references = ReferenceIssuer::new(
        Arc::new(PgSignedReferenceRepository::new(db.clone())),
        store.clone(),
        buckets.clone(),
        remote.download_base_url.clone(),
        lifecycle.renewal_margin_secs as i64,
    );
    let deletions = DeletionReconciler::new(
        Arc::new(PgDeletionQueueRepository::new(db.clone())),
        files.clone(),
        quota.clone(),
        store.clone(),
        buckets.clone(),
        lifecycle.deletion_batch_size,
    );
    let uploads = UploadService::new(
        plans.clone(),
        quota.clone(),
        ObjectPlacer::new(files.clone(), store, buckets),
        references.clone(),
        deletions.clone(),
        files.clone(),
    )
    .with_concurrency(lifecycle.upload_concurrency);

    // Start background sweeps
    jobs::spawn(deletions.clone(), references.clone(), lifecycle);

    // Create application state
    let state = AppState {
        tenants: TenantRepository::new(db),
        files,
        plans,
        quota,
        references,
        deletions,
        uploads,
        trusted_origins: Arc::new(config.server.trusted_origins.clone()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
