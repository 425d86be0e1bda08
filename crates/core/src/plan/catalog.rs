//! Cached plan catalog with per-tenant override resolution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::{error, warn};
use uuid::Uuid;

use crate::tenant::Tenant;

use super::error::PlanError;
use super::types::{EffectiveLimits, FREE_PLAN, Plan, PlanOverride};

/// Storage access for plans and their per-tenant overrides.
pub trait PlanRepository: Send + Sync {
    /// Load every plan in the catalog.
    fn load_all(&self) -> impl std::future::Future<Output = Result<Vec<Plan>, PlanError>> + Send;

    /// Fetch the override row for a tenant, if one exists.
    fn find_override(
        &self,
        tenant_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<PlanOverride>, PlanError>> + Send;
}

/// Read-through cache over the plan table.
///
/// The full table is loaded at once and held until the TTL elapses or
/// [`force_refresh`](Self::force_refresh) replaces it. Overrides are
/// fetched per resolution so a billing change takes effect on the next
/// request, not the next cache cycle. Resolution never fails: an
/// unreadable store degrades to the built-in free plan.
pub struct PlanCatalog<R> {
    repo: Arc<R>,
    cache: Cache<(), Arc<HashMap<String, Plan>>>,
}

impl<R> Clone for PlanCatalog<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            cache: self.cache.clone(),
        }
    }
}

impl<R: PlanRepository> PlanCatalog<R> {
    /// Create a catalog whose cached table expires after `ttl`.
    #[must_use]
    pub fn new(repo: Arc<R>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { repo, cache }
    }

    /// Resolve the limits a tenant's requests are judged against.
    ///
    /// Unknown plan names fall back to `free` with a warning. Store
    /// failures are logged and answered with built-in defaults; the
    /// failure is not cached, so the next call retries the store.
    pub async fn effective_limits(&self, tenant: &Tenant) -> EffectiveLimits {
        let table = self.table().await;
        let plan = match table.get(&tenant.plan_name) {
            Some(plan) => plan.clone(),
            None => {
                warn!(
                    tenant_id = %tenant.id,
                    plan = %tenant.plan_name,
                    "unknown plan name, falling back to free"
                );
                table
                    .get(FREE_PLAN)
                    .cloned()
                    .unwrap_or_else(Plan::default_free)
            }
        };

        let overrides = match self.repo.find_override(tenant.id).await {
            Ok(overrides) => overrides,
            Err(err) => {
                warn!(
                    tenant_id = %tenant.id,
                    error = %err,
                    "override lookup failed, serving base plan"
                );
                None
            }
        };

        match overrides {
            Some(ovr) => EffectiveLimits::merged(&plan, &ovr),
            None => EffectiveLimits::from_plan(&plan),
        }
    }

    /// Drop the cached table and load a fresh one immediately.
    pub async fn force_refresh(&self) -> Result<(), PlanError> {
        let table = self.load_table().await?;
        self.cache.insert((), table);
        Ok(())
    }

    async fn table(&self) -> Arc<HashMap<String, Plan>> {
        if let Some(table) = self.cache.get(&()) {
            return table;
        }
        match self.load_table().await {
            Ok(table) => {
                self.cache.insert((), Arc::clone(&table));
                table
            }
            Err(err) => {
                error!(error = %err, "plan catalog load failed, serving built-in defaults");
                let mut fallback = HashMap::new();
                fallback.insert(FREE_PLAN.to_string(), Plan::default_free());
                Arc::new(fallback)
            }
        }
    }

    async fn load_table(&self) -> Result<Arc<HashMap<String, Plan>>, PlanError> {
        let plans = self.repo.load_all().await?;
        let mut table: HashMap<String, Plan> = plans
            .into_iter()
            .map(|plan| (plan.name.clone(), plan))
            .collect();
        table
            .entry(FREE_PLAN.to_string())
            .or_insert_with(Plan::default_free);
        Ok(Arc::new(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakePlanRepo {
        plans: Mutex<Vec<Plan>>,
        overrides: Mutex<HashMap<Uuid, PlanOverride>>,
        loads: AtomicUsize,
        fail: AtomicBool,
    }

    impl FakePlanRepo {
        fn new(plans: Vec<Plan>) -> Self {
            Self {
                plans: Mutex::new(plans),
                overrides: Mutex::new(HashMap::new()),
                loads: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn load_count(&self) -> usize {
            self.loads.load(Ordering::SeqCst)
        }
    }

    impl PlanRepository for FakePlanRepo {
        async fn load_all(&self) -> Result<Vec<Plan>, PlanError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(PlanError::repository("store offline"));
            }
            Ok(self.plans.lock().unwrap().clone())
        }

        async fn find_override(
            &self,
            tenant_id: Uuid,
        ) -> Result<Option<PlanOverride>, PlanError> {
            Ok(self.overrides.lock().unwrap().get(&tenant_id).cloned())
        }
    }

    fn paid_plan() -> Plan {
        Plan {
            name: "paid".to_string(),
            price_label: "Monthly".to_string(),
            storage_limit_bytes: Some(100 * 1024 * 1024 * 1024),
            max_file_size_bytes: 50 * 1024 * 1024,
            max_requests_per_day: Some(100_000),
            max_reference_ttl_secs: 604_800,
            is_custom: false,
        }
    }

    fn tenant_on(plan: &str) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: "acme".to_string(),
            plan_name: plan.to_string(),
            storage_used_bytes: 0,
            custom_domain: None,
            is_internal: false,
            is_active: true,
        }
    }

    fn catalog(repo: Arc<FakePlanRepo>) -> PlanCatalog<FakePlanRepo> {
        PlanCatalog::new(repo, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_known_plan_resolves_directly() {
        let repo = Arc::new(FakePlanRepo::new(vec![Plan::default_free(), paid_plan()]));
        let catalog = catalog(Arc::clone(&repo));

        let limits = catalog.effective_limits(&tenant_on("paid")).await;
        assert_eq!(limits.plan_name, "paid");
        assert_eq!(limits.max_file_size_bytes, 50 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_unknown_plan_falls_back_to_free() {
        let repo = Arc::new(FakePlanRepo::new(vec![Plan::default_free(), paid_plan()]));
        let catalog = catalog(Arc::clone(&repo));

        let limits = catalog.effective_limits(&tenant_on("enterprise-gold")).await;
        assert_eq!(limits.plan_name, FREE_PLAN);
        assert_eq!(limits.max_requests_per_day, Some(500));
    }

    #[tokio::test]
    async fn test_override_merges_onto_base_plan() {
        let repo = Arc::new(FakePlanRepo::new(vec![Plan::default_free(), paid_plan()]));
        let tenant = tenant_on("paid");
        repo.overrides.lock().unwrap().insert(
            tenant.id,
            PlanOverride {
                tenant_id: tenant.id,
                price_label: None,
                storage_limit_bytes: Some(500 * 1024 * 1024 * 1024),
                max_file_size_bytes: None,
                max_requests_per_day: None,
                max_reference_ttl_secs: Some(3600),
            },
        );
        let catalog = catalog(Arc::clone(&repo));

        let limits = catalog.effective_limits(&tenant).await;
        assert_eq!(limits.storage_limit_bytes, Some(500 * 1024 * 1024 * 1024));
        assert_eq!(limits.max_reference_ttl_secs, 3600);
        // inherited from the base plan
        assert_eq!(limits.max_file_size_bytes, 50 * 1024 * 1024);
        assert_eq!(limits.max_requests_per_day, Some(100_000));
    }

    #[tokio::test]
    async fn test_table_is_loaded_once_within_ttl() {
        let repo = Arc::new(FakePlanRepo::new(vec![Plan::default_free()]));
        let catalog = catalog(Arc::clone(&repo));

        let tenant = tenant_on(FREE_PLAN);
        catalog.effective_limits(&tenant).await;
        catalog.effective_limits(&tenant).await;
        catalog.effective_limits(&tenant).await;
        assert_eq!(repo.load_count(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_reloads_immediately() {
        let repo = Arc::new(FakePlanRepo::new(vec![Plan::default_free()]));
        let catalog = catalog(Arc::clone(&repo));

        let tenant = tenant_on("paid");
        let limits = catalog.effective_limits(&tenant).await;
        assert_eq!(limits.plan_name, FREE_PLAN);

        repo.plans.lock().unwrap().push(paid_plan());
        catalog.force_refresh().await.unwrap();

        let limits = catalog.effective_limits(&tenant).await;
        assert_eq!(limits.plan_name, "paid");
        assert_eq!(repo.load_count(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_serves_defaults_and_is_not_cached() {
        let repo = Arc::new(FakePlanRepo::new(vec![Plan::default_free(), paid_plan()]));
        repo.fail.store(true, Ordering::SeqCst);
        let catalog = catalog(Arc::clone(&repo));

        let limits = catalog.effective_limits(&tenant_on("paid")).await;
        assert_eq!(limits.plan_name, FREE_PLAN);
        assert_eq!(limits.storage_limit_bytes, Some(5 * 1024 * 1024 * 1024));

        // Store recovers; the next resolution reloads instead of
        // serving a cached failure.
        repo.fail.store(false, Ordering::SeqCst);
        let limits = catalog.effective_limits(&tenant_on("paid")).await;
        assert_eq!(limits.plan_name, "paid");
        assert_eq!(repo.load_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_free_row_uses_builtin_defaults() {
        let repo = Arc::new(FakePlanRepo::new(vec![paid_plan()]));
        let catalog = catalog(Arc::clone(&repo));

        let limits = catalog.effective_limits(&tenant_on(FREE_PLAN)).await;
        assert_eq!(limits.plan_name, FREE_PLAN);
        assert_eq!(limits.max_file_size_bytes, 10 * 1024 * 1024);
    }
}
