//! Atomic quota ledger over per-tenant usage counters.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::plan::EffectiveLimits;
use crate::tenant::Tenant;

use super::error::QuotaError;
use super::types::{ChargeOutcome, CountOutcome, RequestOrigin};

/// Storage access for usage counters.
///
/// `try_charge` and `count_request` must be atomic with respect to
/// concurrent callers: two charges that each fit but together overflow
/// must not both be accepted.
pub trait QuotaRepository: Send + Sync {
    /// Add `bytes` to usage only when the result stays within `limit`.
    fn try_charge(
        &self,
        tenant_id: Uuid,
        bytes: i64,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<ChargeOutcome, QuotaError>> + Send;

    /// Unconditionally adjust usage by `delta`, floored at zero.
    /// Returns the usage after the adjustment.
    fn apply_delta(
        &self,
        tenant_id: Uuid,
        delta: i64,
    ) -> impl std::future::Future<Output = Result<i64, QuotaError>> + Send;

    /// Current usage in bytes.
    fn storage_used(
        &self,
        tenant_id: Uuid,
    ) -> impl std::future::Future<Output = Result<i64, QuotaError>> + Send;

    /// Advance the rolling request window: reset it when stale, judge
    /// the current count against `limit`, and increment only when
    /// `record` is set and the request was accepted.
    fn count_request(
        &self,
        tenant_id: Uuid,
        limit: Option<i64>,
        record: bool,
    ) -> impl std::future::Future<Output = Result<CountOutcome, QuotaError>> + Send;
}

/// Quota enforcement over a [`QuotaRepository`].
///
/// A successful [`reserve_storage`](Self::reserve_storage) already
/// charged the bytes; per-file failures downstream return their share
/// with a negative [`commit_storage`](Self::commit_storage).
pub struct QuotaLedger<R> {
    repo: Arc<R>,
}

impl<R> Clone for QuotaLedger<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: QuotaRepository> QuotaLedger<R> {
    /// Create a new quota ledger.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Atomically charge `additional_bytes` against the tenant's cap.
    ///
    /// Plans without a cap charge unconditionally. Returns the usage
    /// after the charge.
    pub async fn reserve_storage(
        &self,
        tenant_id: Uuid,
        additional_bytes: i64,
        limits: &EffectiveLimits,
    ) -> Result<i64, QuotaError> {
        let Some(limit) = limits.storage_limit_bytes else {
            return self.repo.apply_delta(tenant_id, additional_bytes).await;
        };

        let outcome = self
            .repo
            .try_charge(tenant_id, additional_bytes, limit)
            .await?;
        if outcome.accepted {
            debug!(
                tenant_id = %tenant_id,
                used_bytes = outcome.used_bytes,
                "storage reserved"
            );
            return Ok(outcome.used_bytes);
        }
        Err(QuotaError::StorageExceeded {
            used_bytes: outcome.used_bytes,
            requested_bytes: additional_bytes,
            limit_bytes: limit,
        })
    }

    /// Apply a signed usage delta. The store floors the result at zero
    /// so repeated releases cannot drive usage negative.
    pub async fn commit_storage(
        &self,
        tenant_id: Uuid,
        delta_bytes: i64,
    ) -> Result<i64, QuotaError> {
        self.repo.apply_delta(tenant_id, delta_bytes).await
    }

    /// Current usage in bytes.
    pub async fn storage_used(&self, tenant_id: Uuid) -> Result<i64, QuotaError> {
        self.repo.storage_used(tenant_id).await
    }

    /// Judge a request against the tenant's rolling window and record
    /// it when appropriate.
    ///
    /// Internal tenants bypass accounting entirely. Trusted origins are
    /// judged but never counted, so platform traffic cannot spend a
    /// tenant's allowance.
    pub async fn check_and_count_request(
        &self,
        tenant: &Tenant,
        origin: RequestOrigin,
        limits: &EffectiveLimits,
    ) -> Result<(), QuotaError> {
        if tenant.is_internal {
            return Ok(());
        }

        let record = origin == RequestOrigin::External;
        let outcome = self
            .repo
            .count_request(tenant.id, limits.max_requests_per_day, record)
            .await?;
        if outcome.accepted {
            return Ok(());
        }
        Err(QuotaError::RequestsExhausted {
            count: outcome.count,
            limit: limits.max_requests_per_day.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeQuotaRepo {
        used: Mutex<HashMap<Uuid, i64>>,
        counters: Mutex<HashMap<Uuid, (i64, DateTime<Utc>)>>,
    }

    impl QuotaRepository for FakeQuotaRepo {
        async fn try_charge(
            &self,
            tenant_id: Uuid,
            bytes: i64,
            limit: i64,
        ) -> Result<ChargeOutcome, QuotaError> {
            let mut used = self.used.lock().unwrap();
            let current = used.entry(tenant_id).or_insert(0);
            if *current + bytes <= limit {
                *current += bytes;
                Ok(ChargeOutcome {
                    accepted: true,
                    used_bytes: *current,
                })
            } else {
                Ok(ChargeOutcome {
                    accepted: false,
                    used_bytes: *current,
                })
            }
        }

        async fn apply_delta(&self, tenant_id: Uuid, delta: i64) -> Result<i64, QuotaError> {
            let mut used = self.used.lock().unwrap();
            let current = used.entry(tenant_id).or_insert(0);
            *current = (*current + delta).max(0);
            Ok(*current)
        }

        async fn storage_used(&self, tenant_id: Uuid) -> Result<i64, QuotaError> {
            Ok(self.used.lock().unwrap().get(&tenant_id).copied().unwrap_or(0))
        }

        async fn count_request(
            &self,
            tenant_id: Uuid,
            limit: Option<i64>,
            record: bool,
        ) -> Result<CountOutcome, QuotaError> {
            let mut counters = self.counters.lock().unwrap();
            let now = Utc::now();
            let entry = counters.entry(tenant_id).or_insert((0, now));
            if now - entry.1 >= Duration::hours(24) {
                *entry = (0, now);
            }
            if limit.is_some_and(|limit| entry.0 >= limit) {
                return Ok(CountOutcome {
                    accepted: false,
                    count: entry.0,
                });
            }
            if record {
                entry.0 += 1;
            }
            Ok(CountOutcome {
                accepted: true,
                count: entry.0,
            })
        }
    }

    fn ledger() -> (QuotaLedger<FakeQuotaRepo>, Arc<FakeQuotaRepo>) {
        let repo = Arc::new(FakeQuotaRepo::default());
        (QuotaLedger::new(Arc::clone(&repo)), repo)
    }

    fn capped(limit_bytes: i64) -> EffectiveLimits {
        EffectiveLimits {
            plan_name: "test".to_string(),
            price_label: "Test".to_string(),
            storage_limit_bytes: Some(limit_bytes),
            max_file_size_bytes: 10_000,
            max_requests_per_day: Some(100),
            max_reference_ttl_secs: 604_800,
        }
    }

    fn with_request_limit(limit: Option<i64>) -> EffectiveLimits {
        EffectiveLimits {
            max_requests_per_day: limit,
            ..capped(1000)
        }
    }

    fn external_tenant() -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: "acme".to_string(),
            plan_name: "test".to_string(),
            storage_used_bytes: 0,
            custom_domain: None,
            is_internal: false,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_reserve_within_cap_charges_usage() {
        let (ledger, _repo) = ledger();
        let tenant_id = Uuid::new_v4();

        let used = ledger
            .reserve_storage(tenant_id, 600, &capped(1000))
            .await
            .unwrap();
        assert_eq!(used, 600);
    }

    #[tokio::test]
    async fn test_reserve_beyond_cap_rejects_without_charging() {
        let (ledger, _repo) = ledger();
        let tenant_id = Uuid::new_v4();
        let limits = capped(1000);

        ledger.reserve_storage(tenant_id, 600, &limits).await.unwrap();
        let err = ledger
            .reserve_storage(tenant_id, 500, &limits)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuotaError::StorageExceeded {
                used_bytes: 600,
                requested_bytes: 500,
                limit_bytes: 1000,
            }
        ));
        assert_eq!(ledger.storage_used(tenant_id).await.unwrap(), 600);
    }

    #[tokio::test]
    async fn test_freed_space_is_reusable() {
        let (ledger, _repo) = ledger();
        let tenant_id = Uuid::new_v4();
        let limits = capped(1000);

        ledger.reserve_storage(tenant_id, 600, &limits).await.unwrap();
        assert!(ledger.reserve_storage(tenant_id, 500, &limits).await.is_err());

        // deleting the 600-byte object frees its share
        ledger.commit_storage(tenant_id, -600).await.unwrap();
        let used = ledger
            .reserve_storage(tenant_id, 500, &limits)
            .await
            .unwrap();
        assert_eq!(used, 500);
    }

    #[tokio::test]
    async fn test_concurrent_reserves_never_overshoot_the_cap() {
        let (ledger, _repo) = ledger();
        let tenant_id = Uuid::new_v4();
        let limits = capped(1000);

        let (a, b) = tokio::join!(
            ledger.reserve_storage(tenant_id, 600, &limits),
            ledger.reserve_storage(tenant_id, 600, &limits),
        );
        assert!(a.is_ok() != b.is_ok());
        assert_eq!(ledger.storage_used(tenant_id).await.unwrap(), 600);
    }

    #[tokio::test]
    async fn test_concurrent_reserves_that_both_fit_both_succeed() {
        let (ledger, _repo) = ledger();
        let tenant_id = Uuid::new_v4();
        let limits = capped(1000);

        let (a, b) = tokio::join!(
            ledger.reserve_storage(tenant_id, 400, &limits),
            ledger.reserve_storage(tenant_id, 500, &limits),
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(ledger.storage_used(tenant_id).await.unwrap(), 900);
    }

    #[tokio::test]
    async fn test_unlimited_storage_always_charges() {
        let (ledger, _repo) = ledger();
        let tenant_id = Uuid::new_v4();
        let limits = EffectiveLimits {
            storage_limit_bytes: None,
            ..capped(0)
        };

        let used = ledger
            .reserve_storage(tenant_id, 5_000_000_000_000, &limits)
            .await
            .unwrap();
        assert_eq!(used, 5_000_000_000_000);
    }

    #[tokio::test]
    async fn test_commit_floors_usage_at_zero() {
        let (ledger, _repo) = ledger();
        let tenant_id = Uuid::new_v4();

        ledger.commit_storage(tenant_id, 100).await.unwrap();
        let used = ledger.commit_storage(tenant_id, -250).await.unwrap();
        assert_eq!(used, 0);
    }

    #[tokio::test]
    async fn test_request_window_rejects_when_spent() {
        let (ledger, _repo) = ledger();
        let limits = with_request_limit(Some(2));
        let tenant = external_tenant();

        ledger
            .check_and_count_request(&tenant, RequestOrigin::External, &limits)
            .await
            .unwrap();
        ledger
            .check_and_count_request(&tenant, RequestOrigin::External, &limits)
            .await
            .unwrap();
        let err = ledger
            .check_and_count_request(&tenant, RequestOrigin::External, &limits)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QuotaError::RequestsExhausted { count: 2, limit: 2 }
        ));
    }

    #[tokio::test]
    async fn test_stale_window_resets_before_judging() {
        let (ledger, repo) = ledger();
        let limits = with_request_limit(Some(2));
        let tenant = external_tenant();

        // the allowance was spent over a day ago
        repo.counters
            .lock()
            .unwrap()
            .insert(tenant.id, (2, Utc::now() - Duration::hours(25)));

        ledger
            .check_and_count_request(&tenant, RequestOrigin::External, &limits)
            .await
            .unwrap();
        assert_eq!(repo.counters.lock().unwrap()[&tenant.id].0, 1);
    }

    #[tokio::test]
    async fn test_internal_tenant_bypasses_request_accounting() {
        let (ledger, repo) = ledger();
        let limits = with_request_limit(Some(1));
        let tenant = Tenant {
            is_internal: true,
            ..external_tenant()
        };
        repo.counters
            .lock()
            .unwrap()
            .insert(tenant.id, (5, Utc::now()));

        ledger
            .check_and_count_request(&tenant, RequestOrigin::External, &limits)
            .await
            .unwrap();
        assert_eq!(repo.counters.lock().unwrap()[&tenant.id].0, 5);
    }

    #[tokio::test]
    async fn test_trusted_origin_is_judged_but_not_counted() {
        let (ledger, repo) = ledger();
        let limits = with_request_limit(Some(2));
        let tenant = external_tenant();
        repo.counters
            .lock()
            .unwrap()
            .insert(tenant.id, (1, Utc::now()));

        ledger
            .check_and_count_request(&tenant, RequestOrigin::Trusted, &limits)
            .await
            .unwrap();
        assert_eq!(repo.counters.lock().unwrap()[&tenant.id].0, 1);

        repo.counters
            .lock()
            .unwrap()
            .insert(tenant.id, (2, Utc::now()));
        let err = ledger
            .check_and_count_request(&tenant, RequestOrigin::Trusted, &limits)
            .await
            .unwrap_err();
        assert!(matches!(err, QuotaError::RequestsExhausted { .. }));
    }

    #[tokio::test]
    async fn test_unlimited_requests_always_pass() {
        let (ledger, repo) = ledger();
        let limits = with_request_limit(None);
        let tenant = external_tenant();

        for _ in 0..5 {
            ledger
                .check_and_count_request(&tenant, RequestOrigin::External, &limits)
                .await
                .unwrap();
        }
        assert_eq!(repo.counters.lock().unwrap()[&tenant.id].0, 5);
    }
}
