//! Tenant storage and request counters.
//!
//! Every mutation here is a single conditional SQL statement; the
//! database decides acceptance, not process memory. Two concurrent
//! charges can therefore never both pass a nearly-full quota.

use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use vaulta_core::quota::{
    ChargeOutcome, CountOutcome, QuotaError, QuotaRepository, REQUEST_WINDOW_SECS,
};

use crate::entities::{request_counters, tenants};

/// `SeaORM`-backed quota counter store.
#[derive(Debug, Clone)]
pub struct PgQuotaRepository {
    db: DatabaseConnection,
}

impl PgQuotaRepository {
    /// Creates a new quota repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts the counter row for a tenant if it does not exist yet.
    async fn ensure_counter(&self, tenant_id: Uuid, now: DateTime<Utc>) -> Result<(), QuotaError> {
        let row = request_counters::ActiveModel {
            tenant_id: Set(tenant_id),
            count: Set(0),
            window_started_at: Set(now.into()),
        };

        match request_counters::Entity::insert(row)
            .on_conflict(
                OnConflict::column(request_counters::Column::TenantId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
            Err(err) => Err(store_err(err)),
        }
    }

    /// Restarts the window once 24 hours have elapsed since it opened.
    async fn reset_stale_window(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), QuotaError> {
        let cutoff = now - Duration::seconds(REQUEST_WINDOW_SECS);

        request_counters::Entity::update_many()
            .col_expr(
                request_counters::Column::Count,
                Expr::value(0_i64),
            )
            .col_expr(
                request_counters::Column::WindowStartedAt,
                Expr::value(now),
            )
            .filter(request_counters::Column::TenantId.eq(tenant_id))
            .filter(request_counters::Column::WindowStartedAt.lte(cutoff))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        Ok(())
    }

    /// Current count in the tenant's window.
    async fn window_count(&self, tenant_id: Uuid) -> Result<i64, QuotaError> {
        let row = request_counters::Entity::find_by_id(tenant_id)
            .one(&self.db)
            .await
            .map_err(store_err)?;

        Ok(row.map_or(0, |counter| counter.count))
    }
}

impl QuotaRepository for PgQuotaRepository {
    async fn try_charge(
        &self,
        tenant_id: Uuid,
        bytes: i64,
        limit: i64,
    ) -> Result<ChargeOutcome, QuotaError> {
        let result = tenants::Entity::update_many()
            .col_expr(
                tenants::Column::StorageUsedBytes,
                Expr::col(tenants::Column::StorageUsedBytes).add(bytes),
            )
            .col_expr(
                tenants::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(tenants::Column::Id.eq(tenant_id))
            .filter(tenants::Column::StorageUsedBytes.lte(limit.saturating_sub(bytes)))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        let used_bytes = self.storage_used(tenant_id).await?;

        Ok(ChargeOutcome {
            accepted: result.rows_affected == 1,
            used_bytes,
        })
    }

    async fn apply_delta(&self, tenant_id: Uuid, delta: i64) -> Result<i64, QuotaError> {
        tenants::Entity::update_many()
            .col_expr(
                tenants::Column::StorageUsedBytes,
                Expr::cust_with_values(
                    "GREATEST(storage_used_bytes + ?, 0)",
                    [delta],
                ),
            )
            .col_expr(
                tenants::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(tenants::Column::Id.eq(tenant_id))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        self.storage_used(tenant_id).await
    }

    async fn storage_used(&self, tenant_id: Uuid) -> Result<i64, QuotaError> {
        let tenant = tenants::Entity::find_by_id(tenant_id)
            .one(&self.db)
            .await
            .map_err(store_err)?;

        Ok(tenant.map_or(0, |t| t.storage_used_bytes))
    }

    async fn count_request(
        &self,
        tenant_id: Uuid,
        limit: Option<i64>,
        record: bool,
    ) -> Result<CountOutcome, QuotaError> {
        let now = Utc::now();
        self.ensure_counter(tenant_id, now).await?;
        self.reset_stale_window(tenant_id, now).await?;

        if record {
            let mut update = request_counters::Entity::update_many()
                .col_expr(
                    request_counters::Column::Count,
                    Expr::col(request_counters::Column::Count).add(1_i64),
                )
                .filter(request_counters::Column::TenantId.eq(tenant_id));
            if let Some(limit) = limit {
                update = update.filter(request_counters::Column::Count.lt(limit));
            }

            let result = update.exec(&self.db).await.map_err(store_err)?;
            let count = self.window_count(tenant_id).await?;

            return Ok(CountOutcome {
                accepted: result.rows_affected == 1,
                count,
            });
        }

        let count = self.window_count(tenant_id).await?;

        Ok(CountOutcome {
            accepted: limit.is_none_or(|limit| count < limit),
            count,
        })
    }
}

fn store_err(err: DbErr) -> QuotaError {
    QuotaError::repository(err.to_string())
}
