//! Plan catalog storage.

use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use uuid::Uuid;

use vaulta_core::plan::{Plan, PlanError, PlanOverride, PlanRepository};

use crate::entities::{plan_overrides, plans};

/// `SeaORM`-backed plan store.
#[derive(Debug, Clone)]
pub struct PgPlanRepository {
    db: DatabaseConnection,
}

impl PgPlanRepository {
    /// Creates a new plan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl PlanRepository for PgPlanRepository {
    async fn load_all(&self) -> Result<Vec<Plan>, PlanError> {
        let rows = plans::Entity::find()
            .all(&self.db)
            .await
            .map_err(store_err)?;

        Ok(rows.into_iter().map(into_plan).collect())
    }

    async fn find_override(&self, tenant_id: Uuid) -> Result<Option<PlanOverride>, PlanError> {
        let row = plan_overrides::Entity::find_by_id(tenant_id)
            .one(&self.db)
            .await
            .map_err(store_err)?;

        Ok(row.map(into_override))
    }
}

fn into_plan(model: plans::Model) -> Plan {
    Plan {
        name: model.name,
        price_label: model.price_label,
        storage_limit_bytes: model.storage_limit_bytes,
        max_file_size_bytes: model.max_file_size_bytes,
        max_requests_per_day: model.max_requests_per_day,
        max_reference_ttl_secs: model.max_reference_ttl_secs,
        is_custom: model.is_custom,
    }
}

fn into_override(model: plan_overrides::Model) -> PlanOverride {
    PlanOverride {
        tenant_id: model.tenant_id,
        price_label: model.price_label,
        storage_limit_bytes: model.storage_limit_bytes,
        max_file_size_bytes: model.max_file_size_bytes,
        max_requests_per_day: model.max_requests_per_day,
        max_reference_ttl_secs: model.max_reference_ttl_secs,
    }
}

fn store_err(err: DbErr) -> PlanError {
    PlanError::repository(err.to_string())
}
