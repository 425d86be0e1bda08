//! Tenant lookup for API-key authentication.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use vaulta_core::tenant::Tenant;

use crate::entities::{api_keys, tenants};

/// Resolves tenants from their API keys.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    db: DatabaseConnection,
}

impl TenantRepository {
    /// Creates a new tenant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the tenant owning an active API key.
    ///
    /// Revoked keys and unknown keys both resolve to `None`; the caller
    /// treats either as an authentication failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_api_key(&self, key: &str) -> Result<Option<Tenant>, DbErr> {
        let row = api_keys::Entity::find()
            .filter(api_keys::Column::Key.eq(key))
            .filter(api_keys::Column::Active.eq(true))
            .find_also_related(tenants::Entity)
            .one(&self.db)
            .await?;

        Ok(row.and_then(|(_, tenant)| tenant).map(into_tenant))
    }
}

fn into_tenant(model: tenants::Model) -> Tenant {
    Tenant {
        id: model.id,
        name: model.name,
        plan_name: model.plan_name,
        storage_used_bytes: model.storage_used_bytes,
        custom_domain: model.custom_domain,
        is_internal: model.is_internal,
        is_active: model.is_active,
    }
}
