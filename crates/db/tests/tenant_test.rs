//! Integration tests for API-key tenant resolution.
//!
//! These tests need a migrated Postgres; they skip silently when
//! `DATABASE_URL` is unset so the suite stays green without one.

use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use vaulta_db::TenantRepository;
use vaulta_db::entities::{api_keys, tenants};

async fn test_db() -> Option<DatabaseConnection> {
    let url = std::env::var("DATABASE_URL").ok()?;
    Some(Database::connect(&url).await.expect("Failed to connect"))
}

async fn create_tenant(db: &DatabaseConnection) -> Uuid {
    let tenant_id = Uuid::new_v4();
    let tenant = tenants::ActiveModel {
        id: Set(tenant_id),
        name: Set(format!("Test Tenant {tenant_id}")),
        ..Default::default()
    };
    tenant.insert(db).await.expect("Failed to create tenant");
    tenant_id
}

async fn create_api_key(db: &DatabaseConnection, tenant_id: Uuid, key: &str, active: bool) {
    let row = api_keys::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant_id),
        key: Set(key.to_string()),
        active: Set(active),
        ..Default::default()
    };
    row.insert(db).await.expect("Failed to create api key");
}

async fn cleanup_tenant(db: &DatabaseConnection, tenant_id: Uuid) {
    tenants::Entity::delete_by_id(tenant_id).exec(db).await.ok();
}

#[tokio::test]
async fn test_find_by_api_key_resolves_the_tenant() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let key = format!("key-{}", Uuid::new_v4());
    create_api_key(&db, tenant_id, &key, true).await;

    let repo = TenantRepository::new(db.clone());
    let tenant = repo
        .find_by_api_key(&key)
        .await
        .expect("lookup failed")
        .expect("tenant not resolved");

    assert_eq!(tenant.id, tenant_id);
    assert_eq!(tenant.plan_name, "free");
    assert_eq!(tenant.storage_used_bytes, 0);
    assert!(tenant.is_active);
    assert!(!tenant.is_internal);

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_revoked_key_resolves_nothing() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let key = format!("key-{}", Uuid::new_v4());
    create_api_key(&db, tenant_id, &key, false).await;

    let repo = TenantRepository::new(db.clone());
    let tenant = repo.find_by_api_key(&key).await.expect("lookup failed");

    assert!(tenant.is_none());

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_unknown_key_resolves_nothing() {
    let Some(db) = test_db().await else { return };

    let repo = TenantRepository::new(db.clone());
    let tenant = repo
        .find_by_api_key("no-such-key")
        .await
        .expect("lookup failed");

    assert!(tenant.is_none());
}
