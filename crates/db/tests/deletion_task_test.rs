//! Integration tests for the deletion queue upsert semantics.
//!
//! These tests need a migrated Postgres; they skip silently when
//! `DATABASE_URL` is unset so the suite stays green without one.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use vaulta_core::deletion::{DeletionQueueRepository, DeletionTask, NewDeletionTask};
use vaulta_core::file::Visibility;
use vaulta_db::PgDeletionQueueRepository;
use vaulta_db::entities::tenants;

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

async fn cleanup_tenant(db: &DatabaseConnection, tenant_id: Uuid) {
    tenants::Entity::delete_by_id(tenant_id).exec(db).await.ok();
}

fn purge_task(tenant_id: Uuid, key: &str, remote: &str) -> NewDeletionTask {
    NewDeletionTask {
        tenant_id,
        bucket_id: "bucket-1".to_string(),
        object_key: key.to_string(),
        folder_path: "docs".to_string(),
        visibility: Visibility::Public,
        remote_object_id: Some(remote.to_string()),
        expire_at: None,
    }
}

/// The queue is shared across tenants; tests only judge their own rows.
async fn due_for(repo: &PgDeletionQueueRepository, tenant_id: Uuid) -> Vec<DeletionTask> {
    repo.due(Utc::now(), 500)
        .await
        .unwrap()
        .into_iter()
        .filter(|task| task.tenant_id == tenant_id)
        .collect()
}

#[tokio::test]
async fn test_enqueue_replaces_the_task_for_the_same_key() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let repo = PgDeletionQueueRepository::new(db.clone());
    let key = format!("{tenant_id}/docs/replaced.png");

    repo.enqueue(purge_task(tenant_id, &key, "v1")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    repo.enqueue(purge_task(tenant_id, &key, "v2")).await.unwrap();

    let tasks = due_for(&repo, tenant_id).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].remote_object_id.as_deref(), Some("v2"));

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_deferred_tasks_wait_for_their_expire_at() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let repo = PgDeletionQueueRepository::new(db.clone());

    repo.enqueue(purge_task(tenant_id, "key-now", "v1"))
        .await
        .unwrap();
    repo.enqueue(NewDeletionTask {
        expire_at: Some(Utc::now() + Duration::hours(1)),
        ..purge_task(tenant_id, "key-deferred", "v2")
    })
    .await
    .unwrap();

    let tasks = due_for(&repo, tenant_id).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].object_key, "key-now");

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_sweep_order_is_oldest_first() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let repo = PgDeletionQueueRepository::new(db.clone());

    repo.enqueue(purge_task(tenant_id, "key-first", "v1"))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    repo.enqueue(purge_task(tenant_id, "key-second", "v2"))
        .await
        .unwrap();

    let tasks = due_for(&repo, tenant_id).await;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].object_key, "key-first");
    assert_eq!(tasks[1].object_key, "key-second");

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_remove_drops_the_task() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let repo = PgDeletionQueueRepository::new(db.clone());

    repo.enqueue(purge_task(tenant_id, "key-done", "v1"))
        .await
        .unwrap();
    let tasks = due_for(&repo, tenant_id).await;
    assert_eq!(tasks.len(), 1);

    repo.remove(tasks[0].id).await.unwrap();
    assert!(due_for(&repo, tenant_id).await.is_empty());

    cleanup_tenant(&db, tenant_id).await;
}
