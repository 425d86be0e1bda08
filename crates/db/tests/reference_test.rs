//! Integration tests for signed reference storage.
//!
//! These tests need a migrated Postgres; they skip silently when
//! `DATABASE_URL` is unset so the suite stays green without one.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use vaulta_core::file::{FileObject, FileRepository, NewFileObject, Visibility};
use vaulta_core::reference::{SignedReference, SignedReferenceRepository};
use vaulta_db::entities::tenants;
use vaulta_db::{PgFileRepository, PgSignedReferenceRepository};

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

async fn create_private_file(db: &DatabaseConnection, tenant_id: Uuid, name: &str) -> FileObject {
    let repo = PgFileRepository::new(db.clone());
    repo.insert(NewFileObject {
        tenant_id,
        folder_path: "vault".to_string(),
        file_name: name.to_string(),
        original_name: name.to_string(),
        content_type: "application/pdf".to_string(),
        size_bytes: 128,
        visibility: Visibility::Private,
        object_key: format!("{tenant_id}/vault/{name}"),
        remote_object_id: format!("ver-{}", Uuid::new_v4()),
        scheduled_delete_at: None,
    })
    .await
    .expect("Failed to create file")
}

fn reference_for(file: &FileObject, token: &str, ttl_secs: i64) -> SignedReference {
    SignedReference {
        file_id: file.id,
        tenant_id: file.tenant_id,
        granted_ttl_secs: ttl_secs,
        token: token.to_string(),
        token_expires_at: Utc::now() + Duration::seconds(ttl_secs),
    }
}

#[tokio::test]
async fn test_upsert_then_find_roundtrip() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let file = create_private_file(&db, tenant_id, "statement.pdf").await;
    let repo = PgSignedReferenceRepository::new(db.clone());

    repo.upsert(reference_for(&file, "tok-1", 3600)).await.unwrap();
    let found = repo
        .find(file.id)
        .await
        .unwrap()
        .expect("reference missing");

    assert_eq!(found.file_id, file.id);
    assert_eq!(found.tenant_id, tenant_id);
    assert_eq!(found.token, "tok-1");
    assert_eq!(found.granted_ttl_secs, 3600);

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_upsert_replaces_the_previous_token() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let file = create_private_file(&db, tenant_id, "contract.pdf").await;
    let repo = PgSignedReferenceRepository::new(db.clone());

    repo.upsert(reference_for(&file, "tok-old", 60)).await.unwrap();
    repo.upsert(reference_for(&file, "tok-new", 7200)).await.unwrap();

    let found = repo.find(file.id).await.unwrap().expect("reference missing");
    assert_eq!(found.token, "tok-new");
    assert_eq!(found.granted_ttl_secs, 7200);

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_due_for_renewal_joins_file_context() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let file = create_private_file(&db, tenant_id, "expiring.pdf").await;
    let repo = PgSignedReferenceRepository::new(db.clone());

    repo.upsert(SignedReference {
        token_expires_at: Utc::now() - Duration::minutes(5),
        ..reference_for(&file, "tok-stale", 3600)
    })
    .await
    .unwrap();

    let due = repo.due_for_renewal(Utc::now(), 500).await.unwrap();
    let context = due
        .iter()
        .find(|ctx| ctx.reference.file_id == file.id)
        .expect("stale reference not reported");

    assert_eq!(context.object_key, file.object_key);
    assert_eq!(context.visibility, Visibility::Private);
    assert_eq!(context.reference.token, "tok-stale");

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_cutoff_excludes_references_expiring_later() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let file = create_private_file(&db, tenant_id, "fresh.pdf").await;
    let repo = PgSignedReferenceRepository::new(db.clone());

    repo.upsert(reference_for(&file, "tok-fresh", 7200)).await.unwrap();

    let due = repo
        .due_for_renewal(Utc::now() + Duration::hours(1), 500)
        .await
        .unwrap();
    assert!(!due.iter().any(|ctx| ctx.reference.file_id == file.id));

    cleanup_tenant(&db, tenant_id).await;
}

#[tokio::test]
async fn test_removing_the_file_drops_its_reference() {
    let Some(db) = test_db().await else { return };
    let tenant_id = create_tenant(&db).await;
    let file = create_private_file(&db, tenant_id, "cascade.pdf").await;
    let refs = PgSignedReferenceRepository::new(db.clone());
    let files = PgFileRepository::new(db.clone());

    refs.upsert(reference_for(&file, "tok-cascade", 3600))
        .await
        .unwrap();
    assert!(files.remove(file.id).await.unwrap());

    assert!(refs.find(file.id).await.unwrap().is_none());

    cleanup_tenant(&db, tenant_id).await;
}
