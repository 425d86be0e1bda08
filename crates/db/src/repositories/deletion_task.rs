//! Deletion queue storage.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use vaulta_core::deletion::{DeletionError, DeletionQueueRepository, DeletionTask, NewDeletionTask};

use crate::entities::deletion_tasks;

/// `SeaORM`-backed deletion queue.
///
/// The (tenant, bucket, key) uniqueness is a database constraint;
/// enqueueing over an existing task replaces its payload and enqueue
/// time in one upsert.
#[derive(Debug, Clone)]
pub struct PgDeletionQueueRepository {
    db: DatabaseConnection,
}

impl PgDeletionQueueRepository {
    /// Creates a new deletion queue repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl DeletionQueueRepository for PgDeletionQueueRepository {
    async fn enqueue(&self, task: NewDeletionTask) -> Result<(), DeletionError> {
        let row = deletion_tasks::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(task.tenant_id),
            bucket_id: Set(task.bucket_id),
            object_key: Set(task.object_key),
            folder_path: Set(task.folder_path),
            visibility: Set(task.visibility.into()),
            remote_object_id: Set(task.remote_object_id),
            enqueued_at: Set(Utc::now().into()),
            expire_at: Set(task.expire_at.map(Into::into)),
        };

        deletion_tasks::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    deletion_tasks::Column::TenantId,
                    deletion_tasks::Column::BucketId,
                    deletion_tasks::Column::ObjectKey,
                ])
                .update_columns([
                    deletion_tasks::Column::FolderPath,
                    deletion_tasks::Column::Visibility,
                    deletion_tasks::Column::RemoteObjectId,
                    deletion_tasks::Column::EnqueuedAt,
                    deletion_tasks::Column::ExpireAt,
                ])
                .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        Ok(())
    }

    async fn due(&self, now: DateTime<Utc>, limit: u64) -> Result<Vec<DeletionTask>, DeletionError> {
        let rows = deletion_tasks::Entity::find()
            .filter(
                Condition::any()
                    .add(deletion_tasks::Column::ExpireAt.is_null())
                    .add(deletion_tasks::Column::ExpireAt.lte(now)),
            )
            .order_by_asc(deletion_tasks::Column::EnqueuedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        Ok(rows.into_iter().map(into_task).collect())
    }

    async fn remove(&self, id: Uuid) -> Result<(), DeletionError> {
        deletion_tasks::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        Ok(())
    }
}

fn into_task(model: deletion_tasks::Model) -> DeletionTask {
    DeletionTask {
        id: model.id,
        tenant_id: model.tenant_id,
        bucket_id: model.bucket_id,
        object_key: model.object_key,
        folder_path: model.folder_path,
        visibility: model.visibility.into(),
        remote_object_id: model.remote_object_id,
        enqueued_at: model.enqueued_at.with_timezone(&Utc),
        expire_at: model.expire_at.map(|at| at.with_timezone(&Utc)),
    }
}

fn store_err(err: DbErr) -> DeletionError {
    DeletionError::repository(err.to_string())
}
