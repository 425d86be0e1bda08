//! File metadata storage.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use vaulta_core::file::{
    FileIdentity, FileObject, FileQuery, FileRepository, FileStoreError, NewFileObject,
};

use crate::entities::file_objects;
use crate::entities::sea_orm_active_enums::FileVisibility;

/// `SeaORM`-backed file metadata store.
///
/// The (tenant, folder, name, visibility) uniqueness lives in a
/// database constraint, so two races inserting the same identity
/// resolve to one winner and one [`FileStoreError::DuplicateIdentity`].
#[derive(Debug, Clone)]
pub struct PgFileRepository {
    db: DatabaseConnection,
}

impl PgFileRepository {
    /// Creates a new file repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl FileRepository for PgFileRepository {
    async fn insert(&self, input: NewFileObject) -> Result<FileObject, FileStoreError> {
        let identity = input.object_key.clone();

        let row = file_objects::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(input.tenant_id),
            folder_path: Set(input.folder_path),
            file_name: Set(input.file_name),
            original_name: Set(input.original_name),
            content_type: Set(input.content_type),
            size_bytes: Set(input.size_bytes),
            visibility: Set(input.visibility.into()),
            object_key: Set(input.object_key),
            remote_object_id: Set(input.remote_object_id),
            created_at: Set(Utc::now().into()),
            scheduled_delete_at: Set(input.scheduled_delete_at.map(Into::into)),
        };

        match row.insert(&self.db).await {
            Ok(model) => Ok(into_file_object(model)),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(FileStoreError::DuplicateIdentity(identity))
                }
                _ => Err(FileStoreError::repository(err.to_string())),
            },
        }
    }

    async fn find_active(
        &self,
        identity: &FileIdentity,
    ) -> Result<Option<FileObject>, FileStoreError> {
        let row = file_objects::Entity::find()
            .filter(file_objects::Column::TenantId.eq(identity.tenant_id))
            .filter(file_objects::Column::FolderPath.eq(identity.folder_path.as_str()))
            .filter(file_objects::Column::FileName.eq(identity.file_name.as_str()))
            .filter(file_objects::Column::Visibility.eq(FileVisibility::from(identity.visibility)))
            .one(&self.db)
            .await
            .map_err(store_err)?;

        Ok(row.map(into_file_object))
    }

    async fn remove(&self, id: Uuid) -> Result<bool, FileStoreError> {
        let result = file_objects::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        query: &FileQuery,
    ) -> Result<(Vec<FileObject>, u64), FileStoreError> {
        let mut select =
            file_objects::Entity::find().filter(file_objects::Column::TenantId.eq(tenant_id));
        if let Some(needle) = query.name_contains.as_deref() {
            select = select.filter(file_objects::Column::FileName.contains(needle));
        }

        let total = select.clone().count(&self.db).await.map_err(store_err)?;
        let rows = select
            .order_by_desc(file_objects::Column::CreatedAt)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        Ok((rows.into_iter().map(into_file_object).collect(), total))
    }

    async fn due_for_expiry(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<FileObject>, FileStoreError> {
        let rows = file_objects::Entity::find()
            .filter(file_objects::Column::ScheduledDeleteAt.is_not_null())
            .filter(file_objects::Column::ScheduledDeleteAt.lte(now))
            .order_by_asc(file_objects::Column::ScheduledDeleteAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        Ok(rows.into_iter().map(into_file_object).collect())
    }
}

fn into_file_object(model: file_objects::Model) -> FileObject {
    FileObject {
        id: model.id,
        tenant_id: model.tenant_id,
        folder_path: model.folder_path,
        file_name: model.file_name,
        original_name: model.original_name,
        content_type: model.content_type,
        size_bytes: model.size_bytes,
        visibility: model.visibility.into(),
        object_key: model.object_key,
        remote_object_id: model.remote_object_id,
        created_at: model.created_at.with_timezone(&Utc),
        scheduled_delete_at: model.scheduled_delete_at.map(|at| at.with_timezone(&Utc)),
    }
}

fn store_err(err: DbErr) -> FileStoreError {
    FileStoreError::repository(err.to_string())
}
