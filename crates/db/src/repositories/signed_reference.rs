//! Signed reference storage.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use vaulta_core::reference::{
    ReferenceError, RenewalContext, SignedReference, SignedReferenceRepository,
};

use crate::entities::{file_objects, signed_references};

/// `SeaORM`-backed signed reference store.
///
/// One row per file; the row disappears with its file through the
/// foreign-key cascade.
#[derive(Debug, Clone)]
pub struct PgSignedReferenceRepository {
    db: DatabaseConnection,
}

impl PgSignedReferenceRepository {
    /// Creates a new signed reference repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl SignedReferenceRepository for PgSignedReferenceRepository {
    async fn find(&self, file_id: Uuid) -> Result<Option<SignedReference>, ReferenceError> {
        let row = signed_references::Entity::find_by_id(file_id)
            .one(&self.db)
            .await
            .map_err(store_err)?;

        Ok(row.map(into_reference))
    }

    async fn upsert(&self, reference: SignedReference) -> Result<(), ReferenceError> {
        let row = signed_references::ActiveModel {
            file_id: Set(reference.file_id),
            tenant_id: Set(reference.tenant_id),
            granted_ttl_secs: Set(reference.granted_ttl_secs),
            token: Set(reference.token),
            token_expires_at: Set(reference.token_expires_at.into()),
            updated_at: Set(Utc::now().into()),
        };

        signed_references::Entity::insert(row)
            .on_conflict(
                OnConflict::column(signed_references::Column::FileId)
                    .update_columns([
                        signed_references::Column::TenantId,
                        signed_references::Column::GrantedTtlSecs,
                        signed_references::Column::Token,
                        signed_references::Column::TokenExpiresAt,
                        signed_references::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        Ok(())
    }

    async fn due_for_renewal(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<RenewalContext>, ReferenceError> {
        let rows = signed_references::Entity::find()
            .filter(signed_references::Column::TokenExpiresAt.lte(cutoff))
            .order_by_asc(signed_references::Column::TokenExpiresAt)
            .limit(limit)
            .find_also_related(file_objects::Entity)
            .all(&self.db)
            .await
            .map_err(store_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(reference, file)| {
                file.map(|file| RenewalContext {
                    reference: into_reference(reference),
                    object_key: file.object_key,
                    visibility: file.visibility.into(),
                })
            })
            .collect())
    }
}

fn into_reference(model: signed_references::Model) -> SignedReference {
    SignedReference {
        file_id: model.file_id,
        tenant_id: model.tenant_id,
        granted_ttl_secs: model.granted_ttl_secs,
        token: model.token,
        token_expires_at: model.token_expires_at.with_timezone(&Utc),
    }
}

fn store_err(err: DbErr) -> ReferenceError {
    ReferenceError::repository(err.to_string())
}
