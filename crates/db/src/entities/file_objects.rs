//! `SeaORM` Entity for file_objects table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::FileVisibility;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "file_objects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub folder_path: String,
    pub file_name: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub visibility: FileVisibility,
    pub object_key: String,
    pub remote_object_id: String,
    pub created_at: DateTimeWithTimeZone,
    pub scheduled_delete_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id"
    )]
    Tenants,
    #[sea_orm(has_one = "super::signed_references::Entity")]
    SignedReferences,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenants.def()
    }
}

impl Related<super::signed_references::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SignedReferences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
