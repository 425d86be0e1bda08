//! `SeaORM` Entity for signed_references table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "signed_references")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub file_id: Uuid,
    pub tenant_id: Uuid,
    pub granted_ttl_secs: i64,
    pub token: String,
    pub token_expires_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::file_objects::Entity",
        from = "Column::FileId",
        to = "super::file_objects::Column::Id"
    )]
    FileObjects,
}

impl Related<super::file_objects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileObjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
