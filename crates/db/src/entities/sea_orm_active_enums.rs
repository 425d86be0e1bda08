//! `SeaORM` active enums mirroring the database enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use vaulta_core::file::Visibility;

/// Mirror of the `file_visibility` database enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "file_visibility")]
pub enum FileVisibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
}

impl From<Visibility> for FileVisibility {
    fn from(value: Visibility) -> Self {
        match value {
            Visibility::Public => Self::Public,
            Visibility::Private => Self::Private,
        }
    }
}

impl From<FileVisibility> for Visibility {
    fn from(value: FileVisibility) -> Self {
        match value {
            FileVisibility::Public => Self::Public,
            FileVisibility::Private => Self::Private,
        }
    }
}
