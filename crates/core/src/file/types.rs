//! File metadata types and the metadata repository trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FileStoreError;

/// Which bucket a file lives in and how its locator is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Served from the public bucket, locator carries no token.
    #[default]
    Public,
    /// Served from the private bucket behind a signed token.
    Private,
}

impl Visibility {
    /// Convert to database string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }

    /// Build from the upload form's `private` flag.
    #[must_use]
    pub const fn from_private_flag(private: bool) -> Self {
        if private { Self::Private } else { Self::Public }
    }

    /// True for [`Visibility::Private`].
    #[must_use]
    pub const fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unique address of a live file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Folder path relative to the tenant root; empty means the root.
    pub folder_path: String,
    /// Final stored filename.
    pub file_name: String,
    /// Public or private.
    pub visibility: Visibility,
}

/// File metadata domain model. Row existence means the file is Active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileObject {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Folder path relative to the tenant root; empty means the root.
    pub folder_path: String,
    /// Final stored filename.
    pub file_name: String,
    /// Filename as the client sent it.
    pub original_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Public or private.
    pub visibility: Visibility,
    /// Full backend object key (`tenant_id/folder/filename`).
    pub object_key: String,
    /// Backend version id returned by the upload.
    pub remote_object_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the expiry scan retires this file, if ever.
    pub scheduled_delete_at: Option<DateTime<Utc>>,
}

impl FileObject {
    /// The unique identity this row occupies.
    #[must_use]
    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            tenant_id: self.tenant_id,
            folder_path: self.folder_path.clone(),
            file_name: self.file_name.clone(),
            visibility: self.visibility,
        }
    }
}

/// Input for persisting a freshly placed file.
#[derive(Debug, Clone)]
pub struct NewFileObject {
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Folder path relative to the tenant root.
    pub folder_path: String,
    /// Final stored filename.
    pub file_name: String,
    /// Filename as the client sent it.
    pub original_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Public or private.
    pub visibility: Visibility,
    /// Full backend object key.
    pub object_key: String,
    /// Backend version id returned by the upload.
    pub remote_object_id: String,
    /// When the expiry scan should retire this file, if ever.
    pub scheduled_delete_at: Option<DateTime<Utc>>,
}

/// Listing filter for a tenant's files.
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    /// Substring match on the stored filename.
    pub name_contains: Option<String>,
    /// Page offset.
    pub offset: u64,
    /// Page size.
    pub limit: u64,
}

/// Persistence operations for file metadata.
pub trait FileRepository: Send + Sync {
    /// Insert a new Active file row.
    ///
    /// Fails with [`FileStoreError::DuplicateIdentity`] when the identity
    /// is already taken.
    fn insert(
        &self,
        input: NewFileObject,
    ) -> impl std::future::Future<Output = Result<FileObject, FileStoreError>> + Send;

    /// Look up the Active file at an identity.
    fn find_active(
        &self,
        identity: &FileIdentity,
    ) -> impl std::future::Future<Output = Result<Option<FileObject>, FileStoreError>> + Send;

    /// Remove a file row. Returns `false` when the row was already gone,
    /// which callers use to avoid double-retiring a file.
    fn remove(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<bool, FileStoreError>> + Send;

    /// List a tenant's Active files, newest first, with the total count.
    fn list(
        &self,
        tenant_id: Uuid,
        query: &FileQuery,
    ) -> impl std::future::Future<Output = Result<(Vec<FileObject>, u64), FileStoreError>> + Send;

    /// Files whose `scheduled_delete_at` has passed, oldest first.
    fn due_for_expiry(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<Vec<FileObject>, FileStoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_roundtrip() {
        for v in [Visibility::Public, Visibility::Private] {
            assert_eq!(Visibility::parse(v.as_str()), Some(v));
        }
        assert_eq!(Visibility::parse("internal"), None);
    }

    #[test]
    fn test_visibility_from_private_flag() {
        assert_eq!(Visibility::from_private_flag(true), Visibility::Private);
        assert_eq!(Visibility::from_private_flag(false), Visibility::Public);
        assert!(Visibility::Private.is_private());
        assert!(!Visibility::Public.is_private());
    }
}
