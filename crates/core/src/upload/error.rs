use thiserror::Error;

use crate::deletion::DeletionError;
use crate::file::FileStoreError;
use crate::placement::PlacementError;
use crate::quota::QuotaError;
use crate::reference::ReferenceError;

/// Upload pipeline errors.
///
/// Only [`UploadError::FileTooLarge`] and [`UploadError::Quota`] fail a
/// request outright; the remaining variants occur per file inside an
/// accepted batch and come back as failed entries in the report.
#[derive(Error, Debug)]
pub enum UploadError {
    /// A file exceeds the plan's single-file ceiling.
    #[error("file '{name}' is {size_bytes} bytes, the plan allows {max_bytes}")]
    FileTooLarge {
        /// Filename as the client sent it.
        name: String,
        /// Payload size in bytes.
        size_bytes: i64,
        /// Plan ceiling in bytes.
        max_bytes: i64,
    },
    /// Storage or request accounting rejected the batch.
    #[error(transparent)]
    Quota(#[from] QuotaError),
    /// Placing a file's bytes in the backend failed.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// Minting a download reference failed.
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    /// Persisting file metadata failed.
    #[error(transparent)]
    Files(#[from] FileStoreError),
    /// Retiring a displaced file failed.
    #[error(transparent)]
    Deletion(#[from] DeletionError),
}
