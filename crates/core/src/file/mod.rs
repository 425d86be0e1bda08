//! File metadata domain types.
//!
//! A `FileObject` row is the record of an Active stored file. Removal
//! paths (explicit delete, overwrite supersede, scheduled expiry) take
//! the row away and leave a deletion task behind; the task is the
//! pending-deletion state until the reconciler confirms the backend
//! purge.

mod error;
mod types;

pub use error::FileStoreError;
pub use types::{FileIdentity, FileObject, FileQuery, FileRepository, NewFileObject, Visibility};
