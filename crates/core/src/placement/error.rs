//! Placement error types.

use thiserror::Error;

use crate::file::FileStoreError;
use crate::remote::RemoteStoreError;

/// Errors from placing an object.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The identity is taken and the policy forbids replacing it.
    #[error("name '{file_name}' already exists in '{folder_path}'")]
    Conflict {
        /// The contested file name.
        file_name: String,
        /// Folder the collision happened in.
        folder_path: String,
    },

    /// No free suffixed name was found within the attempt budget.
    #[error("no free name found for '{file_name}' after {attempts} attempts")]
    Exhausted {
        /// The name that kept colliding.
        file_name: String,
        /// How many suffixes were tried.
        attempts: u32,
    },

    /// Metadata lookup failed.
    #[error(transparent)]
    Files(#[from] FileStoreError),

    /// The remote store refused or failed the upload.
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
}
