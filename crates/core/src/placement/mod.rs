//! Object placement: naming, collision handling, and backend upload.
//!
//! Placement owns the canonical key shape
//! `{tenant_id}/{folder_path}/{file_name}` and guarantees the upload
//! reaches the remote store before any caller touches metadata, so a
//! failed upload leaves no row and no quota movement behind.

mod error;
mod naming;
mod placer;
mod types;

pub use error::PlacementError;
pub use naming::{
    ensure_extension, indexed_name, object_key, random_name, resolve_file_name,
    sanitize_file_name, sanitize_folder, split_extension, suffixed_name,
};
pub use placer::ObjectPlacer;
pub use types::{CollisionPolicy, PlacedObject};
