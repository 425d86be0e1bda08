//! Remote object-store client speaking the store's native HTTP API.
//!
//! Everything the lifecycle engine needs from the store goes through
//! the [`RemoteStore`] trait:
//!
//! ```text
//! authorize()               -> account session (cached)
//! upload_target(bucket)     -> single-use upload endpoint
//! upload(target, key, ...)  -> stored object
//! list_versions(bucket,key) -> every version of an exact key
//! delete_version(key, id)   -> one version gone
//! download_authorization()  -> short-lived download token
//! ```
//!
//! [`HttpRemoteStore`] is the production implementation; tests swap in
//! in-memory fakes.

mod client;
mod config;
mod error;
mod types;

pub use client::HttpRemoteStore;
pub use config::RemoteConfig;
pub use error::RemoteStoreError;
pub use types::{
    Bucket, BucketMap, DownloadGrant, ObjectVersion, RemoteObject, RemoteSession, RemoteStore,
    UploadTarget, encode_object_key, encode_query_value,
};
