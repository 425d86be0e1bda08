//! Remote store types and the operation seam.

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::file::Visibility;

use super::error::RemoteStoreError;

/// Characters escaped when a key segment rides in a URL or header.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode an object key segment by segment, keeping the
/// slashes that separate folders.
#[must_use]
pub fn encode_object_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, KEY_SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode a value carried in a URL query string.
#[must_use]
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, KEY_SEGMENT).to_string()
}

/// An authorized account session.
#[derive(Debug, Clone)]
pub struct RemoteSession {
    /// Account-wide token sent on API calls.
    pub account_token: String,
    /// Base URL for API operations.
    pub api_url: String,
    /// Base URL for direct downloads.
    pub download_url: String,
}

/// A single-use upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    /// URL the file bytes are posted to.
    pub upload_url: String,
    /// Token scoped to that URL.
    pub auth_token: String,
}

/// A stored object as the remote store reports it.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    /// Store-assigned object id.
    pub object_id: String,
    /// Key the object was stored under.
    pub object_key: String,
}

/// One stored version of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    /// Store-assigned id of this version.
    pub object_id: String,
    /// Key the version lives under.
    pub object_key: String,
}

/// A short-lived download authorization.
#[derive(Debug, Clone)]
pub struct DownloadGrant {
    /// Token appended to download URLs.
    pub token: String,
}

/// A bucket the engine stores objects in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Store-assigned bucket id, used on API calls.
    pub id: String,
    /// Bucket name, used in download paths.
    pub name: String,
}

/// The public and private buckets the engine spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketMap {
    /// Bucket for objects served without authorization.
    pub public: Bucket,
    /// Bucket for objects requiring a download token.
    pub private: Bucket,
}

impl BucketMap {
    /// Bucket an object of the given visibility belongs in.
    #[must_use]
    pub const fn for_visibility(&self, visibility: Visibility) -> &Bucket {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Private => &self.private,
        }
    }
}

/// Operations the lifecycle engine needs from a remote object store.
pub trait RemoteStore: Send + Sync {
    /// Open or reuse an account session.
    fn authorize(
        &self,
    ) -> impl std::future::Future<Output = Result<RemoteSession, RemoteStoreError>> + Send;

    /// Obtain a single-use upload endpoint for a bucket.
    fn upload_target(
        &self,
        bucket_id: &str,
    ) -> impl std::future::Future<Output = Result<UploadTarget, RemoteStoreError>> + Send;

    /// Post file bytes to an upload endpoint.
    fn upload(
        &self,
        target: &UploadTarget,
        object_key: &str,
        content_type: &str,
        payload: Bytes,
    ) -> impl std::future::Future<Output = Result<RemoteObject, RemoteStoreError>> + Send;

    /// List every stored version of an exact key. A key with no
    /// versions yields an empty list, not an error.
    fn list_versions(
        &self,
        bucket_id: &str,
        object_key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ObjectVersion>, RemoteStoreError>> + Send;

    /// Delete one version of an object.
    fn delete_version(
        &self,
        object_key: &str,
        object_id: &str,
    ) -> impl std::future::Future<Output = Result<(), RemoteStoreError>> + Send;

    /// Mint a download token valid for keys under `key_prefix`.
    fn download_authorization(
        &self,
        bucket_id: &str,
        key_prefix: &str,
        ttl_secs: i64,
    ) -> impl std::future::Future<Output = Result<DownloadGrant, RemoteStoreError>> + Send;
}
