//! Placement orchestration against metadata and the remote store.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use crate::file::{FileIdentity, FileObject, FileRepository, Visibility};
use crate::remote::{BucketMap, RemoteObject, RemoteStore};

use super::error::PlacementError;
use super::naming::{object_key, resolve_file_name, sanitize_folder, suffixed_name};
use super::types::{CollisionPolicy, PlacedObject};

/// How many random suffixes are tried before giving up on a name.
const MAX_SUFFIX_ATTEMPTS: u32 = 5;

/// Places payloads under collision-free identities.
///
/// The upload reaches the remote store before the caller writes any
/// metadata, so a failed upload costs nothing to undo.
pub struct ObjectPlacer<F, S> {
    files: Arc<F>,
    store: Arc<S>,
    buckets: BucketMap,
}

impl<F, S> Clone for ObjectPlacer<F, S> {
    fn clone(&self) -> Self {
        Self {
            files: Arc::clone(&self.files),
            store: Arc::clone(&self.store),
            buckets: self.buckets.clone(),
        }
    }
}

impl<F: FileRepository, S: RemoteStore> ObjectPlacer<F, S> {
    /// Create a new object placer.
    #[must_use]
    pub fn new(files: Arc<F>, store: Arc<S>, buckets: BucketMap) -> Self {
        Self {
            files,
            store,
            buckets,
        }
    }

    /// Sanitize the requested identity, settle any collision per the
    /// policy, and upload the payload.
    ///
    /// With `Overwrite`, the displaced row rides back in
    /// [`PlacedObject::superseded`] and the caller retires it after the
    /// new row is persisted, so the old bytes survive until the new
    /// ones are safely stored.
    pub async fn place(
        &self,
        tenant_id: Uuid,
        folder: &str,
        name_hint: &str,
        content_type: &str,
        payload: Bytes,
        visibility: Visibility,
        policy: CollisionPolicy,
    ) -> Result<PlacedObject, PlacementError> {
        let folder_path = sanitize_folder(folder);
        let wanted = resolve_file_name(name_hint, content_type);

        let (file_name, superseded) = self
            .settle_collision(tenant_id, &folder_path, wanted, visibility, policy)
            .await?;

        let key = object_key(tenant_id, &folder_path, &file_name);
        let size_bytes = i64::try_from(payload.len()).unwrap_or(i64::MAX);
        let stored = self
            .store_payload(&key, content_type, payload, visibility)
            .await?;

        debug!(
            tenant_id = %tenant_id,
            object_key = %key,
            size_bytes,
            "object placed"
        );
        Ok(PlacedObject {
            file_name,
            folder_path,
            object_key: key,
            remote_object_id: stored.object_id,
            size_bytes,
            visibility,
            content_type: content_type.to_string(),
            superseded,
        })
    }

    async fn settle_collision(
        &self,
        tenant_id: Uuid,
        folder_path: &str,
        wanted: String,
        visibility: Visibility,
        policy: CollisionPolicy,
    ) -> Result<(String, Option<FileObject>), PlacementError> {
        let identity = FileIdentity {
            tenant_id,
            folder_path: folder_path.to_string(),
            file_name: wanted.clone(),
            visibility,
        };
        let Some(existing) = self.files.find_active(&identity).await? else {
            return Ok((wanted, None));
        };

        match policy {
            CollisionPolicy::Overwrite => Ok((wanted, Some(existing))),
            CollisionPolicy::Reject => Err(PlacementError::Conflict {
                file_name: wanted,
                folder_path: folder_path.to_string(),
            }),
            CollisionPolicy::AutoSuffix => {
                for _ in 0..MAX_SUFFIX_ATTEMPTS {
                    let candidate = suffixed_name(&wanted);
                    let identity = FileIdentity {
                        tenant_id,
                        folder_path: folder_path.to_string(),
                        file_name: candidate.clone(),
                        visibility,
                    };
                    if self.files.find_active(&identity).await?.is_none() {
                        return Ok((candidate, None));
                    }
                }
                Err(PlacementError::Exhausted {
                    file_name: wanted,
                    attempts: MAX_SUFFIX_ATTEMPTS,
                })
            }
        }
    }

    async fn store_payload(
        &self,
        key: &str,
        content_type: &str,
        payload: Bytes,
        visibility: Visibility,
    ) -> Result<RemoteObject, PlacementError> {
        let bucket = self.buckets.for_visibility(visibility);
        let target = self.store.upload_target(&bucket.id).await?;
        Ok(self
            .store
            .upload(&target, key, content_type, payload)
            .await?)
    }
}
