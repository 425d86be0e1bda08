//! Deletion queue types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::file::{FileObject, Visibility};

/// A queued purge of the stored versions of one object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionTask {
    /// Task id.
    pub id: Uuid,
    /// Tenant whose object is being purged.
    pub tenant_id: Uuid,
    /// Bucket the key lives in.
    pub bucket_id: String,
    /// Exact object key to purge.
    pub object_key: String,
    /// Folder path of the retired row, for identity reconstruction.
    pub folder_path: String,
    /// Visibility of the retired row.
    pub visibility: Visibility,
    /// Version id of the object this task set out to remove, when known.
    pub remote_object_id: Option<String>,
    /// When the task was queued; sweeps run oldest first.
    pub enqueued_at: DateTime<Utc>,
    /// Earliest time the purge may run; `None` means immediately.
    pub expire_at: Option<DateTime<Utc>>,
}

/// Input for queueing a purge. One task exists per
/// (tenant, bucket, key) triple; re-enqueueing replaces it.
#[derive(Debug, Clone)]
pub struct NewDeletionTask {
    /// Tenant whose object is being purged.
    pub tenant_id: Uuid,
    /// Bucket the key lives in.
    pub bucket_id: String,
    /// Exact object key to purge.
    pub object_key: String,
    /// Folder path of the retired row.
    pub folder_path: String,
    /// Visibility of the retired row.
    pub visibility: Visibility,
    /// Version id of the object being removed, when known.
    pub remote_object_id: Option<String>,
    /// Earliest time the purge may run; `None` means immediately.
    pub expire_at: Option<DateTime<Utc>>,
}

impl NewDeletionTask {
    /// Task that purges a retired file's bytes.
    #[must_use]
    pub fn for_file(file: &FileObject, bucket_id: &str, expire_at: Option<DateTime<Utc>>) -> Self {
        Self {
            tenant_id: file.tenant_id,
            bucket_id: bucket_id.to_string(),
            object_key: file.object_key.clone(),
            folder_path: file.folder_path.clone(),
            visibility: file.visibility,
            remote_object_id: Some(file.remote_object_id.clone()),
            expire_at,
        }
    }
}

/// Counters from one deletion sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Tasks the sweep attempted.
    pub processed: u64,
    /// Tasks whose key is now fully purged.
    pub purged: u64,
    /// Individual versions deleted remotely.
    pub versions_deleted: u64,
    /// Tasks left in the queue after a failure.
    pub failed: u64,
}

/// Counters from one expiry scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryStats {
    /// Files whose scheduled deletion time had passed.
    pub examined: u64,
    /// Files retired into the deletion queue.
    pub retired: u64,
    /// Files that could not be retired this scan.
    pub failed: u64,
}
