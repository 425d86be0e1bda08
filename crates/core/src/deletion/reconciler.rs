//! Deletion queue processing and file retirement.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::file::{FileIdentity, FileObject, FileRepository};
use crate::placement::PlacedObject;
use crate::quota::{QuotaLedger, QuotaRepository};
use crate::remote::{BucketMap, RemoteStore};

use super::error::DeletionError;
use super::types::{DeletionTask, ExpiryStats, NewDeletionTask, SweepStats};

/// Storage access for the deletion queue.
pub trait DeletionQueueRepository: Send + Sync {
    /// Queue a task, replacing any existing task for the same
    /// (tenant, bucket, key) triple.
    fn enqueue(
        &self,
        task: NewDeletionTask,
    ) -> impl std::future::Future<Output = Result<(), DeletionError>> + Send;

    /// Tasks ready to run (`expire_at` absent or passed), oldest
    /// enqueued first.
    fn due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<Vec<DeletionTask>, DeletionError>> + Send;

    /// Drop a finished task.
    fn remove(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<(), DeletionError>> + Send;
}

/// Executes queued purges and retires files into the queue.
pub struct DeletionReconciler<D, F, Q, S> {
    queue: Arc<D>,
    files: Arc<F>,
    quota: QuotaLedger<Q>,
    store: Arc<S>,
    buckets: BucketMap,
    batch_size: u64,
}

impl<D, F, Q, S> Clone for DeletionReconciler<D, F, Q, S> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            files: Arc::clone(&self.files),
            quota: self.quota.clone(),
            store: Arc::clone(&self.store),
            buckets: self.buckets.clone(),
            batch_size: self.batch_size,
        }
    }
}

impl<D, F, Q, S> DeletionReconciler<D, F, Q, S>
where
    D: DeletionQueueRepository,
    F: FileRepository,
    Q: QuotaRepository,
    S: RemoteStore,
{
    /// Create a reconciler whose sweeps take at most `batch_size`
    /// tasks per pass.
    #[must_use]
    pub fn new(
        queue: Arc<D>,
        files: Arc<F>,
        quota: QuotaLedger<Q>,
        store: Arc<S>,
        buckets: BucketMap,
        batch_size: u64,
    ) -> Self {
        Self {
            queue,
            files,
            quota,
            store,
            buckets,
            batch_size,
        }
    }

    /// Retire a file: drop its row, queue its bytes for purge, and
    /// return its storage share.
    ///
    /// The row removal doubles as the concurrency guard. Returns
    /// `false` when the row was already gone, so a retire racing an
    /// explicit delete neither double-queues nor double-releases.
    pub async fn retire_file(
        &self,
        file: &FileObject,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<bool, DeletionError> {
        if !self.files.remove(file.id).await? {
            return Ok(false);
        }

        let bucket = self.buckets.for_visibility(file.visibility);
        self.queue
            .enqueue(NewDeletionTask::for_file(file, &bucket.id, expire_at))
            .await?;
        self.quota
            .commit_storage(file.tenant_id, -file.size_bytes)
            .await?;
        info!(
            tenant_id = %file.tenant_id,
            object_key = %file.object_key,
            size_bytes = file.size_bytes,
            "file retired"
        );
        Ok(true)
    }

    /// Queue backend bytes that never got a metadata row, after a
    /// failed persist.
    pub async fn enqueue_orphan(
        &self,
        tenant_id: Uuid,
        placed: &PlacedObject,
    ) -> Result<(), DeletionError> {
        let bucket = self.buckets.for_visibility(placed.visibility);
        self.queue
            .enqueue(NewDeletionTask {
                tenant_id,
                bucket_id: bucket.id.clone(),
                object_key: placed.object_key.clone(),
                folder_path: placed.folder_path.clone(),
                visibility: placed.visibility,
                remote_object_id: Some(placed.remote_object_id.clone()),
                expire_at: None,
            })
            .await
    }

    /// Run one sweep over the due portion of the queue.
    ///
    /// Each task purges every stored version of its key. Objects that
    /// are already gone count as purged. A failing task is left queued
    /// and the sweep moves on; it never aborts.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> SweepStats {
        let due = match self.queue.due(now, self.batch_size).await {
            Ok(due) => due,
            Err(err) => {
                warn!(error = %err, "deletion queue scan failed");
                return SweepStats::default();
            }
        };

        let mut stats = SweepStats::default();
        for task in due {
            stats.processed += 1;
            match self.purge_task(&task).await {
                Ok(deleted) => {
                    stats.versions_deleted += deleted;
                    stats.purged += 1;
                    if let Err(err) = self.queue.remove(task.id).await {
                        warn!(
                            task_id = %task.id,
                            error = %err,
                            "object purged but its task could not be dropped"
                        );
                    }
                }
                Err(err) => {
                    stats.failed += 1;
                    warn!(
                        task_id = %task.id,
                        object_key = %task.object_key,
                        error = %err,
                        "deletion task failed, leaving in queue"
                    );
                }
            }
        }
        if stats.processed > 0 {
            info!(
                purged = stats.purged,
                versions = stats.versions_deleted,
                failed = stats.failed,
                "deletion sweep finished"
            );
        }
        stats
    }

    /// Retire every file whose scheduled deletion time has passed.
    pub async fn convert_expired(&self, now: DateTime<Utc>) -> ExpiryStats {
        let due = match self.files.due_for_expiry(now, self.batch_size).await {
            Ok(due) => due,
            Err(err) => {
                warn!(error = %err, "expiry scan failed");
                return ExpiryStats::default();
            }
        };

        let mut stats = ExpiryStats::default();
        for file in due {
            stats.examined += 1;
            match self.retire_file(&file, None).await {
                Ok(true) => stats.retired += 1,
                // raced with an explicit delete, nothing left to do
                Ok(false) => {}
                Err(err) => {
                    stats.failed += 1;
                    warn!(
                        file_id = %file.id,
                        error = %err,
                        "failed to retire expired file"
                    );
                }
            }
        }
        if stats.examined > 0 {
            info!(
                retired = stats.retired,
                failed = stats.failed,
                "expiry scan finished"
            );
        }
        stats
    }

    /// Delete every stored version of the task's key, except the one a
    /// still-Active row points at.
    ///
    /// The exception is what makes overwrites safe: the replacement
    /// shares the superseded object's key, so a blanket purge would
    /// take the live object down with the stale versions.
    async fn purge_task(&self, task: &DeletionTask) -> Result<u64, DeletionError> {
        let versions = match self
            .store
            .list_versions(&task.bucket_id, &task.object_key)
            .await
        {
            Ok(versions) => versions,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let protected = if versions.is_empty() {
            None
        } else {
            self.live_version_at(task).await?
        };

        let mut deleted = 0u64;
        for version in versions {
            if protected.as_deref() == Some(version.object_id.as_str()) {
                continue;
            }
            match self
                .store
                .delete_version(&version.object_key, &version.object_id)
                .await
            {
                Ok(()) => deleted += 1,
                // already gone counts as done
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(deleted)
    }

    /// Version id of the Active row at the task's identity, if one
    /// replaced the retired object.
    async fn live_version_at(&self, task: &DeletionTask) -> Result<Option<String>, DeletionError> {
        let file_name = task
            .object_key
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let identity = FileIdentity {
            tenant_id: task.tenant_id,
            folder_path: task.folder_path.clone(),
            file_name,
            visibility: task.visibility,
        };
        let live = self.files.find_active(&identity).await?;
        Ok(live.map(|row| row.remote_object_id))
    }
}
