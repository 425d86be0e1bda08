//! Upload orchestration service.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::deletion::{DeletionQueueRepository, DeletionReconciler};
use crate::file::{FileRepository, NewFileObject};
use crate::placement::{CollisionPolicy, ObjectPlacer, PlacedObject, indexed_name};
use crate::plan::{EffectiveLimits, PlanCatalog, PlanRepository};
use crate::quota::{QuotaLedger, QuotaRepository};
use crate::reference::{Locator, ReferenceIssuer, SignedReferenceRepository};
use crate::remote::RemoteStore;
use crate::tenant::Tenant;

use super::error::UploadError;
use super::types::{
    IncomingFile, MAX_EXPIRE_DELETE_SECS, UploadOptions, UploadOutcome, UploadReport, UploadedFile,
};

/// How many files of one batch are placed concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Drives a whole upload request through limits, quota, placement,
/// references, and persistence.
pub struct UploadService<D, F, P, Q, R, S> {
    plans: PlanCatalog<P>,
    ledger: QuotaLedger<Q>,
    placer: ObjectPlacer<F, S>,
    issuer: ReferenceIssuer<R, S>,
    reconciler: DeletionReconciler<D, F, Q, S>,
    files: Arc<F>,
    concurrency: usize,
}

impl<D, F, P, Q, R, S> Clone for UploadService<D, F, P, Q, R, S> {
    fn clone(&self) -> Self {
        Self {
            plans: self.plans.clone(),
            ledger: self.ledger.clone(),
            placer: self.placer.clone(),
            issuer: self.issuer.clone(),
            reconciler: self.reconciler.clone(),
            files: Arc::clone(&self.files),
            concurrency: self.concurrency,
        }
    }
}

impl<D, F, P, Q, R, S> UploadService<D, F, P, Q, R, S>
where
    D: DeletionQueueRepository,
    F: FileRepository,
    P: PlanRepository,
    Q: QuotaRepository,
    R: SignedReferenceRepository,
    S: RemoteStore,
{
    /// Create a new upload service.
    #[must_use]
    pub fn new(
        plans: PlanCatalog<P>,
        ledger: QuotaLedger<Q>,
        placer: ObjectPlacer<F, S>,
        issuer: ReferenceIssuer<R, S>,
        reconciler: DeletionReconciler<D, F, Q, S>,
        files: Arc<F>,
    ) -> Self {
        Self {
            plans,
            ledger,
            placer,
            issuer,
            reconciler,
            files,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Override the per-batch placement concurrency.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run one upload request end to end.
    ///
    /// The batch passes three gates in order: no single file may exceed
    /// the plan's file-size ceiling, the rolling request window must
    /// admit the call, and the summed payload must fit under the
    /// storage cap in one atomic reservation. Past the gates each file
    /// is processed independently; a failed file hands its reservation
    /// share back and becomes a failed entry in the report while its
    /// siblings proceed.
    ///
    /// # Errors
    ///
    /// [`UploadError::FileTooLarge`] and [`UploadError::Quota`] reject
    /// the request as a whole; per-file problems never surface here.
    pub async fn handle_upload(
        &self,
        tenant: &Tenant,
        files: Vec<IncomingFile>,
        options: UploadOptions,
    ) -> Result<UploadReport, UploadError> {
        let limits = self.plans.effective_limits(tenant).await;

        for file in &files {
            let size_bytes = file.size_bytes();
            if size_bytes > limits.max_file_size_bytes {
                return Err(UploadError::FileTooLarge {
                    name: file.original_name.clone(),
                    size_bytes,
                    max_bytes: limits.max_file_size_bytes,
                });
            }
        }

        self.ledger
            .check_and_count_request(tenant, options.origin, &limits)
            .await?;

        let total_bytes: i64 = files.iter().map(IncomingFile::size_bytes).sum();
        self.ledger
            .reserve_storage(tenant.id, total_bytes, &limits)
            .await?;

        let shared_name = options
            .provided_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);
        let suffix_shared = files.len() > 1 && options.collision != CollisionPolicy::Overwrite;

        let outcomes: Vec<UploadOutcome> = stream::iter(files.into_iter().enumerate())
            .map(|(index, file)| {
                let name_hint = match &shared_name {
                    Some(name) if suffix_shared => indexed_name(name, index),
                    Some(name) => name.clone(),
                    None => file.original_name.clone(),
                };
                self.process_one(tenant, file, name_hint, &options, &limits)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let report = UploadReport { outcomes };
        info!(
            tenant_id = %tenant.id,
            uploaded = report.uploaded(),
            failed = report.failed(),
            total_bytes,
            "upload batch finished"
        );
        Ok(report)
    }

    /// Process one file of an accepted batch, converting any failure
    /// into a report entry after returning the file's reservation share.
    async fn process_one(
        &self,
        tenant: &Tenant,
        file: IncomingFile,
        name_hint: String,
        options: &UploadOptions,
        limits: &EffectiveLimits,
    ) -> UploadOutcome {
        let original_name = file.original_name.clone();
        let size_bytes = file.size_bytes();
        match self.store_one(tenant, file, &name_hint, options, limits).await {
            Ok(uploaded) => UploadOutcome::Uploaded(uploaded),
            Err(err) => {
                warn!(
                    tenant_id = %tenant.id,
                    file = %original_name,
                    error = %err,
                    "file skipped"
                );
                self.release_share(tenant.id, size_bytes).await;
                UploadOutcome::Failed {
                    original_name,
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn store_one(
        &self,
        tenant: &Tenant,
        file: IncomingFile,
        name_hint: &str,
        options: &UploadOptions,
        limits: &EffectiveLimits,
    ) -> Result<UploadedFile, UploadError> {
        let IncomingFile {
            original_name,
            content_type,
            payload,
        } = file;

        let placed = self
            .placer
            .place(
                tenant.id,
                &options.folder,
                name_hint,
                &content_type,
                payload,
                options.visibility,
                options.collision,
            )
            .await?;

        match self
            .finish_placed(tenant, &original_name, &placed, options, limits)
            .await
        {
            Ok(uploaded) => Ok(uploaded),
            Err(err) => {
                // the backend object exists but no row points at it
                if let Err(orphan_err) = self.reconciler.enqueue_orphan(tenant.id, &placed).await {
                    warn!(
                        tenant_id = %tenant.id,
                        object_key = %placed.object_key,
                        error = %orphan_err,
                        "failed to queue orphaned object for cleanup"
                    );
                }
                Err(err)
            }
        }
    }

    /// Steps after the bytes are stored: retire a displaced row, mint
    /// the reference, persist metadata, persist the reference.
    async fn finish_placed(
        &self,
        tenant: &Tenant,
        original_name: &str,
        placed: &PlacedObject,
        options: &UploadOptions,
        limits: &EffectiveLimits,
    ) -> Result<UploadedFile, UploadError> {
        if let Some(superseded) = &placed.superseded {
            self.reconciler.retire_file(superseded, None).await?;
        }

        let prepared = if placed.visibility.is_private() {
            Some(
                self.issuer
                    .prepare(
                        &placed.object_key,
                        tenant.custom_domain.as_deref(),
                        options.token_ttl_secs,
                        limits,
                    )
                    .await?,
            )
        } else {
            None
        };

        // explicit expiry wins; private files otherwise live exactly as
        // long as their granted token
        let scheduled_delete_at = match options.expire_delete_secs.filter(|secs| *secs > 0) {
            Some(secs) => Some(Utc::now() + Duration::seconds(secs.min(MAX_EXPIRE_DELETE_SECS))),
            None => prepared.as_ref().map(|prepared| prepared.expires_at),
        };

        let row = self
            .files
            .insert(NewFileObject {
                tenant_id: tenant.id,
                folder_path: placed.folder_path.clone(),
                file_name: placed.file_name.clone(),
                original_name: original_name.to_string(),
                content_type: placed.content_type.clone(),
                size_bytes: placed.size_bytes,
                visibility: placed.visibility,
                object_key: placed.object_key.clone(),
                remote_object_id: placed.remote_object_id.clone(),
                scheduled_delete_at,
            })
            .await?;

        let locator = match prepared {
            Some(prepared) => {
                self.issuer.remember(row.id, tenant.id, &prepared).await;
                Locator {
                    url: prepared.url,
                    granted_ttl_secs: Some(prepared.granted_ttl_secs),
                    expires_at: Some(prepared.expires_at),
                }
            }
            None => Locator {
                url: self
                    .issuer
                    .public_url(&row.object_key, tenant.custom_domain.as_deref()),
                granted_ttl_secs: None,
                expires_at: None,
            },
        };

        debug!(
            tenant_id = %tenant.id,
            object_key = %row.object_key,
            size_bytes = row.size_bytes,
            "file stored"
        );
        Ok(UploadedFile { file: row, locator })
    }

    async fn release_share(&self, tenant_id: Uuid, size_bytes: i64) {
        if let Err(err) = self.ledger.commit_storage(tenant_id, -size_bytes).await {
            warn!(
                tenant_id = %tenant_id,
                error = %err,
                "failed to return a skipped file's storage share"
            );
        }
    }
}
