//! Reference issuing, reuse, and renewal.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::file::{FileObject, Visibility};
use crate::plan::EffectiveLimits;
use crate::remote::{BucketMap, RemoteStore, encode_object_key, encode_query_value};

use super::error::ReferenceError;
use super::types::{Locator, PreparedReference, RenewalContext, RenewalStats, SignedReference};

/// Hard ceiling the backend places on download token validity.
pub const BACKEND_MAX_TTL_SECS: i64 = 7 * 24 * 3600;

/// Clamp a requested validity to what can actually be granted: the
/// smallest of the request, the plan ceiling, and the backend ceiling.
/// Absent, zero, or negative requests mean "as long as allowed".
#[must_use]
pub fn clamp_ttl(requested_secs: Option<i64>, plan_cap_secs: i64) -> i64 {
    let wanted = match requested_secs {
        Some(secs) if secs > 0 => secs,
        _ => BACKEND_MAX_TTL_SECS,
    };
    let plan_cap = if plan_cap_secs > 0 {
        plan_cap_secs
    } else {
        BACKEND_MAX_TTL_SECS
    };
    wanted.min(plan_cap).min(BACKEND_MAX_TTL_SECS)
}

/// Storage access for remembered references.
pub trait SignedReferenceRepository: Send + Sync {
    /// Fetch the remembered reference for a file.
    fn find(
        &self,
        file_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<SignedReference>, ReferenceError>> + Send;

    /// Insert or replace the reference for a file.
    fn upsert(
        &self,
        reference: SignedReference,
    ) -> impl std::future::Future<Output = Result<(), ReferenceError>> + Send;

    /// References expiring at or before `cutoff`, soonest first, joined
    /// with their file's key and visibility.
    fn due_for_renewal(
        &self,
        cutoff: DateTime<Utc>,
        limit: u64,
    ) -> impl std::future::Future<Output = Result<Vec<RenewalContext>, ReferenceError>> + Send;
}

/// Issues download locators and keeps private tokens alive.
pub struct ReferenceIssuer<R, S> {
    repo: Arc<R>,
    store: Arc<S>,
    buckets: BucketMap,
    download_base_url: String,
    renewal_margin: Duration,
}

impl<R, S> Clone for ReferenceIssuer<R, S> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            store: Arc::clone(&self.store),
            buckets: self.buckets.clone(),
            download_base_url: self.download_base_url.clone(),
            renewal_margin: self.renewal_margin,
        }
    }
}

impl<R: SignedReferenceRepository, S: RemoteStore> ReferenceIssuer<R, S> {
    /// Create an issuer. Tokens within `renewal_margin_secs` of expiry
    /// count as stale and are re-minted on access.
    #[must_use]
    pub fn new(
        repo: Arc<R>,
        store: Arc<S>,
        buckets: BucketMap,
        download_base_url: impl Into<String>,
        renewal_margin_secs: i64,
    ) -> Self {
        Self {
            repo,
            store,
            buckets,
            download_base_url: download_base_url.into(),
            renewal_margin: Duration::seconds(renewal_margin_secs),
        }
    }

    /// Token-free URL for a public object.
    #[must_use]
    pub fn public_url(&self, object_key: &str, custom_domain: Option<&str>) -> String {
        format!(
            "{}/file/{}/{}",
            self.base_url(custom_domain),
            self.buckets.public.name,
            encode_object_key(object_key)
        )
    }

    /// Mint a fresh reference for a private object.
    ///
    /// Runs before the file row is persisted, so a mint failure cancels
    /// the upload with nothing to clean up.
    pub async fn prepare(
        &self,
        object_key: &str,
        custom_domain: Option<&str>,
        requested_ttl_secs: Option<i64>,
        limits: &EffectiveLimits,
    ) -> Result<PreparedReference, ReferenceError> {
        let granted = clamp_ttl(requested_ttl_secs, limits.max_reference_ttl_secs);
        let grant = self
            .store
            .download_authorization(&self.buckets.private.id, object_key, granted)
            .await?;
        let url = self.private_url(object_key, &grant.token, custom_domain);
        Ok(PreparedReference {
            url,
            token: grant.token,
            granted_ttl_secs: granted,
            expires_at: Utc::now() + Duration::seconds(granted),
        })
    }

    /// Persist a minted reference once its file row exists. Failures
    /// are logged, not surfaced: the upload already succeeded and the
    /// renewal sweep mints a replacement on its next pass.
    pub async fn remember(&self, file_id: Uuid, tenant_id: Uuid, prepared: &PreparedReference) {
        let reference = SignedReference {
            file_id,
            tenant_id,
            granted_ttl_secs: prepared.granted_ttl_secs,
            token: prepared.token.clone(),
            token_expires_at: prepared.expires_at,
        };
        if let Err(err) = self.repo.upsert(reference).await {
            warn!(file_id = %file_id, error = %err, "failed to persist signed reference");
        }
    }

    /// Resolve the download locator for a stored file.
    ///
    /// Public objects get a plain URL. Private objects reuse the
    /// remembered token while it stays comfortably ahead of expiry; an
    /// explicit `requested_ttl_secs` always mints afresh.
    pub async fn locator_for(
        &self,
        file: &FileObject,
        custom_domain: Option<&str>,
        requested_ttl_secs: Option<i64>,
        limits: &EffectiveLimits,
    ) -> Result<Locator, ReferenceError> {
        if file.visibility == Visibility::Public {
            return Ok(Locator {
                url: self.public_url(&file.object_key, custom_domain),
                granted_ttl_secs: None,
                expires_at: None,
            });
        }

        if requested_ttl_secs.is_none() {
            if let Some(existing) = self.repo.find(file.id).await? {
                if existing.token_expires_at > Utc::now() + self.renewal_margin {
                    return Ok(Locator {
                        url: self.private_url(
                            &file.object_key,
                            &existing.token,
                            custom_domain,
                        ),
                        granted_ttl_secs: Some(existing.granted_ttl_secs),
                        expires_at: Some(existing.token_expires_at),
                    });
                }
            }
        }

        let prepared = self
            .prepare(&file.object_key, custom_domain, requested_ttl_secs, limits)
            .await?;
        self.remember(file.id, file.tenant_id, &prepared).await;
        Ok(Locator {
            url: prepared.url,
            granted_ttl_secs: Some(prepared.granted_ttl_secs),
            expires_at: Some(prepared.expires_at),
        })
    }

    /// Renew every reference expiring within the margin.
    ///
    /// Each reference renews for its own granted window, so a grant
    /// clamped by plan limits stays clamped forever. Failures leave the
    /// row untouched for the next sweep.
    pub async fn renew_due(&self, now: DateTime<Utc>, limit: u64) -> RenewalStats {
        let cutoff = now + self.renewal_margin;
        let due = match self.repo.due_for_renewal(cutoff, limit).await {
            Ok(due) => due,
            Err(err) => {
                warn!(error = %err, "renewal scan failed");
                return RenewalStats::default();
            }
        };

        let mut stats = RenewalStats::default();
        for ctx in due {
            stats.examined += 1;
            match self.renew_one(&ctx).await {
                Ok(()) => stats.renewed += 1,
                Err(err) => {
                    stats.failed += 1;
                    warn!(
                        file_id = %ctx.reference.file_id,
                        error = %err,
                        "reference renewal failed, leaving for next sweep"
                    );
                }
            }
        }
        if stats.examined > 0 {
            info!(
                renewed = stats.renewed,
                failed = stats.failed,
                "reference renewal sweep finished"
            );
        }
        stats
    }

    async fn renew_one(&self, ctx: &RenewalContext) -> Result<(), ReferenceError> {
        let bucket = self.buckets.for_visibility(ctx.visibility);
        let granted = ctx.reference.granted_ttl_secs.clamp(1, BACKEND_MAX_TTL_SECS);
        let grant = self
            .store
            .download_authorization(&bucket.id, &ctx.object_key, granted)
            .await?;
        self.repo
            .upsert(SignedReference {
                token: grant.token,
                token_expires_at: Utc::now() + Duration::seconds(granted),
                granted_ttl_secs: granted,
                ..ctx.reference.clone()
            })
            .await
    }

    fn private_url(&self, object_key: &str, token: &str, custom_domain: Option<&str>) -> String {
        format!(
            "{}/file/{}/{}?Authorization={}",
            self.base_url(custom_domain),
            self.buckets.private.name,
            encode_object_key(object_key),
            encode_query_value(token)
        )
    }

    fn base_url(&self, custom_domain: Option<&str>) -> String {
        match custom_domain {
            Some(domain) if !domain.trim().is_empty() => normalize_domain(domain),
            _ => self.download_base_url.trim_end_matches('/').to_string(),
        }
    }
}

fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}
