//! Upload request and report types.

use bytes::Bytes;
use serde::Serialize;

use crate::file::{FileObject, Visibility};
use crate::placement::CollisionPolicy;
use crate::quota::RequestOrigin;
use crate::reference::Locator;

/// Ceiling on client-requested scheduled deletion.
pub const MAX_EXPIRE_DELETE_SECS: i64 = 7 * 24 * 3600;

/// One file payload from a client request.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Filename as the client sent it.
    pub original_name: String,
    /// MIME type.
    pub content_type: String,
    /// Raw bytes.
    pub payload: Bytes,
}

impl IncomingFile {
    /// Payload size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> i64 {
        i64::try_from(self.payload.len()).unwrap_or(i64::MAX)
    }
}

/// Request-level settings shared by every file in a batch.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Target folder relative to the tenant root.
    pub folder: String,
    /// Bucket routing for the whole batch.
    pub visibility: Visibility,
    /// Client-chosen filename; multi-file batches without overwrite get
    /// position suffixes before collision handling.
    pub provided_name: Option<String>,
    /// Retire the files this many seconds after upload, capped at
    /// [`MAX_EXPIRE_DELETE_SECS`].
    pub expire_delete_secs: Option<i64>,
    /// Requested private-reference lifetime; clamped to the plan.
    pub token_ttl_secs: Option<i64>,
    /// What to do when the target identity is taken.
    pub collision: CollisionPolicy,
    /// Where the request came from, for request accounting.
    pub origin: RequestOrigin,
}

/// A stored file plus its download locator.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    /// Persisted metadata row.
    pub file: FileObject,
    /// Download locator, tokened when the file is private.
    pub locator: Locator,
}

/// Per-file result inside a batch report.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The file was stored and is ready to serve.
    Uploaded(UploadedFile),
    /// The file was skipped; its siblings are unaffected.
    Failed {
        /// Filename as the client sent it.
        original_name: String,
        /// What went wrong.
        reason: String,
    },
}

/// Batch result, one entry per incoming file, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
    /// Per-file outcomes.
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    /// Number of files stored.
    #[must_use]
    pub fn uploaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, UploadOutcome::Uploaded(_)))
            .count()
    }

    /// Number of files skipped.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.uploaded()
    }
}
