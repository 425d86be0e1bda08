//! Signed reference types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::file::Visibility;

/// A remembered download token for one private file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedReference {
    /// File the token belongs to.
    pub file_id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Validity window the token was granted for, in seconds. Renewals
    /// reuse this window so plan clamping survives them.
    pub granted_ttl_secs: i64,
    /// The authorization token itself.
    pub token: String,
    /// When the token stops working.
    pub token_expires_at: DateTime<Utc>,
}

/// A freshly minted reference that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct PreparedReference {
    /// Full download URL including the token.
    pub url: String,
    /// The authorization token.
    pub token: String,
    /// Validity window actually granted, after clamping.
    pub granted_ttl_secs: i64,
    /// When the token stops working.
    pub expires_at: DateTime<Utc>,
}

/// What a client needs to fetch a file. Public objects carry only a
/// URL; private ones also report the granted window.
#[derive(Debug, Clone, Serialize)]
pub struct Locator {
    /// Download URL, token included for private objects.
    pub url: String,
    /// Granted validity in seconds, private objects only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_ttl_secs: Option<i64>,
    /// Token expiry, private objects only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A due reference joined with what renewal needs to re-mint it.
#[derive(Debug, Clone)]
pub struct RenewalContext {
    /// The reference to renew.
    pub reference: SignedReference,
    /// Key of the file the reference points at.
    pub object_key: String,
    /// Visibility of that file, which picks the bucket.
    pub visibility: Visibility,
}

/// Counters from one renewal sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenewalStats {
    /// References the sweep looked at.
    pub examined: u64,
    /// References renewed successfully.
    pub renewed: u64,
    /// References left behind after a failure.
    pub failed: u64,
}
