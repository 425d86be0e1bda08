//! Tenant identity as the rest of the engine sees it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant account, resolved from an API key upstream of the core
/// services. The stored-byte counter is only ever mutated through the
/// quota ledger's atomic operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant id.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Plan name; unknown names fall back to the free plan at resolution.
    pub plan_name: String,
    /// Cumulative stored bytes.
    pub storage_used_bytes: i64,
    /// Custom domain used when rendering download locators.
    pub custom_domain: Option<String>,
    /// Internal tenants skip request counting.
    pub is_internal: bool,
    /// Inactive tenants fail authentication.
    pub is_active: bool,
}
