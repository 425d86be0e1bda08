//! Plan catalog, per-tenant overrides, and effective limits.
//!
//! Plans are loaded as a whole table and cached with a long TTL; a
//! tenant's override is fetched per resolution and merged field-wise on
//! top of its base plan. Resolution never fails a request: unknown plan
//! names fall back to the free plan, and a broken store falls back to
//! built-in defaults.

mod catalog;
mod error;
mod types;

pub use catalog::{PlanCatalog, PlanRepository};
pub use error::PlanError;
pub use types::{EffectiveLimits, FREE_PLAN, Plan, PlanOverride};
