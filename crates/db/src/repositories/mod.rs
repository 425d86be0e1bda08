//! Repository implementations of the core storage traits.
//!
//! Each repository wraps a [`sea_orm::DatabaseConnection`] and keeps the
//! atomicity guarantees (conditional charges, counter resets, queue
//! upserts) inside single SQL statements.

pub mod deletion_task;
pub mod file_object;
pub mod plan;
pub mod quota;
pub mod signed_reference;
pub mod tenant;

pub use deletion_task::PgDeletionQueueRepository;
pub use file_object::PgFileRepository;
pub use plan::PgPlanRepository;
pub use quota::PgQuotaRepository;
pub use signed_reference::PgSignedReferenceRepository;
pub use tenant::TenantRepository;
