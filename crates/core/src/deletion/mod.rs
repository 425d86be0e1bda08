//! Deferred deletion of stored objects.
//!
//! Nothing is deleted inline. Explicit deletes, overwrites, and expiry
//! all funnel through [`DeletionReconciler::retire_file`], which drops
//! the metadata row, queues a purge task, and returns the storage
//! share. A periodic sweep then purges every stored version of each
//! due task's key, tolerating objects that are already gone.

mod error;
mod reconciler;
mod types;

pub use error::DeletionError;
pub use reconciler::{DeletionQueueRepository, DeletionReconciler};
pub use types::{DeletionTask, ExpiryStats, NewDeletionTask, SweepStats};
