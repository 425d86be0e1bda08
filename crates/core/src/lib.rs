//! Core business logic for Vaulta.
//!
//! This crate contains pure business logic with ZERO web-framework or
//! database dependencies. All domain types, quota rules, and lifecycle
//! decisions live here; persistence and the storage backend are injected
//! behind the repository and remote-store traits each module defines.
//!
//! # Modules
//!
//! - `plan` - Plan catalog, overrides, and effective limits
//! - `quota` - Storage and request-count accounting
//! - `file` - File metadata domain types
//! - `placement` - Naming, collision handling, and backend placement
//! - `reference` - Signed download references and renewal
//! - `deletion` - Deletion queue reconciliation
//! - `upload` - The upload orchestration pipeline
//! - `remote` - The object-storage collaborator protocol
//! - `tenant` - Tenant identity

pub mod deletion;
pub mod file;
pub mod placement;
pub mod plan;
pub mod quota;
pub mod reference;
pub mod remote;
pub mod tenant;
pub mod upload;
