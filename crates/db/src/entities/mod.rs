//! `SeaORM` Entity definitions for all database tables.

pub mod api_keys;
pub mod deletion_tasks;
pub mod file_objects;
pub mod plan_overrides;
pub mod plans;
pub mod request_counters;
pub mod sea_orm_active_enums;
pub mod signed_references;
pub mod tenants;
