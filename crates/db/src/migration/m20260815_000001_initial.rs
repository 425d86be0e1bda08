//! Initial database migration.
//!
//! Creates the enums, tables, and indexes backing the file lifecycle
//! engine, and seeds the built-in plan catalog.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANTS & API KEYS
        // ============================================================
        db.execute_unprepared(TENANTS_SQL).await?;
        db.execute_unprepared(API_KEYS_SQL).await?;

        // ============================================================
        // PART 3: PLAN CATALOG
        // ============================================================
        db.execute_unprepared(PLANS_SQL).await?;
        db.execute_unprepared(PLAN_OVERRIDES_SQL).await?;

        // ============================================================
        // PART 4: FILE OBJECTS
        // ============================================================
        db.execute_unprepared(FILE_OBJECTS_SQL).await?;

        // ============================================================
        // PART 5: DELETION QUEUE
        // ============================================================
        db.execute_unprepared(DELETION_TASKS_SQL).await?;

        // ============================================================
        // PART 6: REQUEST COUNTERS
        // ============================================================
        db.execute_unprepared(REQUEST_COUNTERS_SQL).await?;

        // ============================================================
        // PART 7: SIGNED REFERENCES
        // ============================================================
        db.execute_unprepared(SIGNED_REFERENCES_SQL).await?;

        // ============================================================
        // PART 8: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_PLANS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- File visibility picks the bucket an object is served from
CREATE TYPE file_visibility AS ENUM ('public', 'private');
";

const TENANTS_SQL: &str = r"
CREATE TABLE tenants (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    plan_name VARCHAR(64) NOT NULL DEFAULT 'free',
    storage_used_bytes BIGINT NOT NULL DEFAULT 0 CHECK (storage_used_bytes >= 0),
    custom_domain VARCHAR(255),
    is_internal BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const API_KEYS_SQL: &str = r"
CREATE TABLE api_keys (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    key VARCHAR(255) NOT NULL UNIQUE,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_api_keys_tenant ON api_keys(tenant_id);
";

const PLANS_SQL: &str = r"
CREATE TABLE plans (
    name VARCHAR(64) PRIMARY KEY,
    price_label VARCHAR(64) NOT NULL,
    storage_limit_bytes BIGINT,
    max_file_size_bytes BIGINT NOT NULL,
    max_requests_per_day BIGINT,
    max_reference_ttl_secs BIGINT NOT NULL,
    is_custom BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const PLAN_OVERRIDES_SQL: &str = r"
CREATE TABLE plan_overrides (
    tenant_id UUID PRIMARY KEY REFERENCES tenants(id) ON DELETE CASCADE,
    price_label VARCHAR(64),
    storage_limit_bytes BIGINT,
    max_file_size_bytes BIGINT,
    max_requests_per_day BIGINT,
    max_reference_ttl_secs BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const FILE_OBJECTS_SQL: &str = r"
CREATE TABLE file_objects (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    folder_path VARCHAR(512) NOT NULL DEFAULT '',
    file_name VARCHAR(255) NOT NULL,
    original_name VARCHAR(255) NOT NULL,
    content_type VARCHAR(255) NOT NULL,
    size_bytes BIGINT NOT NULL CHECK (size_bytes >= 0),
    visibility file_visibility NOT NULL,
    object_key VARCHAR(1024) NOT NULL,
    remote_object_id VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    scheduled_delete_at TIMESTAMPTZ,
    UNIQUE (tenant_id, folder_path, file_name, visibility)
);

CREATE INDEX idx_file_objects_listing ON file_objects(tenant_id, created_at DESC);
CREATE INDEX idx_file_objects_expiry ON file_objects(scheduled_delete_at)
    WHERE scheduled_delete_at IS NOT NULL;
";

const DELETION_TASKS_SQL: &str = r"
CREATE TABLE deletion_tasks (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    bucket_id VARCHAR(255) NOT NULL,
    object_key VARCHAR(1024) NOT NULL,
    folder_path VARCHAR(512) NOT NULL DEFAULT '',
    visibility file_visibility NOT NULL,
    remote_object_id VARCHAR(255),
    enqueued_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    expire_at TIMESTAMPTZ,
    UNIQUE (tenant_id, bucket_id, object_key)
);

CREATE INDEX idx_deletion_tasks_sweep ON deletion_tasks(enqueued_at);
";

const REQUEST_COUNTERS_SQL: &str = r"
CREATE TABLE request_counters (
    tenant_id UUID PRIMARY KEY REFERENCES tenants(id) ON DELETE CASCADE,
    count BIGINT NOT NULL DEFAULT 0 CHECK (count >= 0),
    window_started_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SIGNED_REFERENCES_SQL: &str = r"
CREATE TABLE signed_references (
    file_id UUID PRIMARY KEY REFERENCES file_objects(id) ON DELETE CASCADE,
    tenant_id UUID NOT NULL,
    granted_ttl_secs BIGINT NOT NULL,
    token VARCHAR(1024) NOT NULL,
    token_expires_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_signed_references_expiry ON signed_references(token_expires_at);
";

const SEED_PLANS_SQL: &str = r"
-- ============================================================
-- SEED: Built-in plans
-- free: 5 GiB storage, 10 MiB per file, 500 requests/day
-- paid: 100 GiB storage, 50 MiB per file, 100000 requests/day
-- Both grant up to 7 days of signed-reference validity.
-- ============================================================
INSERT INTO plans (
    name, price_label,
    storage_limit_bytes, max_file_size_bytes,
    max_requests_per_day, max_reference_ttl_secs, is_custom
) VALUES
('free', 'Free', 5368709120, 10485760, 500, 604800, false),
('paid', 'Paid', 107374182400, 52428800, 100000, 604800, false)
ON CONFLICT (name) DO NOTHING;
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS signed_references CASCADE;
DROP TABLE IF EXISTS request_counters CASCADE;
DROP TABLE IF EXISTS deletion_tasks CASCADE;
DROP TABLE IF EXISTS file_objects CASCADE;
DROP TABLE IF EXISTS plan_overrides CASCADE;
DROP TABLE IF EXISTS plans CASCADE;
DROP TABLE IF EXISTS api_keys CASCADE;
DROP TABLE IF EXISTS tenants CASCADE;

DROP TYPE IF EXISTS file_visibility CASCADE;
";
