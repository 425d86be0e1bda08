//! Database seeder for Vaulta development and testing.
//!
//! Seeds demo tenants, their API keys, and a plan override for local
//! development. Run the migrator first so the plan rows exist.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;
use vaulta_db::entities::{api_keys, plan_overrides, tenants};

/// Free-plan demo tenant (consistent for all seeds)
const DEMO_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Paid tenant with a custom domain and an override
const STUDIO_TENANT_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Internal tenant whose requests are never counted
const INTERNAL_TENANT_ID: &str = "00000000-0000-0000-0000-000000000003";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = vaulta_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding demo tenant...");
    seed_tenant(
        &db,
        DEMO_TENANT_ID,
        "Demo",
        "free",
        None,
        false,
        "vk_test_demo_0000000000000001",
    )
    .await;

    println!("Seeding studio tenant...");
    seed_tenant(
        &db,
        STUDIO_TENANT_ID,
        "Studio",
        "paid",
        Some("cdn.studio.example"),
        false,
        "vk_test_studio_000000000000002",
    )
    .await;

    println!("Seeding internal tenant...");
    seed_tenant(
        &db,
        INTERNAL_TENANT_ID,
        "Vaulta Internal",
        "paid",
        None,
        true,
        "vk_test_internal_00000000000003",
    )
    .await;

    println!("Seeding studio plan override...");
    seed_studio_override(&db).await;

    println!("Seeding complete!");
}

fn tenant_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap()
}

/// Seeds one tenant and its API key, skipping rows that already exist.
async fn seed_tenant(
    db: &DatabaseConnection,
    id: &str,
    name: &str,
    plan_name: &str,
    custom_domain: Option<&str>,
    is_internal: bool,
    api_key: &str,
) {
    let id = tenant_id(id);

    if tenants::Entity::find_by_id(id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Tenant {name} already exists, skipping...");
        return;
    }

    let tenant = tenants::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        plan_name: Set(plan_name.to_string()),
        storage_used_bytes: Set(0),
        custom_domain: Set(custom_domain.map(str::to_string)),
        is_internal: Set(is_internal),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };
    if let Err(e) = tenant.insert(db).await {
        eprintln!("Failed to insert tenant {name}: {e}");
        return;
    }

    let key = api_keys::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(id),
        key: Set(api_key.to_string()),
        active: Set(true),
        created_at: Set(Utc::now().into()),
    };
    if let Err(e) = key.insert(db).await {
        eprintln!("Failed to insert API key for {name}: {e}");
    } else {
        println!("  Created tenant {name} with key {api_key}");
    }
}

/// Grants the studio tenant more storage than its base plan carries.
/// Every other limit stays null and inherits from the plan.
async fn seed_studio_override(db: &DatabaseConnection) {
    let id = tenant_id(STUDIO_TENANT_ID);

    if plan_overrides::Entity::find_by_id(id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  Override already exists, skipping...");
        return;
    }

    let over = plan_overrides::ActiveModel {
        tenant_id: Set(id),
        price_label: Set(Some("Studio deal".to_string())),
        storage_limit_bytes: Set(Some(200 * 1024 * 1024 * 1024)),
        max_file_size_bytes: Set(None),
        max_requests_per_day: Set(None),
        max_reference_ttl_secs: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(Utc::now().into()),
    };
    if let Err(e) = over.insert(db).await {
        eprintln!("Failed to insert plan override: {e}");
    } else {
        println!("  Created storage override for the studio tenant");
    }
}
