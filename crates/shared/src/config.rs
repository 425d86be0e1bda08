//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Remote object-storage configuration.
    pub remote_store: RemoteStoreConfig,
    /// Background lifecycle job configuration.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins whose requests skip per-tenant request counting.
    #[serde(default)]
    pub trusted_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            trusted_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Remote object-storage (B2-compatible) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStoreConfig {
    /// Base URL of the account-authorization endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Application key id.
    pub key_id: String,
    /// Application key secret.
    pub application_key: String,
    /// Bucket that serves public objects.
    pub public_bucket: BucketConfig,
    /// Bucket that serves private (signed) objects.
    pub private_bucket: BucketConfig,
    /// Base URL used when rendering download locators for tenants
    /// without a custom domain.
    pub download_base_url: String,
    /// How long a cached session token is considered fresh, in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Per-call timeout for backend requests, in seconds.
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

/// A single backend bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct BucketConfig {
    /// Backend bucket id.
    pub id: String,
    /// Backend bucket name (appears in download paths).
    pub name: String,
}

fn default_api_url() -> String {
    "https://api.backblazeb2.com".to_string()
}

fn default_session_ttl() -> u64 {
    3000 // 50 minutes
}

fn default_remote_timeout() -> u64 {
    30
}

/// Background lifecycle job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Plan-catalog cache TTL in seconds.
    #[serde(default = "default_plan_cache_ttl")]
    pub plan_cache_ttl_secs: u64,
    /// Interval between deletion-reconciler sweeps, in seconds.
    #[serde(default = "default_deletion_sweep")]
    pub deletion_sweep_secs: u64,
    /// Maximum deletion tasks processed per sweep.
    #[serde(default = "default_deletion_batch")]
    pub deletion_batch_size: u64,
    /// Interval between signed-reference renewal sweeps, in seconds.
    #[serde(default = "default_renewal_sweep")]
    pub renewal_sweep_secs: u64,
    /// References expiring within this margin are renewed, in seconds.
    #[serde(default = "default_renewal_margin")]
    pub renewal_margin_secs: u64,
    /// How many files of one upload request are processed concurrently.
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
}

fn default_plan_cache_ttl() -> u64 {
    604_800 // 7 days
}

fn default_deletion_sweep() -> u64 {
    600 // 10 minutes
}

fn default_deletion_batch() -> u64 {
    50
}

fn default_renewal_sweep() -> u64 {
    600
}

fn default_renewal_margin() -> u64 {
    3600 // renew anything expiring within the next hour
}

fn default_upload_concurrency() -> usize {
    4
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            plan_cache_ttl_secs: default_plan_cache_ttl(),
            deletion_sweep_secs: default_deletion_sweep(),
            deletion_batch_size: default_deletion_batch(),
            renewal_sweep_secs: default_renewal_sweep(),
            renewal_margin_secs: default_renewal_margin(),
            upload_concurrency: default_upload_concurrency(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("VAULTA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
