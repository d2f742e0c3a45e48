use crate::clubs::{default_club_entries, ClubEntry, ClubLocationMap};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the feedback service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Photo attachment storage
    #[serde(default)]
    pub attachments: AttachmentConfig,
    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
    /// Dashboard access
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Clubs and their locations
    #[serde(default = "default_club_entries")]
    pub clubs: Vec<ClubEntry>,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Public base URL of the feedback forms, used for generated links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Run migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Which attachment backend stores uploaded photos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentBackend {
    #[default]
    Local,
    S3,
}

/// Attachment storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentConfig {
    #[serde(default)]
    pub backend: AttachmentBackend,
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// Required when `backend = "s3"`
    pub s3: Option<S3Config>,
}

/// Local filesystem storage
#[derive(Debug, Clone, Deserialize)]
pub struct LocalStorageConfig {
    /// Directory photos are written to
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// URL path the upload directory is served under
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
}

/// S3 storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// S3 bucket name for photo storage
    pub bucket: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
    /// Base URL objects are publicly reachable under (CDN, bucket website)
    pub public_url_base: Option<String>,
    /// Multipart upload threshold in bytes (5MB default)
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold_bytes: usize,
    /// Part size for multipart uploads in bytes (5MB default)
    #[serde(default = "default_part_size")]
    pub part_size_bytes: usize,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Request body limit for feedback submissions
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Dashboard access configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardConfig {
    /// Accepted bearer tokens; empty leaves the dashboard open
    #[serde(default)]
    pub bearer_tokens: Vec<String>,
}

// Default value functions
fn default_service_name() -> String {
    "feedback-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_url_prefix() -> String {
    "/uploads".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_multipart_threshold() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_part_size() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10MB
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .set_default("service.name", "feedback-service")?
            .set_default("service.log_level", "info")?
            .set_default("service.metrics_port", 9090)?
            .add_source(config::File::with_name("config/feedback").required(false))
            .add_source(config::File::with_name("/etc/feedback/feedback").required(false))
            // FEEDBACK__DATABASE__URL -> database.url
            .add_source(
                config::Environment::with_prefix("FEEDBACK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.cors_origins")
                    .with_list_parse_key("dashboard.bearer_tokens")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations serde cannot express
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.attachments.backend == AttachmentBackend::S3 && self.attachments.s3.is_none() {
            anyhow::bail!("attachments.backend is s3 but no [attachments.s3] section is set");
        }
        if let Some(s3) = &self.attachments.s3 {
            if s3.part_size_bytes < 5 * 1024 * 1024 {
                anyhow::bail!("attachments.s3.part_size_bytes must be at least 5MB");
            }
        }
        let mut seen = HashSet::new();
        for club in &self.clubs {
            if club.id.trim().is_empty() {
                anyhow::bail!("club entries must have a non-empty id");
            }
            if !seen.insert(club.id.as_str()) {
                anyhow::bail!("club '{}' is configured more than once", club.id);
            }
        }
        Ok(())
    }

    /// Club/location map shared by validation and link generation
    pub fn club_map(&self) -> ClubLocationMap {
        ClubLocationMap::new(self.clubs.clone())
    }
}

impl DatabaseConfig {
    /// Pool acquire timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Idle connection timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            url_prefix: default_url_prefix(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}
