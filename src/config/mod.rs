use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port for the HTTP server (default: 3000)
    pub port: u16,

    /// Concurrent upload/update/link/archive calls (default: 10)
    pub file_ops_concurrency_limit: usize,

    /// Concurrent listing calls (default: 5)
    pub list_ops_concurrency_limit: usize,

    /// Maximum request body size in bytes (default: 1 GB)
    pub max_body_size: usize,

    /// Lifetime of generated download links (default: 1 hour)
    pub presign_ttl: Duration,

    /// Grace period for in-flight calls on shutdown (default: 10 seconds)
    pub shutdown_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            file_ops_concurrency_limit: 10,
            list_ops_concurrency_limit: 5,
            max_body_size: 1024 * 1024 * 1024, // 1 GB
            presign_ttl: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn positive(value: Option<usize>) -> Option<usize> {
    value.filter(|v| *v > 0)
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: parse_var("GATEWAY_PORT").unwrap_or(default.port),

            file_ops_concurrency_limit: positive(parse_var("GATEWAY_FILE_OPS_CONCURRENCY_LIMIT"))
                .unwrap_or(default.file_ops_concurrency_limit),

            list_ops_concurrency_limit: positive(parse_var("GATEWAY_LIST_OPS_CONCURRENCY_LIMIT"))
                .unwrap_or(default.list_ops_concurrency_limit),

            max_body_size: positive(parse_var("GATEWAY_MAX_BODY_SIZE"))
                .unwrap_or(default.max_body_size),

            presign_ttl: parse_var("GATEWAY_PRESIGN_TTL_SECS")
                .filter(|v: &u64| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.presign_ttl),

            shutdown_timeout: parse_var("GATEWAY_SHUTDOWN_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(default.shutdown_timeout),
        }
    }

    /// Create config for development and tests (small pools, short links)
    pub fn development() -> Self {
        Self {
            port: 3000,
            file_ops_concurrency_limit: 4,
            list_ops_concurrency_limit: 2,
            max_body_size: 64 * 1024 * 1024,
            presign_ttl: Duration::from_secs(300),
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

/// Object storage connection settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Endpoint, either `host:port` or a full URL
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Use https when the endpoint has no scheme (default: false)
    pub use_ssl: bool,
    /// Region sent to the backend (default: "us-east-1")
    pub region: String,
}

impl StorageConfig {
    /// Load storage settings; endpoint, credentials and bucket are required.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: env::var("MINIO_ENDPOINT").context("MINIO_ENDPOINT must be set")?,
            access_key: env::var("MINIO_ACCESS_KEY").context("MINIO_ACCESS_KEY must be set")?,
            secret_key: env::var("MINIO_SECRET_KEY").context("MINIO_SECRET_KEY must be set")?,
            bucket: env::var("MINIO_BUCKET").context("MINIO_BUCKET must be set")?,
            use_ssl: env::var("MINIO_USE_SSL")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
            region: env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        })
    }

    /// Endpoint as a URL the S3 client accepts.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            self.endpoint.clone()
        } else if self.use_ssl {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}
