use crate::registry::{ContentTypePolicy, DEFAULT_PRESIGN_EXPIRY, RegistrySettings};
use crate::storage::{DEFAULT_PAGE_SIZE, S3StorageConfig};
use serde::Deserialize;
use std::env::vars;
use std::fmt::Display;
use std::time::Duration;
use tracing::info;

const DEFAULT_BUCKET: &str = "test-bucket";
const DEFAULT_STORAGE_CLASS: &str = "STANDARD";
const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, Deserialize)]
pub enum Env {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "test")]
    Test,
    #[serde(rename = "prod")]
    Prod,
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Env::Local => write!(f, "local"),
            Env::Test => write!(f, "test"),
            Env::Prod => write!(f, "prod"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StorageBackend {
    #[serde(rename = "s3")]
    S3,
    #[serde(rename = "memory")]
    Memory,
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

// The final, validated configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    env: Env,
    server_addr: String,
    port: u16,
    storage_backend: StorageBackend,
    s3_bucket: String,
    s3_storage_class: String,
    s3_region: String,
    s3_endpoint: Option<String>,
    s3_access_key_id: Option<String>,
    s3_secret_access_key: Option<String>,
    list_page_size: usize,
    presign_expiry: Duration,
    content_type_policy: ContentTypePolicy,
}

// An intermediate struct for deserializing environment variables
// where most values are optional.
#[derive(Deserialize)]
struct RawConfig {
    env: Env,
    server_addr: Option<String>,
    port: Option<u16>,
    storage_backend: Option<StorageBackend>,
    s3_bucket: Option<String>,
    s3_storage_class: Option<String>,
    s3_region: Option<String>,
    s3_endpoint: Option<String>,
    s3_access_key_id: Option<String>,
    s3_secret_access_key: Option<String>,
    list_page_size: Option<usize>,
    presign_expiry_secs: Option<u64>,
    allowed_content_types: Option<String>,
}

impl Config {
    /// Create a test configuration backed by in-memory storage.
    ///
    /// Available to unit and integration tests; not meant for production.
    pub fn new_for_test() -> Self {
        Self {
            env: Env::Local,
            server_addr: "127.0.0.1".to_owned(),
            port: 8080,
            storage_backend: StorageBackend::Memory,
            s3_bucket: DEFAULT_BUCKET.to_owned(),
            s3_storage_class: DEFAULT_STORAGE_CLASS.to_owned(),
            s3_region: DEFAULT_REGION.to_owned(),
            s3_endpoint: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            list_page_size: DEFAULT_PAGE_SIZE,
            presign_expiry: DEFAULT_PRESIGN_EXPIRY,
            content_type_policy: ContentTypePolicy::default(),
        }
    }

    pub fn environment(&self) -> &Env {
        &self.env
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_local(&self) -> bool {
        matches!(self.env, Env::Local)
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn s3_bucket(&self) -> &str {
        &self.s3_bucket
    }

    pub fn list_page_size(&self) -> usize {
        self.list_page_size
    }

    pub fn s3_storage_config(&self) -> S3StorageConfig {
        S3StorageConfig {
            bucket: self.s3_bucket.clone(),
            region: self.s3_region.clone(),
            endpoint: self.s3_endpoint.clone(),
            access_key_id: self.s3_access_key_id.clone(),
            secret_access_key: self.s3_secret_access_key.clone(),
            storage_class: self.s3_storage_class.clone(),
            page_size: self.list_page_size,
        }
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            bucket: self.s3_bucket.clone(),
            storage_class: self.s3_storage_class.clone(),
            policy: self.content_type_policy.clone(),
            presign_expiry: self.presign_expiry,
        }
    }

    /// Initializes configuration by reading from environment variables
    /// and applying environment-aware defaults.
    pub fn init() -> anyhow::Result<Self> {
        info!("Loading configuration from environment variables");

        let raw_config: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw_config)
    }

    fn from_raw(raw_config: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            env,
            server_addr,
            port,
            storage_backend,
            s3_bucket,
            s3_storage_class,
            s3_region,
            s3_endpoint,
            s3_access_key_id,
            s3_secret_access_key,
            list_page_size,
            presign_expiry_secs,
            allowed_content_types,
        } = raw_config;

        let server_addr = match server_addr {
            Some(addr) => addr,
            None => {
                let default_addr = match env {
                    Env::Local => "127.0.0.1",
                    _ => "0.0.0.0",
                };
                info!(
                    "SERVER_ADDR not set, defaulting to {} for {} environment",
                    default_addr, env
                );
                default_addr.to_owned()
            }
        };

        let port = match port {
            Some(port) => port,
            None if matches!(env, Env::Local) => {
                info!("PORT not set, defaulting to 8080 for local environment");
                8080
            }
            None => anyhow::bail!("PORT must be set for {} environment", env),
        };

        let storage_backend = storage_backend.unwrap_or(StorageBackend::S3);
        if storage_backend == StorageBackend::Memory && matches!(env, Env::Prod) {
            anyhow::bail!("STORAGE_BACKEND=memory is not allowed for {} environment", env);
        }

        let s3_bucket = match s3_bucket {
            Some(bucket) => bucket,
            None if matches!(env, Env::Prod) && storage_backend == StorageBackend::S3 => {
                anyhow::bail!("S3_BUCKET must be set for {} environment", env)
            }
            None => DEFAULT_BUCKET.to_owned(),
        };

        if s3_access_key_id.is_some() != s3_secret_access_key.is_some() {
            anyhow::bail!("S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together");
        }

        let list_page_size = list_page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if list_page_size == 0 {
            anyhow::bail!("LIST_PAGE_SIZE must be greater than zero");
        }

        let content_type_policy = match allowed_content_types {
            Some(list) => {
                let policy = ContentTypePolicy::from_list(&list);
                if policy.allowed().is_empty() {
                    anyhow::bail!("ALLOWED_CONTENT_TYPES must name at least one content type");
                }
                policy
            }
            None => ContentTypePolicy::default(),
        };

        Ok(Config {
            env,
            server_addr,
            port,
            storage_backend,
            s3_bucket,
            s3_storage_class: s3_storage_class.unwrap_or_else(|| DEFAULT_STORAGE_CLASS.to_owned()),
            s3_region: s3_region.unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            s3_endpoint,
            s3_access_key_id,
            s3_secret_access_key,
            list_page_size,
            presign_expiry: presign_expiry_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PRESIGN_EXPIRY),
            content_type_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn local_defaults() {
        let raw: RawConfig = from_iter(vec![("ENV", "local")]).expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("local config should build");
        assert_eq!(config.server_addr(), "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.storage_backend(), StorageBackend::S3);
        assert_eq!(config.s3_bucket(), "test-bucket");
        assert_eq!(config.list_page_size(), 1000);

        let settings = config.registry_settings();
        assert_eq!(settings.storage_class, "STANDARD");
        assert_eq!(settings.presign_expiry, Duration::from_secs(60));
        assert!(settings.policy.is_acceptable("application/pdf"));
    }

    #[test]
    fn prod_requires_port_and_bucket() {
        let raw: RawConfig = from_iter(vec![("ENV", "prod")]).expect("RawConfig should deserialize");
        let err = Config::from_raw(raw).unwrap_err().to_string();
        assert!(err.contains("PORT"));

        let raw: RawConfig = from_iter(vec![("ENV", "prod"), ("PORT", "8080")])
            .expect("RawConfig should deserialize");
        let err = Config::from_raw(raw).unwrap_err().to_string();
        assert!(err.contains("S3_BUCKET"));
    }

    #[test]
    fn prod_builds_with_s3_settings() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "prod"),
            ("PORT", "9000"),
            ("S3_BUCKET", "files"),
            ("S3_STORAGE_CLASS", "STANDARD_IA"),
            ("S3_REGION", "eu-west-1"),
            ("S3_ACCESS_KEY_ID", "key"),
            ("S3_SECRET_ACCESS_KEY", "secret"),
            ("LIST_PAGE_SIZE", "250"),
            ("PRESIGN_EXPIRY_SECS", "300"),
        ])
        .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("prod config should build");
        assert_eq!(config.server_addr(), "0.0.0.0");
        assert_eq!(config.port(), 9000);

        let s3 = config.s3_storage_config();
        assert_eq!(s3.bucket, "files");
        assert_eq!(s3.region, "eu-west-1");
        assert_eq!(s3.storage_class, "STANDARD_IA");
        assert_eq!(s3.page_size, 250);
        assert_eq!(s3.access_key_id.as_deref(), Some("key"));

        let settings = config.registry_settings();
        assert_eq!(settings.storage_class, "STANDARD_IA");
        assert_eq!(settings.presign_expiry, Duration::from_secs(300));
    }

    #[test]
    fn memory_backend_rejected_for_prod() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "prod"),
            ("PORT", "8080"),
            ("STORAGE_BACKEND", "memory"),
        ])
        .expect("RawConfig should deserialize");

        let err = Config::from_raw(raw).unwrap_err().to_string();
        assert!(err.contains("STORAGE_BACKEND"));
    }

    #[test]
    fn access_keys_must_come_in_pairs() {
        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("S3_ACCESS_KEY_ID", "key")])
            .expect("RawConfig should deserialize");

        let err = Config::from_raw(raw).unwrap_err().to_string();
        assert!(err.contains("S3_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn allowed_content_types_override() {
        let raw: RawConfig = from_iter(vec![
            ("ENV", "test"),
            ("PORT", "8080"),
            ("ALLOWED_CONTENT_TYPES", "image/png,image/webp"),
        ])
        .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("test config should build");
        let policy = config.registry_settings().policy;
        assert!(policy.is_acceptable("image/webp"));
        assert!(!policy.is_acceptable("application/pdf"));
    }

    #[test]
    fn zero_page_size_rejected() {
        let raw: RawConfig = from_iter(vec![("ENV", "local"), ("LIST_PAGE_SIZE", "0")])
            .expect("RawConfig should deserialize");
        assert!(Config::from_raw(raw).is_err());
    }
}
