//! Configuration module
//!
//! This module provides configuration structures for the service, including
//! database, storage routing, authentication, and push notification settings.

use std::env;

use crate::constants::{
    DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE_BYTES,
};
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const PUSH_TIMEOUT_SECS: u64 = 10;
const PUSH_MAX_CONCURRENT_DELIVERIES: usize = 50;

/// Base configuration shared by all deployments
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
}

/// Notes portal configuration
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub base: BaseConfig,
    pub database_url: String,
    /// Externally visible base URL of this service; used to construct proxy
    /// URLs for backends without a public address.
    pub public_base_url: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub s3_public_bucket: bool,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub drive_api_base_url: String,
    pub drive_upload_base_url: String,
    pub drive_access_token: Option<String>,
    pub drive_folder_id: Option<String>,
    /// Files strictly larger than this route to the overflow backend.
    pub storage_overflow_threshold_bytes: Option<u64>,
    pub storage_overflow_backend: Option<StorageBackend>,
    // Upload limits
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    // Identity
    pub auth_required: bool,
    /// Static bearer token table as (subject, token) pairs.
    pub auth_tokens: Vec<(String, String)>,
    // Push notifications
    pub push_enabled: bool,
    pub push_api_url: String,
    pub push_server_key: Option<String>,
    pub push_timeout_seconds: u64,
    pub push_max_concurrent_deliveries: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<PortalConfig>);

impl Config {
    fn as_portal(&self) -> &PortalConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_portal().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PortalConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_portal().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_portal().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_portal().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_portal().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_portal().base.db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.as_portal().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.as_portal().database_url
    }

    pub fn public_base_url(&self) -> &str {
        &self.as_portal().public_base_url
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_portal().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_portal().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_portal().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_portal().s3_endpoint.as_deref()
    }

    pub fn s3_public_bucket(&self) -> bool {
        self.as_portal().s3_public_bucket
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_portal().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_portal().local_storage_base_url.as_deref()
    }

    pub fn drive_api_base_url(&self) -> &str {
        &self.as_portal().drive_api_base_url
    }

    pub fn drive_upload_base_url(&self) -> &str {
        &self.as_portal().drive_upload_base_url
    }

    pub fn drive_access_token(&self) -> Option<&str> {
        self.as_portal().drive_access_token.as_deref()
    }

    pub fn drive_folder_id(&self) -> Option<&str> {
        self.as_portal().drive_folder_id.as_deref()
    }

    pub fn storage_overflow_threshold_bytes(&self) -> Option<u64> {
        self.as_portal().storage_overflow_threshold_bytes
    }

    pub fn storage_overflow_backend(&self) -> Option<StorageBackend> {
        self.as_portal().storage_overflow_backend
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_portal().max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.as_portal().allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_portal().allowed_content_types
    }

    pub fn auth_required(&self) -> bool {
        self.as_portal().auth_required
    }

    pub fn auth_tokens(&self) -> &[(String, String)] {
        &self.as_portal().auth_tokens
    }

    pub fn push_enabled(&self) -> bool {
        self.as_portal().push_enabled
    }

    pub fn push_api_url(&self) -> &str {
        &self.as_portal().push_api_url
    }

    pub fn push_server_key(&self) -> Option<&str> {
        self.as_portal().push_server_key.as_deref()
    }

    pub fn push_timeout_seconds(&self) -> u64 {
        self.as_portal().push_timeout_seconds
    }

    pub fn push_max_concurrent_deliveries(&self) -> usize {
        self.as_portal().push_max_concurrent_deliveries
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.join(","))
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| DEFAULT_ALLOWED_CONTENT_TYPES.join(","))
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            environment,
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse::<StorageBackend>().ok());

        let storage_overflow_backend = env::var("STORAGE_OVERFLOW_BACKEND")
            .ok()
            .and_then(|s| s.parse::<StorageBackend>().ok());

        let auth_tokens = env::var("AUTH_TOKENS")
            .map(|raw| parse_auth_tokens(&raw))
            .unwrap_or_default();

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let config = PortalConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            public_base_url,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").or_else(|_| env::var("AWS_REGION")).ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_public_bucket: env::var("S3_PUBLIC_BUCKET")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            drive_api_base_url: env::var("DRIVE_API_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/drive/v3".to_string()),
            drive_upload_base_url: env::var("DRIVE_UPLOAD_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/upload/drive/v3".to_string()),
            drive_access_token: env::var("DRIVE_ACCESS_TOKEN").ok(),
            drive_folder_id: env::var("DRIVE_FOLDER_ID").ok(),
            storage_overflow_threshold_bytes: env::var("STORAGE_OVERFLOW_THRESHOLD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok()),
            storage_overflow_backend,
            max_file_size_bytes: env::var("MAX_FILE_SIZE_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
            allowed_extensions,
            allowed_content_types,
            auth_required: env::var("AUTH_REQUIRED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            auth_tokens,
            push_enabled: env::var("PUSH_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            push_api_url: env::var("PUSH_API_URL")
                .unwrap_or_else(|_| "https://fcm.googleapis.com/fcm/send".to_string()),
            push_server_key: env::var("PUSH_SERVER_KEY").ok(),
            push_timeout_seconds: env::var("PUSH_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(PUSH_TIMEOUT_SECS),
            push_max_concurrent_deliveries: env::var("PUSH_MAX_CONCURRENT_DELIVERIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(PUSH_MAX_CONCURRENT_DELIVERIES),
        };

        Ok(config)
    }

    /// Fail fast on inconsistent settings before any service starts.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        match self.storage_backend {
            Some(StorageBackend::S3) => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set for the s3 backend"));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set for the s3 backend"
                    ));
                }
            }
            Some(StorageBackend::Local) | None => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set for the local backend"
                    ));
                }
            }
            Some(StorageBackend::Drive) => {
                if self.drive_access_token.is_none() {
                    return Err(anyhow::anyhow!(
                        "DRIVE_ACCESS_TOKEN must be set for the drive backend"
                    ));
                }
            }
        }

        if self.storage_overflow_threshold_bytes.is_some()
            && self.storage_overflow_backend.is_none()
        {
            return Err(anyhow::anyhow!(
                "STORAGE_OVERFLOW_BACKEND must be set when STORAGE_OVERFLOW_THRESHOLD_BYTES is set"
            ));
        }

        if self.auth_required && self.auth_tokens.is_empty() {
            return Err(anyhow::anyhow!(
                "AUTH_TOKENS must be set when AUTH_REQUIRED is true"
            ));
        }

        if self.push_enabled && self.push_server_key.is_none() {
            return Err(anyhow::anyhow!(
                "PUSH_SERVER_KEY must be set when PUSH_ENABLED is true"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be greater than 0"));
        }

        Ok(())
    }
}

/// Parse `subject=token,subject2=token2` into (subject, token) pairs.
/// Malformed entries are skipped.
fn parse_auth_tokens(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let (subject, token) = entry.split_once('=')?;
            let subject = subject.trim();
            let token = token.trim();
            if subject.is_empty() || token.is_empty() {
                return None;
            }
            Some((subject.to_string(), token.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_base() -> BaseConfig {
        BaseConfig {
            server_port: 3000,
            cors_origins: vec!["*".to_string()],
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            environment: "development".to_string(),
        }
    }

    fn test_portal() -> PortalConfig {
        PortalConfig {
            base: test_base(),
            database_url: "postgres://localhost/notehive".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            storage_backend: Some(StorageBackend::Local),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_public_bucket: true,
            local_storage_path: Some("/tmp/notehive".to_string()),
            local_storage_base_url: Some("http://localhost:3000/uploads".to_string()),
            drive_api_base_url: "https://www.googleapis.com/drive/v3".to_string(),
            drive_upload_base_url: "https://www.googleapis.com/upload/drive/v3".to_string(),
            drive_access_token: None,
            drive_folder_id: None,
            storage_overflow_threshold_bytes: None,
            storage_overflow_backend: None,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            allowed_extensions: vec!["pdf".to_string(), "pptx".to_string()],
            allowed_content_types: vec!["application/pdf".to_string()],
            auth_required: false,
            auth_tokens: Vec::new(),
            push_enabled: false,
            push_api_url: "https://fcm.googleapis.com/fcm/send".to_string(),
            push_server_key: None,
            push_timeout_seconds: PUSH_TIMEOUT_SECS,
            push_max_concurrent_deliveries: PUSH_MAX_CONCURRENT_DELIVERIES,
        }
    }

    #[test]
    fn test_valid_local_config_passes_validation() {
        assert!(test_portal().validate().is_ok());
    }

    #[test]
    fn test_s3_backend_requires_bucket_and_region() {
        let mut config = test_portal();
        config.storage_backend = Some(StorageBackend::S3);
        assert!(config.validate().is_err());

        config.s3_bucket = Some("notes".to_string());
        config.s3_region = Some("eu-west-1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_drive_backend_requires_token() {
        let mut config = test_portal();
        config.storage_backend = Some(StorageBackend::Drive);
        assert!(config.validate().is_err());

        config.drive_access_token = Some("ya29.token".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overflow_threshold_requires_overflow_backend() {
        let mut config = test_portal();
        config.storage_overflow_threshold_bytes = Some(10 * 1024 * 1024);
        assert!(config.validate().is_err());

        config.storage_overflow_backend = Some(StorageBackend::Drive);
        config.drive_access_token = Some("ya29.token".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_auth_required_needs_tokens() {
        let mut config = test_portal();
        config.auth_required = true;
        assert!(config.validate().is_err());

        config.auth_tokens = vec![("alice".to_string(), "secret".to_string())];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_push_enabled_needs_server_key() {
        let mut config = test_portal();
        config.push_enabled = true;
        assert!(config.validate().is_err());

        config.push_server_key = Some("AAAA".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_auth_tokens() {
        let tokens = parse_auth_tokens("alice=s3cret, bob=hunter2 ,broken,=x,y=");
        assert_eq!(
            tokens,
            vec![
                ("alice".to_string(), "s3cret".to_string()),
                ("bob".to_string(), "hunter2".to_string()),
            ]
        );
    }
}
