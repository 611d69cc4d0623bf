//! Configuration module for Folio.

use serde::Deserialize;
use std::path::Path;

use crate::{FolioError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/folio.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Document library configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// Roles that bypass project membership checks.
    #[serde(default = "default_admin_roles")]
    pub admin_roles: Vec<String>,
}

fn default_admin_roles() -> Vec<String> {
    vec!["admin".to_string(), "superadmin".to_string()]
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            admin_roles: default_admin_roles(),
        }
    }
}

/// Blob storage configuration.
///
/// When disabled, the upload lifecycle routes answer "not implemented".
#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    /// Whether a blob store is attached.
    #[serde(default)]
    pub enabled: bool,
    /// Directory the upload gateway writes objects into.
    #[serde(default = "default_blob_root")]
    pub root: String,
    /// Public base URL of the upload/download gateway.
    #[serde(default = "default_blob_base_url")]
    pub base_url: String,
    /// Secret used to sign URLs (must be set if enabled).
    #[serde(default)]
    pub signing_secret: String,
    /// Lifetime of signed upload URLs in seconds.
    #[serde(default = "default_upload_url_ttl")]
    pub upload_url_ttl_secs: u64,
    /// Lifetime of signed download URLs in seconds.
    #[serde(default = "default_download_url_ttl")]
    pub download_url_ttl_secs: u64,
}

fn default_blob_root() -> String {
    "data/blobs".to_string()
}

fn default_blob_base_url() -> String {
    "http://localhost:8081/blobs".to_string()
}

/// Longest lifetime a signed URL may be configured with (7 days).
pub const MAX_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;

fn default_upload_url_ttl() -> u64 {
    900 // 15 minutes
}

fn default_download_url_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            root: default_blob_root(),
            base_url: default_blob_base_url(),
            signing_secret: String::new(),
            upload_url_ttl_secs: default_upload_url_ttl(),
            download_url_ttl_secs: default_download_url_ttl(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/folio.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key used to verify bearer tokens.
    #[serde(default)]
    pub jwt_secret: String,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Library configuration.
    #[serde(default)]
    pub library: LibraryConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub blob: BlobConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FolioError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FolioError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FOLIO_JWT_SECRET`: Override the JWT secret key
    /// - `FOLIO_DATABASE_PATH`: Override the database file path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(jwt_secret) = std::env::var("FOLIO_JWT_SECRET") {
            if !jwt_secret.is_empty() {
                self.web.jwt_secret = jwt_secret;
            }
        }
        if let Ok(path) = std::env::var("FOLIO_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the JWT secret is not set
    /// - the blob store is enabled without a signing secret
    /// - a signed URL lifetime is zero or longer than [`MAX_URL_TTL_SECS`]
    /// - the connection pool size is zero
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(FolioError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via FOLIO_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.blob.enabled && self.blob.signing_secret.is_empty() {
            return Err(FolioError::Config(
                "blob storage is enabled but signing_secret is not set".to_string(),
            ));
        }
        for (name, secs) in [
            ("upload_url_ttl_secs", self.blob.upload_url_ttl_secs),
            ("download_url_ttl_secs", self.blob.download_url_ttl_secs),
        ] {
            if secs == 0 || secs > MAX_URL_TTL_SECS {
                return Err(FolioError::Config(format!(
                    "blob.{name} must be between 1 and {MAX_URL_TTL_SECS}"
                )));
            }
        }
        if self.database.max_connections == 0 {
            return Err(FolioError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
