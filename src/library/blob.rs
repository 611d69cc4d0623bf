//! Blob storage seam.
//!
//! File bytes never pass through this service. Clients get short-lived signed
//! URLs and talk to the blob gateway directly; the library only needs to know
//! whether an object exists before it flips a file to `ready`.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ring::hmac;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use super::TenantScope;
use crate::config::{BlobConfig, MAX_URL_TTL_SECS};
use crate::{FolioError, Result};

/// Which operation a signed URL grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UrlMethod {
    /// PUT the object.
    #[serde(rename = "PUT")]
    Upload,
    /// GET the object.
    #[serde(rename = "GET")]
    Download,
}

impl UrlMethod {
    /// HTTP method the URL is valid for.
    pub fn as_str(&self) -> &'static str {
        match self {
            UrlMethod::Upload => "PUT",
            UrlMethod::Download => "GET",
        }
    }
}

impl fmt::Display for UrlMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A time-limited URL for one blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    /// The URL.
    pub url: String,
    /// HTTP method to use.
    pub method: UrlMethod,
    /// When the URL stops working.
    pub expires_at: DateTime<Utc>,
}

/// External blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Issue a URL the client can upload `blob_name` to.
    async fn upload_url(&self, blob_name: &str, content_type: &str) -> Result<SignedUrl>;

    /// Issue a URL the client can download `blob_name` from, saved as `filename`.
    async fn download_url(&self, blob_name: &str, filename: &str) -> Result<SignedUrl>;

    /// Whether the object has been written.
    async fn exists(&self, blob_name: &str) -> Result<bool>;
}

/// Generate an opaque storage key for a new file in `scope`.
///
/// The key never contains anything the client sent.
pub fn generate_blob_name(scope: TenantScope) -> String {
    format!("{}/{}/{}", scope.org_id, scope.project_id, Uuid::new_v4())
}

/// Blob store backed by a local directory served by an upload gateway.
///
/// URLs are signed with HMAC-SHA256 over method, key and expiry.
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: Url,
    key: hmac::Key,
    upload_ttl: Duration,
    download_ttl: Duration,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore from configuration.
    pub fn new(config: &BlobConfig) -> Result<Self> {
        if config.signing_secret.is_empty() {
            return Err(FolioError::Config(
                "blob.signing_secret must be set".to_string(),
            ));
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FolioError::Config(format!("invalid blob.base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FolioError::Config(format!(
                "invalid blob.base_url: {}",
                config.base_url
            )));
        }

        Ok(Self {
            root: PathBuf::from(&config.root),
            base_url,
            key: hmac::Key::new(hmac::HMAC_SHA256, config.signing_secret.as_bytes()),
            upload_ttl: url_ttl("upload_url_ttl_secs", config.upload_url_ttl_secs)?,
            download_ttl: url_ttl("download_url_ttl_secs", config.download_url_ttl_secs)?,
        })
    }

    /// Directory objects are stored under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sign(&self, method: UrlMethod, blob_name: &str, expires: i64) -> String {
        hex::encode(hmac::sign(&self.key, &signing_input(method, blob_name, expires)))
    }

    fn signed_url(
        &self,
        method: UrlMethod,
        blob_name: &str,
        ttl: Duration,
        extra: &[(&str, &str)],
    ) -> Result<SignedUrl> {
        let expires_at = Utc::now() + ttl;
        let expires = expires_at.timestamp();

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FolioError::Blob("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(blob_name.split('/'));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("expires", &expires.to_string());
            query.append_pair("signature", &self.sign(method, blob_name, expires));
            for (name, value) in extra {
                query.append_pair(name, value);
            }
        }

        Ok(SignedUrl {
            url: url.into(),
            method,
            expires_at,
        })
    }
}

fn url_ttl(name: &str, secs: u64) -> Result<Duration> {
    if secs == 0 || secs > MAX_URL_TTL_SECS {
        return Err(FolioError::Config(format!(
            "blob.{name} must be between 1 and {MAX_URL_TTL_SECS}"
        )));
    }
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| FolioError::Config(format!("blob.{name} is out of range")))
}

fn signing_input(method: UrlMethod, blob_name: &str, expires: i64) -> Vec<u8> {
    format!("{}\n{}\n{}", method.as_str(), blob_name, expires).into_bytes()
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload_url(&self, blob_name: &str, content_type: &str) -> Result<SignedUrl> {
        self.signed_url(
            UrlMethod::Upload,
            blob_name,
            self.upload_ttl,
            &[("content_type", content_type)],
        )
    }

    async fn download_url(&self, blob_name: &str, filename: &str) -> Result<SignedUrl> {
        self.signed_url(
            UrlMethod::Download,
            blob_name,
            self.download_ttl,
            &[("filename", filename)],
        )
    }

    async fn exists(&self, blob_name: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.root.join(blob_name)).await?)
    }
}

impl fmt::Debug for LocalBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBlobStore")
            .field("root", &self.root)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> BlobConfig {
        BlobConfig {
            enabled: true,
            root: root.to_string_lossy().into_owned(),
            base_url: "https://blobs.example.com/store".to_string(),
            signing_secret: "test-secret".to_string(),
            upload_url_ttl_secs: 900,
            download_url_ttl_secs: 300,
        }
    }

    fn query_value(url: &str, name: &str) -> Option<String> {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    fn verify(
        store: &LocalBlobStore,
        method: UrlMethod,
        blob_name: &str,
        expires: i64,
        signature: &str,
    ) -> bool {
        if expires < Utc::now().timestamp() {
            return false;
        }
        let Ok(tag) = hex::decode(signature) else {
            return false;
        };
        hmac::verify(&store.key, &signing_input(method, blob_name, expires), &tag).is_ok()
    }

    #[test]
    fn test_generate_blob_name() {
        let scope = TenantScope::new(4, 17);
        let a = generate_blob_name(scope);
        let b = generate_blob_name(scope);

        assert!(a.starts_with("4/17/"));
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.rsplit('/').next().unwrap()).is_ok());
    }

    #[test]
    fn test_new_requires_secret() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.signing_secret.clear();

        assert!(matches!(LocalBlobStore::new(&cfg), Err(FolioError::Config(_))));
    }

    #[test]
    fn test_new_rejects_out_of_range_ttls() {
        let dir = tempfile::tempdir().unwrap();

        for secs in [0, MAX_URL_TTL_SECS + 1, 10_000_000_000_000_000, u64::MAX] {
            let mut cfg = config(dir.path());
            cfg.upload_url_ttl_secs = secs;
            assert!(matches!(LocalBlobStore::new(&cfg), Err(FolioError::Config(_))));

            let mut cfg = config(dir.path());
            cfg.download_url_ttl_secs = secs;
            assert!(matches!(LocalBlobStore::new(&cfg), Err(FolioError::Config(_))));
        }

        let mut cfg = config(dir.path());
        cfg.upload_url_ttl_secs = MAX_URL_TTL_SECS;
        assert!(LocalBlobStore::new(&cfg).is_ok());
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.base_url = "not a url".to_string();

        assert!(matches!(LocalBlobStore::new(&cfg), Err(FolioError::Config(_))));
    }

    #[tokio::test]
    async fn test_upload_url_is_signed() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path())).unwrap();

        let signed = store.upload_url("1/2/abc", "application/pdf").await.unwrap();

        assert_eq!(signed.method, UrlMethod::Upload);
        assert!(signed
            .url
            .starts_with("https://blobs.example.com/store/1/2/abc?"));
        assert!(signed.expires_at > Utc::now());

        let expires: i64 = query_value(&signed.url, "expires").unwrap().parse().unwrap();
        let signature = query_value(&signed.url, "signature").unwrap();
        assert_eq!(expires, signed.expires_at.timestamp());
        assert!(verify(&store, UrlMethod::Upload, "1/2/abc", expires, &signature));
        assert!(!verify(&store, UrlMethod::Download, "1/2/abc", expires, &signature));
        assert!(!verify(&store, UrlMethod::Upload, "1/2/abd", expires, &signature));
        assert!(!verify(&store, UrlMethod::Upload, "1/2/abc", expires, "zz"));
    }

    #[tokio::test]
    async fn test_download_url_carries_filename() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path())).unwrap();

        let signed = store.download_url("1/2/abc", "Level 3 plan.pdf").await.unwrap();

        assert_eq!(signed.method, UrlMethod::Download);
        assert_eq!(
            query_value(&signed.url, "filename").as_deref(),
            Some("Level 3 plan.pdf")
        );
        assert!(signed.expires_at <= Utc::now() + Duration::seconds(300));
    }

    #[test]
    fn test_expired_signature_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path())).unwrap();

        let past = Utc::now().timestamp() - 10;
        let signature = store.sign(UrlMethod::Download, "1/2/abc", past);
        assert!(!verify(&store, UrlMethod::Download, "1/2/abc", past, &signature));
    }

    #[tokio::test]
    async fn test_exists() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(&config(dir.path())).unwrap();

        assert!(!store.exists("1/2/abc").await.unwrap());

        std::fs::create_dir_all(dir.path().join("1/2")).unwrap();
        std::fs::write(dir.path().join("1/2/abc"), b"%PDF").unwrap();

        assert!(store.exists("1/2/abc").await.unwrap());
    }
}
