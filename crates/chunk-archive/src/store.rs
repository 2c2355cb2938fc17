//! Storage backends for archive files.
//!
//! Both backends expose the same contract: fetch a whole file by its
//! archive-relative path, `None` when it does not exist, within a deadline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use meteo_common::{ReadError, ReadResult};
use object_store::{aws::AmazonS3Builder, path::Path as ObjectPath, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Deadlines applied to upstream fetches.
///
/// Static files get a much longer deadline than chunks: they are reused
/// across requests and a slow first download is still worth caching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StoreDeadlines {
    pub chunk: Duration,
    pub static_file: Duration,
}

impl Default for StoreDeadlines {
    fn default() -> Self {
        Self {
            chunk: Duration::from_secs(20),
            static_file: Duration::from_secs(180),
        }
    }
}

/// A backend that can fetch archive files.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Fetch a whole file. `Ok(None)` when the file does not exist.
    async fn fetch(&self, path: &str, deadline: Duration) -> ReadResult<Option<Bytes>>;
}

/// Archive rooted in a local directory.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArchiveStore for LocalStore {
    async fn fetch(&self, path: &str, _deadline: Duration) -> ReadResult<Option<Bytes>> {
        let full = self.root.join(path);
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ReadError::storage(format!("read {}: {}", full.display(), e))),
        }
    }
}

/// Configuration for an S3-compatible archive bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStoreConfig {
    /// S3/MinIO endpoint URL.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// AWS region (use "us-east-1" for MinIO).
    pub region: String,
    /// Allow HTTP (for local MinIO).
    pub allow_http: bool,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://minio:9000".to_string(),
            bucket: "weather-archive".to_string(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            region: "us-east-1".to_string(),
            allow_http: true,
        }
    }
}

/// Archive in an S3-compatible object store.
pub struct RemoteStore {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl RemoteStore {
    pub fn new(config: &RemoteStoreConfig) -> ReadResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_region(&config.region);

        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| ReadError::storage(format!("failed to create S3 client: {}", e)))?;

        Ok(Self {
            store: Arc::new(store),
            bucket: config.bucket.clone(),
        })
    }

    /// Wrap an already-built object store (used by tests).
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ArchiveStore for RemoteStore {
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    async fn fetch(&self, path: &str, deadline: Duration) -> ReadResult<Option<Bytes>> {
        let location = ObjectPath::from(path);

        let fetch = async {
            match self.store.get(&location).await {
                Ok(result) => match result.bytes().await {
                    Ok(bytes) => Ok(Some(bytes)),
                    Err(e) => Err(ReadError::storage(format!("read body {}: {}", path, e))),
                },
                Err(object_store::Error::NotFound { .. }) => Ok(None),
                Err(e) => Err(ReadError::storage(format!("get {}: {}", path, e))),
            }
        };

        match tokio::time::timeout(deadline, fetch).await {
            Ok(result) => {
                if let Ok(Some(bytes)) = &result {
                    debug!(size = bytes.len(), "fetched object");
                }
                result
            }
            Err(_) => Err(ReadError::Timeout {
                path: path.to_string(),
            }),
        }
    }
}
