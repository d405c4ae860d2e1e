//! Object storage destination (S3 and S3-compatible, GCS, Azure, local, memory)

use super::key::ObjectKey;
use crate::config::DestinationConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Something that can receive a finished partition file
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload the local file under `key`, returning the full destination URI
    async fn upload(&self, local: &Path, key: &ObjectKey) -> Result<String>;

    /// Human-readable target, for logs
    fn describe(&self) -> String;
}

/// Object store destination
#[derive(Debug, Clone)]
pub struct CloudDestination {
    store: Arc<dyn ObjectStore>,
    /// Path inside the store that every key is placed under
    base: String,
    /// Scheme and authority used when reporting uploaded paths
    root: String,
}

impl CloudDestination {
    /// Build from the resolved destination config
    ///
    /// `url` wins when present; otherwise an S3 client for `bucket` is built
    /// from the explicit credentials, endpoint and region.
    pub fn from_config(config: &DestinationConfig) -> Result<Self> {
        if let Some(url) = &config.url {
            return Self::parse(url);
        }

        let bucket = config
            .bucket
            .as_deref()
            .ok_or_else(|| Error::missing_field("S3_BUCKET"))?;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&config.region)
            .with_allow_http(config.allow_http);

        if let Some(key_id) = &config.access_key_id {
            builder = builder.with_access_key_id(key_id);
        }
        if let Some(secret) = &config.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            base: String::new(),
            root: format!("s3://{bucket}"),
        })
    }

    /// Parse a destination URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3, credentials from the environment
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `file:///abs/dir/` - Local filesystem
    /// - `memory://` - In-process store
    pub fn parse(url: &str) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| Error::config(format!("Invalid destination URL '{url}': {e}")))?;
        let scheme = parsed.scheme().to_string();
        let host = parsed.host_str().unwrap_or_default().to_string();
        let base = parsed.path().trim_matches('/').to_string();

        let store: Arc<dyn ObjectStore> = match scheme.as_str() {
            "s3" => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(&host)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?,
            ),
            "gs" => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(&host)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
            ),
            "az" => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_container_name(&host)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
            ),
            "file" => {
                let dir = parsed
                    .to_file_path()
                    .map_err(|()| Error::config(format!("Invalid file URL: {url}")))?;
                std::fs::create_dir_all(&dir).map_err(|e| {
                    Error::config(format!("Failed to create directory {}: {e}", dir.display()))
                })?;
                let store = LocalFileSystem::new_with_prefix(&dir)
                    .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;
                return Ok(Self {
                    store: Arc::new(store),
                    base: String::new(),
                    root: format!("file://{}", dir.display()),
                });
            }
            "memory" => Arc::new(InMemory::new()),
            other => {
                return Err(Error::invalid_value(
                    "DESTINATION_URL",
                    format!("unsupported scheme '{other}'"),
                ))
            }
        };

        Ok(Self {
            store,
            base,
            root: format!("{scheme}://{host}"),
        })
    }

    /// Wrap an existing store
    pub fn from_store(store: Arc<dyn ObjectStore>, root: impl Into<String>) -> Self {
        Self {
            store,
            base: String::new(),
            root: root.into(),
        }
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Store path for a key
    pub fn object_path(&self, key: &ObjectKey) -> ObjectPath {
        if self.base.is_empty() {
            ObjectPath::from(key.to_string())
        } else {
            ObjectPath::from(format!("{}/{key}", self.base))
        }
    }

    /// Write bytes under `key`
    pub async fn put(&self, key: &ObjectKey, data: Bytes) -> Result<String> {
        let path = self.object_path(key);
        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::upload(key.to_string(), e.to_string()))?;
        Ok(format!("{}/{path}", self.root))
    }
}

#[async_trait]
impl Uploader for CloudDestination {
    async fn upload(&self, local: &Path, key: &ObjectKey) -> Result<String> {
        let data = tokio::fs::read(local).await.map_err(|e| {
            Error::upload(
                key.to_string(),
                format!("cannot read {}: {e}", local.display()),
            )
        })?;
        self.put(key, Bytes::from(data)).await
    }

    fn describe(&self) -> String {
        if self.base.is_empty() {
            self.root.clone()
        } else {
            format!("{}/{}", self.root, self.base)
        }
    }
}
