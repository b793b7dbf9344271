//! Blob store configuration.

use std::path::PathBuf;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::backend::{ObjectStoreBackend, ObjectStoreClient};
use crate::providers::{LocalCredentials, LocalProvider, MemoryCredentials, MemoryProvider, Provider};
use crate::{BlobStore, Error, Result, TRACING_TARGET_PROVIDER};

// Default values
const DEFAULT_STORAGE_URL: &str = "/files/";
const DEFAULT_COLLECTION: &str = "fs";
const DEFAULT_LOCAL_ROOT: &str = "./blobs";

/// Which object store provider backs the blob store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Volatile in-process storage.
    Memory,
    /// Directory on the local filesystem.
    #[default]
    Local,
    /// S3-compatible bucket (requires the `aws` feature).
    S3,
}

/// Configuration for a blob store and its backing provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct StoreConfig {
    /// Base URL that retrieval URLs are built on
    #[cfg_attr(
        feature = "config",
        arg(long = "storage-url", env = "STORAGE_URL", default_value = DEFAULT_STORAGE_URL)
    )]
    pub storage_url: String,

    /// Collection (bucket prefix) that blobs are written into
    #[cfg_attr(
        feature = "config",
        arg(long = "collection", env = "STORAGE_COLLECTION", default_value = DEFAULT_COLLECTION)
    )]
    pub collection: String,

    /// Object store provider
    #[cfg_attr(
        feature = "config",
        arg(long = "provider", env = "STORAGE_PROVIDER", value_enum, default_value_t = ProviderKind::Local)
    )]
    #[serde(default)]
    pub provider: ProviderKind,

    /// Root directory for the local provider
    #[cfg_attr(
        feature = "config",
        arg(long = "local-root", env = "STORAGE_LOCAL_ROOT", default_value = DEFAULT_LOCAL_ROOT)
    )]
    pub local_root: PathBuf,

    /// Bucket name for the S3 provider
    #[cfg_attr(feature = "config", arg(long = "s3-bucket", env = "S3_BUCKET"))]
    pub s3_bucket: Option<String>,

    /// Region for the S3 provider
    #[cfg_attr(feature = "config", arg(long = "s3-region", env = "S3_REGION"))]
    pub s3_region: Option<String>,

    /// Endpoint URL for S3-compatible services
    #[cfg_attr(feature = "config", arg(long = "s3-endpoint", env = "S3_ENDPOINT"))]
    pub s3_endpoint: Option<String>,

    /// Access key ID for the S3 provider
    #[cfg_attr(feature = "config", arg(long = "s3-access-key-id", env = "S3_ACCESS_KEY_ID"))]
    pub s3_access_key_id: Option<String>,

    /// Secret access key for the S3 provider
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-secret-access-key", env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing)]
    pub s3_secret_access_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            provider: ProviderKind::default(),
            local_root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
        }
    }
}

impl StoreConfig {
    /// Create an in-memory configuration for the given collection.
    pub fn memory(collection: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Memory,
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_storage_url(mut self, url: impl Into<String>) -> Self {
        self.storage_url = url.into();
        self
    }

    /// Set the collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.collection.is_empty() || self.collection.contains('/') {
            return Err(Error::operation(
                "validate_config",
                format!("collection '{}' must be a single non-empty segment", self.collection),
            ));
        }

        if self.provider == ProviderKind::S3 && self.s3_bucket.is_none() {
            return Err(Error::operation(
                "validate_config",
                "the s3 provider requires a bucket name",
            ));
        }

        Ok(())
    }

    /// Connects the configured provider and returns its client.
    ///
    /// The client can be shared by several collections; see [`open`](Self::open)
    /// for a store bound to the configured one.
    pub async fn connect(&self) -> Result<ObjectStoreClient> {
        self.validate()?;

        tracing::info!(
            target: TRACING_TARGET_PROVIDER,
            provider = ?self.provider,
            collection = %self.collection,
            storage_url = %self.storage_url,
            "Connecting blob store provider"
        );

        match self.provider {
            ProviderKind::Memory => MemoryProvider::connect(&MemoryCredentials::default()).await,
            ProviderKind::Local => {
                let creds = LocalCredentials {
                    root: self.local_root.clone(),
                };
                LocalProvider::connect(&creds).await
            }
            ProviderKind::S3 => self.connect_s3().await,
        }
    }

    /// Connects the configured provider and binds a store to the configured collection.
    pub async fn open(&self) -> Result<BlobStore> {
        let client = self.connect().await?;
        Ok(BlobStore::new(
            ObjectStoreBackend::new(client, &self.collection),
            &self.storage_url,
        ))
    }

    #[cfg(feature = "aws")]
    async fn connect_s3(&self) -> Result<ObjectStoreClient> {
        use crate::providers::{S3Credentials, S3Provider};

        let creds = S3Credentials {
            bucket: self.s3_bucket.clone().unwrap_or_default(),
            region: self
                .s3_region
                .clone()
                .unwrap_or_else(crate::providers::default_s3_region),
            endpoint: self.s3_endpoint.clone(),
            access_key_id: self.s3_access_key_id.clone(),
            secret_access_key: self.s3_secret_access_key.clone(),
        };
        S3Provider::connect(&creds).await
    }

    #[cfg(not(feature = "aws"))]
    async fn connect_s3(&self) -> Result<ObjectStoreClient> {
        Err(Error::operation(
            "connect",
            "the s3 provider requires the `aws` feature",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Content;

    #[test]
    fn rejects_nested_collection() {
        let config = StoreConfig::memory("a/b");
        assert!(config.validate().is_err());
        assert!(StoreConfig::memory("").validate().is_err());
    }

    #[test]
    fn s3_requires_bucket() {
        let config = StoreConfig {
            provider: ProviderKind::S3,
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn secret_is_not_serialized() {
        let config = StoreConfig {
            s3_secret_access_key: Some("hunter2".to_string()),
            ..StoreConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[tokio::test]
    async fn open_memory_store() {
        let store = StoreConfig::memory("pics")
            .with_storage_url("http://example.com/files/")
            .open()
            .await
            .unwrap();

        assert_eq!(store.collection(), "pics");
        let id = store.save("a.txt", Content::from_bytes("x")).await.unwrap();
        assert!(store.exists(&id).await.unwrap());
    }

    #[tokio::test]
    async fn open_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            local_root: dir.path().to_path_buf(),
            ..StoreConfig::default()
        };

        let store = config.open().await.unwrap();
        let id = store.save("a.txt", Content::from_bytes("x")).await.unwrap();
        assert_eq!(store.listdir().await.unwrap(), vec!["a.txt".to_string()]);
        assert!(dir.path().join("fs").join(id.to_string()).exists());
    }
}
