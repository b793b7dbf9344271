//! Local filesystem provider using [`object_store::local::LocalFileSystem`].

use std::path::PathBuf;

use object_store::local::LocalFileSystem;
use serde::{Deserialize, Serialize};

use super::Provider;
use crate::backend::ObjectStoreClient;
use crate::{Error, Result, TRACING_TARGET_PROVIDER};

/// Typed credentials for the local filesystem provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCredentials {
    /// Directory that holds every collection. Created if missing.
    pub root: PathBuf,
}

/// Filesystem-backed object storage rooted at a directory.
pub struct LocalProvider;

#[async_trait::async_trait]
impl Provider for LocalProvider {
    type Credentials = LocalCredentials;

    const ID: &str = "local";

    async fn connect(creds: &Self::Credentials) -> Result<ObjectStoreClient> {
        tokio::fs::create_dir_all(&creds.root).await?;

        let store = LocalFileSystem::new_with_prefix(&creds.root)
            .map_err(|e| Error::operation("connect", e.to_string()))?
            .with_automatic_cleanup(true);

        tracing::debug!(
            target: TRACING_TARGET_PROVIDER,
            provider = Self::ID,
            root = %creds.root.display(),
            "Opened local filesystem store"
        );

        Ok(ObjectStoreClient::new(store))
    }
}
